//! The generic tree-navigation contract shared by every cursor in this
//! workspace.
//!
//! A [`TreeCursor`] is a mutable "current position" over a virtual,
//! read-only tree. A path-query evaluator drives it exactly as it would
//! drive a native XML cursor: every move operation either succeeds, or
//! returns `false` and leaves the position untouched. Several simultaneous
//! positions are held by cloning the cursor; clones never share mutable
//! navigation state.

use std::any::Any;

use crate::error::CursorError;

/// The kind of node a cursor is currently positioned on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The synthetic document root of a virtual tree.
    Root,
    /// A named element, real or fabricated by the cursor.
    Element,
    /// An attribute of the current element.
    Attribute,
    /// A text leaf.
    Text,
}

/// A stateful navigation cursor over a virtual tree.
///
/// Move operations mutate the cursor in place and report success as a
/// `bool`; a failed move leaves the position exactly as it was, never
/// partially advanced. A single cursor instance is not synchronized and
/// must be driven from one thread; independent clones of the same family
/// may run concurrently.
///
/// Operations that are meaningless in the current state (for example
/// [`is_empty_element`](TreeCursor::is_empty_element) on an attribute)
/// indicate a broken caller and panic rather than returning a recoverable
/// error.
pub trait TreeCursor: Send + Sync {
    /// Kind of the current node.
    fn node_kind(&self) -> NodeKind;

    /// Qualified name of the current node, or the empty string for
    /// unnamed positions (root, text).
    fn name(&self) -> String;

    /// Name of the current node without any namespace prefix.
    fn local_name(&self) -> String {
        let name = self.name();
        let (_, local) = split_qualified(&name);
        local.to_owned()
    }

    /// Namespace prefix of the current node, or the empty string.
    fn prefix(&self) -> String {
        let name = self.name();
        split_qualified(&name).0.unwrap_or_default().to_owned()
    }

    /// String value of the current node.
    fn value(&self) -> String;

    /// Whether the current element has no children.
    ///
    /// # Panics
    ///
    /// Panics when the cursor is not positioned on an element.
    fn is_empty_element(&self) -> bool;

    /// Moves to the first attribute of the current element.
    fn move_to_first_attribute(&mut self) -> bool;

    /// Moves to the next attribute of the owning element.
    fn move_to_next_attribute(&mut self) -> bool;

    /// Moves to the first child of the current node.
    fn move_to_first_child(&mut self) -> bool;

    /// Moves to the next sibling of the current node.
    fn move_to_next(&mut self) -> bool;

    /// Moves to the previous sibling of the current node.
    fn move_to_previous(&mut self) -> bool;

    /// Moves to the parent of the current node.
    fn move_to_parent(&mut self) -> bool;

    /// Rewinds to the root of the tree this cursor belongs to.
    fn move_to_root(&mut self);

    /// Moves this cursor to the same position as `other`.
    ///
    /// Succeeds only when both cursors belong to the same source family;
    /// otherwise returns `false` with the position unchanged.
    fn move_to(&mut self, other: &dyn TreeCursor) -> bool;

    /// Moves to the node whose unique identifier matches `id`.
    ///
    /// Returns `Ok(false)` for unknown or out-of-subtree identifiers.
    /// Cursors over trees without unique identifiers return
    /// [`CursorError::Unsupported`] instead, so that caller misuse is
    /// surfaced rather than masked as an ordinary miss.
    fn move_to_id(&mut self, id: &str) -> Result<bool, CursorError>;

    /// Whether this cursor and `other` are positioned on the identical
    /// node of the identical tree.
    fn is_same_position(&self, other: &dyn TreeCursor) -> bool;

    /// Clones the cursor, including its whole navigation state.
    ///
    /// Subsequent moves on the clone never affect the original.
    fn boxed_clone(&self) -> Box<dyn TreeCursor>;

    /// Identity hook used by [`move_to`](TreeCursor::move_to) and
    /// [`is_same_position`](TreeCursor::is_same_position) to recognize
    /// cursors of the same concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn TreeCursor> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Splits a qualified name into its optional `prefix` and local part.
#[must_use]
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() => (Some(prefix), local),
        _ => (None, name),
    }
}
