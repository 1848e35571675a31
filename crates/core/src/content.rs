//! Contracts of the backing content store.
//!
//! The cursor layer consumes content through two narrow traits:
//! [`ContentSource`] resolves nodes by identifier and [`ContentNode`]
//! exposes one node's identity, hierarchy and field values. Everything
//! behind them (storage, caching of type metadata, publication filtering)
//! is out of scope here.

use std::sync::Arc;

use crate::cursor::TreeCursor;

/// Identifier of the synthetic source root.
pub const ROOT_ID: i64 = -1;

/// The value of one content field, as seen by a cursor.
///
/// A field is exactly empty, a text string, or an embedded sub-tree; there
/// is no fourth shape. The handle stored in [`Subtree`](FieldValue::Subtree)
/// is immutable master data: it is never advanced in place, every entry
/// into it goes through a defensive [`TreeCursor::boxed_clone`].
#[derive(Clone)]
pub enum FieldValue {
    /// No value.
    Empty,
    /// A plain string value.
    Text(String),
    /// An embedded sub-tree, positioned at its own synthetic root.
    Subtree(Arc<dyn TreeCursor>),
}

impl FieldValue {
    /// Whether the field carries no value at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }
}

impl std::fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Empty => f.write_str("Empty"),
            FieldValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            FieldValue::Subtree(_) => f.write_str("Subtree(..)"),
        }
    }
}

/// A named field of a content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldType {
    name: Arc<str>,
}

impl FieldType {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Type descriptor of a content node: element name plus the ordered field
/// list.
///
/// Fields with index `<= last_attribute_index` (a property of the
/// [`ContentSource`]) are attributes; the rest are property elements.
#[derive(Clone, Debug)]
pub struct ContentType {
    name: Arc<str>,
    field_types: Arc<[FieldType]>,
}

impl ContentType {
    pub fn new(name: impl Into<Arc<str>>, field_types: impl Into<Arc<[FieldType]>>) -> Self {
        Self { name: name.into(), field_types: field_types.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn field_types(&self) -> &[FieldType] {
        &self.field_types
    }

    /// Number of fields, attributes and property elements together.
    #[must_use]
    pub fn fields_count(&self) -> i32 {
        i32::try_from(self.field_types.len()).unwrap_or(i32::MAX)
    }

    /// The field at `index`.
    ///
    /// # Panics
    ///
    /// Panics on an out-of-range index; field indexes come from the cursor
    /// state machine and are never user input.
    #[must_use]
    pub fn field(&self, index: i32) -> &FieldType {
        let index = usize::try_from(index).expect("field index must not be negative");
        &self.field_types[index]
    }
}

/// One node of the content tree.
///
/// Instances are constructed by the [`ContentSource`] on first reference
/// and cached by the cursor family for its lifetime; the cursor layer never
/// mutates or evicts them. Node identity is pointer identity of the
/// `Arc<dyn ContentNode>`.
pub trait ContentNode: Send + Sync {
    /// Unique identifier; the source root reports [`ROOT_ID`].
    fn id(&self) -> i64;

    /// Identifier of the parent node; [`ROOT_ID`] at the top.
    fn parent_id(&self) -> i64;

    /// Type descriptor, shared with all nodes of the same type.
    fn content_type(&self) -> &ContentType;

    /// Ordered identifiers of the child nodes.
    ///
    /// The list may contain identifiers the source does not resolve
    /// (filtered content); callers tolerate the gaps.
    fn child_ids(&self) -> &[i64];

    /// The value of the field at `field_index`.
    fn value(&self, field_index: i32) -> FieldValue;
}

/// A source of content nodes.
///
/// Lookups are assumed pure and idempotent: a cursor family may race on
/// the first access to an identifier and call [`get`](ContentSource::get)
/// more than once for it.
pub trait ContentSource: Send + Sync {
    /// The root node, id [`ROOT_ID`]; never returned by
    /// [`get`](ContentSource::get).
    fn root(&self) -> Arc<dyn ContentNode>;

    /// Resolves a node by identifier; `None` for `id <= 0` and for
    /// identifiers that do not resolve to visible content.
    fn get(&self, id: i64) -> Option<Arc<dyn ContentNode>>;

    /// Index of the last attribute field; fields beyond it are property
    /// elements. Constant for the lifetime of the source, `-1` when the
    /// source declares no attribute fields.
    fn last_attribute_index(&self) -> i32;
}
