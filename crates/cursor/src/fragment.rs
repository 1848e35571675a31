//! In-memory tree backing embedded sub-tree values.
//!
//! Property fields and macro parameters can embed a pre-parsed fragment of
//! richer content. [`FragmentNode`] is the Arc-backed node of such a
//! fragment and [`FragmentCursor`] its [`TreeCursor`] implementation; the
//! cursor stored as master data in a [`FieldValue::Subtree`] or a macro
//! parameter is usually one of these.
//!
//! Example:
//! ```
//! use contentnav_cursor::fragment::{doc, elem, text, attr};
//! use contentnav_core::TreeCursor;
//!
//! // <page isDoc=""><title>Hello</title></page>
//! let fragment = doc()
//!     .child(elem("page").attr(attr("isDoc", "")).child(elem("title").child_node(text("Hello"))))
//!     .build();
//! let mut cursor = fragment.cursor();
//! assert!(cursor.move_to_first_child());
//! assert_eq!(cursor.name(), "page");
//! assert_eq!(cursor.value(), "Hello");
//! ```

use std::any::Any;
use std::sync::{Arc, RwLock, Weak};

use contentnav_core::{CursorError, NodeKind, TreeCursor, split_qualified};

#[derive(Debug)]
struct Inner {
    kind: NodeKind,
    name: Option<Arc<str>>,
    value: Option<String>,
    parent: RwLock<Option<Weak<Inner>>>,
    attributes: RwLock<Vec<FragmentNode>>,
    children: RwLock<Vec<FragmentNode>>,
}

/// One node of an embedded fragment. Cloning is cheap (`Arc`); equality is
/// pointer identity.
#[derive(Clone, Debug)]
pub struct FragmentNode(Arc<Inner>);

impl PartialEq for FragmentNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for FragmentNode {}

impl FragmentNode {
    fn new(kind: NodeKind, name: Option<Arc<str>>, value: Option<String>) -> Self {
        Self(Arc::new(Inner {
            kind,
            name,
            value,
            parent: RwLock::new(None),
            attributes: RwLock::new(Vec::new()),
            children: RwLock::new(Vec::new()),
        }))
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.0.name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn parent(&self) -> Option<FragmentNode> {
        self.0
            .parent
            .read()
            .expect("fragment lock poisoned")
            .as_ref()
            .and_then(Weak::upgrade)
            .map(FragmentNode)
    }

    #[must_use]
    pub fn children(&self) -> Vec<FragmentNode> {
        self.0.children.read().expect("fragment lock poisoned").clone()
    }

    #[must_use]
    pub fn attributes(&self) -> Vec<FragmentNode> {
        self.0.attributes.read().expect("fragment lock poisoned").clone()
    }

    /// Concatenated text of this node and its descendants; for text and
    /// attribute nodes, their own value.
    #[must_use]
    pub fn string_value(&self) -> String {
        match self.0.kind {
            NodeKind::Text | NodeKind::Attribute => {
                self.0.value.clone().unwrap_or_default()
            }
            NodeKind::Element | NodeKind::Root => {
                let mut out = String::new();
                collect_text(self, &mut out);
                out
            }
        }
    }

    /// The topmost node of the fragment this node belongs to.
    #[must_use]
    pub fn root(&self) -> FragmentNode {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// A cursor positioned on this node.
    #[must_use]
    pub fn cursor(&self) -> FragmentCursor {
        FragmentCursor { current: self.clone(), attribute: None }
    }

    fn sibling_offset(&self, offset: isize) -> Option<FragmentNode> {
        let parent = self.parent()?;
        let siblings = parent.children();
        let index = siblings.iter().position(|sibling| sibling == self)?;
        let target = index.checked_add_signed(offset)?;
        siblings.get(target).cloned()
    }
}

fn collect_text(node: &FragmentNode, out: &mut String) {
    if node.kind() == NodeKind::Text
        && let Some(value) = &node.0.value
    {
        out.push_str(value);
    }
    for child in node.children() {
        collect_text(&child, out);
    }
}

/// Builder assembling a fragment bottom-up; relationships are finalized by
/// [`build`](FragmentBuilder::build).
pub struct FragmentBuilder {
    node: FragmentNode,
    pending_attrs: Vec<FragmentNode>,
    pending_children: Vec<FragmentNode>,
}

impl FragmentBuilder {
    fn new(kind: NodeKind, name: Option<Arc<str>>) -> Self {
        Self {
            node: FragmentNode::new(kind, name, None),
            pending_attrs: Vec::new(),
            pending_children: Vec::new(),
        }
    }

    #[must_use]
    pub fn attr(mut self, attribute: FragmentNode) -> Self {
        debug_assert!(attribute.kind() == NodeKind::Attribute);
        self.pending_attrs.push(attribute);
        self
    }

    #[must_use]
    pub fn child(mut self, child: FragmentBuilder) -> Self {
        self.pending_children.push(child.build());
        self
    }

    #[must_use]
    pub fn child_node(mut self, child: FragmentNode) -> Self {
        self.pending_children.push(child);
        self
    }

    #[must_use]
    pub fn build(self) -> FragmentNode {
        {
            let mut attrs = self.node.0.attributes.write().expect("fragment lock poisoned");
            for attribute in &self.pending_attrs {
                *attribute.0.parent.write().expect("fragment lock poisoned") =
                    Some(Arc::downgrade(&self.node.0));
            }
            attrs.extend(self.pending_attrs);
        }
        {
            let mut children = self.node.0.children.write().expect("fragment lock poisoned");
            for child in &self.pending_children {
                *child.0.parent.write().expect("fragment lock poisoned") =
                    Some(Arc::downgrade(&self.node.0));
            }
            children.extend(self.pending_children);
        }
        self.node
    }
}

/// A fragment root.
#[must_use]
pub fn doc() -> FragmentBuilder {
    FragmentBuilder::new(NodeKind::Root, None)
}

/// An element; `name` may carry a `prefix:` part.
#[must_use]
pub fn elem(name: &str) -> FragmentBuilder {
    FragmentBuilder::new(NodeKind::Element, Some(Arc::from(name)))
}

/// An attribute node.
#[must_use]
pub fn attr(name: &str, value: &str) -> FragmentNode {
    FragmentNode::new(NodeKind::Attribute, Some(Arc::from(name)), Some(value.to_owned()))
}

/// A text leaf.
#[must_use]
pub fn text(value: &str) -> FragmentNode {
    FragmentNode::new(NodeKind::Text, None, Some(value.to_owned()))
}

/// Cursor over a [`FragmentNode`] tree.
#[derive(Clone)]
pub struct FragmentCursor {
    current: FragmentNode,
    // index into the current element's attribute list when positioned on
    // an attribute
    attribute: Option<usize>,
}

impl FragmentCursor {
    fn current_attribute(&self) -> Option<FragmentNode> {
        self.attribute.and_then(|index| self.current.attributes().get(index).cloned())
    }
}

impl TreeCursor for FragmentCursor {
    fn node_kind(&self) -> NodeKind {
        if self.attribute.is_some() { NodeKind::Attribute } else { self.current.kind() }
    }

    fn name(&self) -> String {
        match self.current_attribute() {
            Some(attribute) => attribute.name().to_owned(),
            None => self.current.name().to_owned(),
        }
    }

    fn local_name(&self) -> String {
        let name = self.name();
        split_qualified(&name).1.to_owned()
    }

    fn value(&self) -> String {
        match self.current_attribute() {
            Some(attribute) => attribute.string_value(),
            None => self.current.string_value(),
        }
    }

    fn is_empty_element(&self) -> bool {
        self.attribute.is_none()
            && self.current.kind() == NodeKind::Element
            && self.current.children().is_empty()
    }

    fn move_to_first_attribute(&mut self) -> bool {
        if self.attribute.is_none()
            && self.current.kind() == NodeKind::Element
            && !self.current.attributes().is_empty()
        {
            self.attribute = Some(0);
            return true;
        }
        false
    }

    fn move_to_next_attribute(&mut self) -> bool {
        if let Some(index) = self.attribute
            && index + 1 < self.current.attributes().len()
        {
            self.attribute = Some(index + 1);
            return true;
        }
        false
    }

    fn move_to_first_child(&mut self) -> bool {
        if self.attribute.is_some() {
            return false;
        }
        if let Some(child) = self.current.children().first() {
            self.current = child.clone();
            return true;
        }
        false
    }

    fn move_to_next(&mut self) -> bool {
        if self.attribute.is_some() {
            return false;
        }
        if let Some(sibling) = self.current.sibling_offset(1) {
            self.current = sibling;
            return true;
        }
        false
    }

    fn move_to_previous(&mut self) -> bool {
        if self.attribute.is_some() {
            return false;
        }
        if let Some(sibling) = self.current.sibling_offset(-1) {
            self.current = sibling;
            return true;
        }
        false
    }

    fn move_to_parent(&mut self) -> bool {
        if self.attribute.is_some() {
            self.attribute = None;
            return true;
        }
        if let Some(parent) = self.current.parent() {
            self.current = parent;
            return true;
        }
        false
    }

    fn move_to_root(&mut self) {
        self.attribute = None;
        self.current = self.current.root();
    }

    fn move_to(&mut self, other: &dyn TreeCursor) -> bool {
        let Some(other) = other.as_any().downcast_ref::<FragmentCursor>() else {
            return false;
        };
        if self.current.root() != other.current.root() {
            return false;
        }
        self.current = other.current.clone();
        self.attribute = other.attribute;
        true
    }

    fn move_to_id(&mut self, _id: &str) -> Result<bool, CursorError> {
        // fragments carry no id index
        Ok(false)
    }

    fn is_same_position(&self, other: &dyn TreeCursor) -> bool {
        other.as_any().downcast_ref::<FragmentCursor>().is_some_and(|other| {
            self.current == other.current && self.attribute == other.attribute
        })
    }

    fn boxed_clone(&self) -> Box<dyn TreeCursor> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
