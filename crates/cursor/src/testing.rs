//! Mock content sources for unit and integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use contentnav_core::content::ROOT_ID;
use contentnav_core::{ContentNode, ContentSource, ContentType, FieldValue};

/// An in-memory content node.
pub struct TestNode {
    id: i64,
    parent_id: i64,
    content_type: ContentType,
    child_ids: Vec<i64>,
    values: Vec<FieldValue>,
}

impl TestNode {
    #[must_use]
    pub fn new(id: i64, parent_id: i64, content_type: ContentType) -> Self {
        Self { id, parent_id, content_type, child_ids: Vec::new(), values: Vec::new() }
    }

    /// Sets the child-id list; the ids need not all resolve.
    #[must_use]
    pub fn with_children(mut self, child_ids: Vec<i64>) -> Self {
        self.child_ids = child_ids;
        self
    }

    /// Sets the field values, in field order.
    #[must_use]
    pub fn with_values(mut self, values: Vec<FieldValue>) -> Self {
        self.values = values;
        self
    }
}

impl ContentNode for TestNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> i64 {
        self.parent_id
    }

    fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    fn child_ids(&self) -> &[i64] {
        &self.child_ids
    }

    fn value(&self, field_index: i32) -> FieldValue {
        usize::try_from(field_index)
            .ok()
            .and_then(|index| self.values.get(index).cloned())
            .unwrap_or(FieldValue::Empty)
    }
}

/// An in-memory content source with a configurable attribute boundary.
pub struct TestSource {
    last_attribute_index: i32,
    root: Arc<TestNode>,
    nodes: HashMap<i64, Arc<TestNode>>,
}

impl TestSource {
    /// A source whose root carries the type `root` and no fields.
    #[must_use]
    pub fn new(last_attribute_index: i32) -> Self {
        let root_type = ContentType::new("root", Vec::new());
        Self {
            last_attribute_index,
            root: Arc::new(TestNode::new(ROOT_ID, ROOT_ID, root_type)),
            nodes: HashMap::new(),
        }
    }

    /// Replaces the root node's type.
    #[must_use]
    pub fn with_root_type(mut self, content_type: ContentType) -> Self {
        let children = self.root.child_ids.clone();
        self.root =
            Arc::new(TestNode::new(ROOT_ID, ROOT_ID, content_type).with_children(children));
        self
    }

    /// Sets the root node's child ids.
    #[must_use]
    pub fn with_root_children(mut self, child_ids: Vec<i64>) -> Self {
        let content_type = self.root.content_type.clone();
        self.root = Arc::new(TestNode::new(ROOT_ID, ROOT_ID, content_type).with_children(child_ids));
        self
    }

    /// Inserts a node.
    #[must_use]
    pub fn with_node(mut self, node: TestNode) -> Self {
        self.nodes.insert(node.id, Arc::new(node));
        self
    }
}

impl ContentSource for TestSource {
    fn root(&self) -> Arc<dyn ContentNode> {
        Arc::clone(&self.root) as Arc<dyn ContentNode>
    }

    fn get(&self, id: i64) -> Option<Arc<dyn ContentNode>> {
        if id <= 0 {
            return None;
        }
        self.nodes.get(&id).map(|node| Arc::clone(node) as Arc<dyn ContentNode>)
    }

    fn last_attribute_index(&self) -> i32 {
        self.last_attribute_index
    }
}
