//! Pass-through cursor re-labelling the outermost levels of a tree.

use std::any::Any;
use std::sync::Arc;

use contentnav_core::{CursorError, NodeKind, TreeCursor, split_qualified};

/// Decorates an inner cursor so that the two outermost levels (the root
/// and the root element) report a caller-supplied name instead of their
/// real one; any `prefix:` portion of the real qualified name is preserved
/// in [`name`](TreeCursor::name). Everything else delegates unchanged.
#[derive(Clone)]
pub struct RenamedRootCursor {
    inner: Box<dyn TreeCursor>,
    label: Arc<str>,
}

impl RenamedRootCursor {
    pub fn new(inner: Box<dyn TreeCursor>, label: impl Into<Arc<str>>) -> Self {
        Self { inner, label: label.into() }
    }

    /// Whether the inner cursor sits deeper than the two outermost levels.
    /// Probes on a clone; the inner cursor is not moved.
    fn below_renamed_levels(&self) -> bool {
        let mut probe = self.inner.boxed_clone();
        probe.move_to_parent() && probe.move_to_parent()
    }
}

impl TreeCursor for RenamedRootCursor {
    fn node_kind(&self) -> NodeKind {
        self.inner.node_kind()
    }

    fn name(&self) -> String {
        if self.below_renamed_levels() {
            return self.inner.name();
        }
        let real = self.inner.name();
        match split_qualified(&real).0 {
            Some(prefix) => format!("{prefix}:{}", self.label),
            None => self.label.to_string(),
        }
    }

    fn local_name(&self) -> String {
        if self.below_renamed_levels() {
            self.inner.local_name()
        } else {
            self.label.to_string()
        }
    }

    fn prefix(&self) -> String {
        self.inner.prefix()
    }

    fn value(&self) -> String {
        self.inner.value()
    }

    fn is_empty_element(&self) -> bool {
        self.inner.is_empty_element()
    }

    fn move_to_first_attribute(&mut self) -> bool {
        self.inner.move_to_first_attribute()
    }

    fn move_to_next_attribute(&mut self) -> bool {
        self.inner.move_to_next_attribute()
    }

    fn move_to_first_child(&mut self) -> bool {
        self.inner.move_to_first_child()
    }

    fn move_to_next(&mut self) -> bool {
        self.inner.move_to_next()
    }

    fn move_to_previous(&mut self) -> bool {
        self.inner.move_to_previous()
    }

    fn move_to_parent(&mut self) -> bool {
        self.inner.move_to_parent()
    }

    fn move_to_root(&mut self) {
        self.inner.move_to_root();
    }

    fn move_to(&mut self, other: &dyn TreeCursor) -> bool {
        match other.as_any().downcast_ref::<RenamedRootCursor>() {
            Some(other) => self.inner.move_to(other.inner.as_ref()),
            None => self.inner.move_to(other),
        }
    }

    fn move_to_id(&mut self, id: &str) -> Result<bool, CursorError> {
        self.inner.move_to_id(id)
    }

    fn is_same_position(&self, other: &dyn TreeCursor) -> bool {
        match other.as_any().downcast_ref::<RenamedRootCursor>() {
            Some(other) => self.inner.is_same_position(other.inner.as_ref()),
            None => self.inner.is_same_position(other),
        }
    }

    fn boxed_clone(&self) -> Box<dyn TreeCursor> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
