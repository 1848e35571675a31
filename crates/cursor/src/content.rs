//! Cursor model for navigating a typed content tree as if it were XML.
//!
//! A [`ContentCursor`] presents a [`ContentSource`] as a virtual tree: each
//! content node becomes an element carrying a synthetic `id` attribute and
//! its declared attribute fields, followed by its property-element fields
//! (which may wrap text or an embedded sub-tree), followed by its real
//! child nodes. Child-id lists may be sparse; identifiers the source does
//! not resolve are skipped transparently in both directions.
//!
//! Clones share the source, the name metadata and one [`NodeCache`] per
//! family; navigation state itself is owned per cursor, so advancing a
//! clone can never corrupt another cursor's view of its own ancestors.

use std::any::Any;
use std::mem;
use std::sync::Arc;

use contentnav_core::{
    ContentNode, ContentSource, CursorError, FieldValue, NodeKind, TreeCursor,
};
use smallvec::SmallVec;
use tracing::trace;

use crate::cache::NodeCache;

/// Field-index sentinel for the synthetic `id` attribute.
const SYNTHETIC_ID_INDEX: i32 = -1;

/// Name of the synthetic `id` attribute.
const ID_ATTRIBUTE: &str = "id";

/// Where the cursor currently is within one element level.
#[derive(Clone)]
enum Place {
    Root,
    Element,
    Attribute { field_index: i32 },
    PropertyElement { field_index: i32 },
    PropertyText { field_index: i32 },
    PropertyEmbedded { field_index: i32, fragment: Box<dyn TreeCursor> },
}

/// One level of navigation state. `parent` links form an explicit chain
/// that is deep-copied on clone, so two live cursors never share a mutable
/// ancestor.
#[derive(Clone)]
struct State {
    node: Arc<dyn ContentNode>,
    parent: Option<Box<State>>,
    // child-id list of the parent this element was drawn from; may contain
    // identifiers the source does not resolve
    siblings: Option<Arc<[i64]>>,
    sibling_index: usize,
    // computed once at construction as parent depth + 1, never mutated
    depth: usize,
    place: Place,
}

impl State {
    fn root(node: Arc<dyn ContentNode>) -> Self {
        Self {
            node,
            parent: None,
            siblings: None,
            sibling_index: 0,
            depth: 0,
            place: Place::Root,
        }
    }

    fn element(node: Arc<dyn ContentNode>) -> Self {
        Self { place: Place::Element, ..Self::root(node) }
    }

    fn fields_count(&self) -> i32 {
        self.node.content_type().fields_count()
    }

    fn visible_child_ids(&self, max_depth: usize) -> &[i64] {
        if self.depth < max_depth { self.node.child_ids() } else { &[] }
    }
}

/// Cursor over a [`ContentSource`], rooted at the source root or at any
/// resolvable content node, with an optional maximum traversal depth.
#[derive(Clone)]
pub struct ContentCursor {
    source: Arc<dyn ContentSource>,
    cache: Arc<NodeCache>,
    last_attribute_index: i32,
    max_depth: usize,
    state: State,
}

impl ContentCursor {
    /// A cursor at the source root, without a depth limit.
    #[must_use]
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        let root = source.root();
        let last_attribute_index = source.last_attribute_index();
        Self {
            source,
            cache: Arc::new(NodeCache::new()),
            last_attribute_index,
            max_depth: usize::MAX,
            state: State::root(root),
        }
    }

    /// A cursor rooted at `root_id` (`<= 0` selects the source root) with
    /// the given maximum depth.
    ///
    /// # Errors
    ///
    /// [`CursorError::UnknownRoot`] when `root_id` does not resolve.
    pub fn with_root(
        source: Arc<dyn ContentSource>,
        root_id: i64,
        max_depth: usize,
    ) -> Result<Self, CursorError> {
        let cache = Arc::new(NodeCache::new());
        let root = if root_id <= 0 {
            source.root()
        } else {
            cache.get(source.as_ref(), root_id).ok_or(CursorError::UnknownRoot(root_id))?
        };
        let last_attribute_index = source.last_attribute_index();
        Ok(Self { source, cache, last_attribute_index, max_depth, state: State::root(root) })
    }

    /// A new cursor over the same source, positioned at a new root, sharing
    /// this family's lookup cache. The new root may be above or below this
    /// cursor's own root.
    ///
    /// # Errors
    ///
    /// [`CursorError::UnknownRoot`] when `root_id` does not resolve.
    pub fn clone_with_root(
        &self,
        root_id: i64,
        max_depth: usize,
    ) -> Result<ContentCursor, CursorError> {
        let root = if root_id <= 0 {
            self.source.root()
        } else {
            self.resolve(root_id).ok_or(CursorError::UnknownRoot(root_id))?
        };
        Ok(ContentCursor {
            source: Arc::clone(&self.source),
            cache: Arc::clone(&self.cache),
            last_attribute_index: self.last_attribute_index,
            max_depth,
            state: State::root(root),
        })
    }

    /// The underlying content node at the current position.
    #[must_use]
    pub fn node(&self) -> &Arc<dyn ContentNode> {
        &self.state.node
    }

    /// The maximum traversal depth of this cursor.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn resolve(&self, id: i64) -> Option<Arc<dyn ContentNode>> {
        self.cache.get(self.source.as_ref(), id)
    }

    /// Pushes a child element level; the current level is normalized back
    /// to `Element` and becomes the new level's parent.
    fn push_element(
        &mut self,
        node: Arc<dyn ContentNode>,
        siblings: Arc<[i64]>,
        sibling_index: usize,
    ) {
        let depth = self.state.depth + 1;
        let child = State {
            node,
            parent: None,
            siblings: Some(siblings),
            sibling_index,
            depth,
            place: Place::Element,
        };
        let mut parent = mem::replace(&mut self.state, child);
        parent.place = Place::Element;
        self.state.parent = Some(Box::new(parent));
    }

    /// Descends to the first resolvable real child of the current element,
    /// depth permitting.
    fn move_to_first_child_element(&mut self) -> bool {
        let siblings: Arc<[i64]> = Arc::from(self.state.visible_child_ids(self.max_depth));
        for (index, &id) in siblings.iter().enumerate() {
            if let Some(child) = self.resolve(id) {
                self.push_element(child, Arc::clone(&siblings), index);
                return true;
            }
        }
        false
    }

    /// Enters the children of the property element at `field_index`.
    fn enter_property(&mut self, field_index: i32) -> bool {
        match self.state.node.value(field_index) {
            FieldValue::Subtree(handle) => {
                // never advance the raw handle stored on the node; enter
                // through a clone and skip the fragment's synthetic root
                let mut fragment = handle.boxed_clone();
                fragment.move_to_first_child();
                self.state.place = Place::PropertyEmbedded { field_index, fragment };
                true
            }
            FieldValue::Text(_) => {
                self.state.place = Place::PropertyText { field_index };
                true
            }
            FieldValue::Empty => false,
        }
    }
}

impl TreeCursor for ContentCursor {
    fn node_kind(&self) -> NodeKind {
        match &self.state.place {
            Place::PropertyEmbedded { fragment, .. } => fragment.node_kind(),
            Place::Attribute { .. } => NodeKind::Attribute,
            Place::Element | Place::PropertyElement { .. } => NodeKind::Element,
            Place::PropertyText { .. } => NodeKind::Text,
            Place::Root => NodeKind::Root,
        }
    }

    fn name(&self) -> String {
        match &self.state.place {
            Place::PropertyEmbedded { fragment, .. } => fragment.name(),
            Place::Attribute { field_index } | Place::PropertyElement { field_index } => {
                if *field_index == SYNTHETIC_ID_INDEX {
                    ID_ATTRIBUTE.to_owned()
                } else {
                    self.state.node.content_type().field(*field_index).name().to_owned()
                }
            }
            Place::Element => self.state.node.content_type().name().to_owned(),
            Place::PropertyText { .. } | Place::Root => String::new(),
        }
    }

    /// String value of the current node.
    ///
    /// Elements and the root report the empty string: concatenating every
    /// descendant field of a content subtree would dump a site's worth of
    /// data, so values start at attributes and property elements.
    fn value(&self) -> String {
        match &self.state.place {
            Place::PropertyEmbedded { fragment, .. } => fragment.value(),
            Place::Attribute { field_index }
            | Place::PropertyElement { field_index }
            | Place::PropertyText { field_index } => {
                if *field_index == SYNTHETIC_ID_INDEX {
                    self.state.node.id().to_string()
                } else {
                    match self.state.node.value(*field_index) {
                        FieldValue::Empty => String::new(),
                        FieldValue::Text(text) => text,
                        FieldValue::Subtree(handle) => handle.value(),
                    }
                }
            }
            Place::Element | Place::Root => String::new(),
        }
    }

    fn is_empty_element(&self) -> bool {
        match &self.state.place {
            Place::Element => {
                // go through the cache: child ids may reference filtered
                // content the source does not resolve
                let has_content_child = self
                    .state
                    .visible_child_ids(self.max_depth)
                    .iter()
                    .any(|&id| self.resolve(id).is_some());
                !has_content_child
                    && self.state.fields_count() - 1 == self.last_attribute_index
            }
            Place::PropertyElement { field_index } => {
                self.state.node.value(*field_index).is_empty()
            }
            Place::PropertyEmbedded { fragment, .. } => fragment.is_empty_element(),
            Place::Attribute { .. } | Place::PropertyText { .. } | Place::Root => {
                panic!("cursor is not positioned on an element")
            }
        }
    }

    fn move_to_first_attribute(&mut self) -> bool {
        if let Place::PropertyEmbedded { fragment, .. } = &mut self.state.place {
            return fragment.move_to_first_attribute();
        }
        match &self.state.place {
            Place::Element => {
                self.state.place = Place::Attribute { field_index: SYNTHETIC_ID_INDEX };
                true
            }
            _ => false,
        }
    }

    fn move_to_next_attribute(&mut self) -> bool {
        if let Place::PropertyEmbedded { fragment, .. } = &mut self.state.place {
            return fragment.move_to_next_attribute();
        }
        match &self.state.place {
            Place::Attribute { field_index } => {
                let field_index = *field_index;
                if field_index == self.last_attribute_index {
                    false
                } else {
                    self.state.place = Place::Attribute { field_index: field_index + 1 };
                    true
                }
            }
            _ => false,
        }
    }

    fn move_to_first_child(&mut self) -> bool {
        if let Place::PropertyEmbedded { fragment, .. } = &mut self.state.place {
            return fragment.move_to_first_child();
        }
        match &self.state.place {
            Place::Attribute { .. } | Place::PropertyText { .. } => false,
            Place::Element => {
                // property elements come before real child content
                let first_property_index = self.last_attribute_index + 1;
                if self.state.fields_count() > first_property_index {
                    self.state.place =
                        Place::PropertyElement { field_index: first_property_index };
                    true
                } else {
                    self.move_to_first_child_element()
                }
            }
            Place::PropertyElement { field_index } => {
                let field_index = *field_index;
                self.enter_property(field_index)
            }
            Place::Root => {
                self.state.place = Place::Element;
                true
            }
            Place::PropertyEmbedded { .. } => unreachable!("handled above"),
        }
    }

    fn move_to_next(&mut self) -> bool {
        if let Place::PropertyEmbedded { fragment, .. } = &mut self.state.place {
            return fragment.move_to_next();
        }
        match &self.state.place {
            Place::Element => {
                let Some(siblings) = self.state.siblings.clone() else {
                    return false;
                };
                // scan on a local index and commit only on success, so a
                // fully unresolvable tail leaves the position untouched
                let mut index = self.state.sibling_index;
                while index + 1 < siblings.len() {
                    index += 1;
                    if let Some(node) = self.resolve(siblings[index]) {
                        self.state.node = node;
                        self.state.sibling_index = index;
                        return true;
                    }
                }
                false
            }
            Place::PropertyElement { field_index } => {
                let field_index = *field_index;
                if field_index == self.state.fields_count() - 1 {
                    // after the property elements come the real children
                    self.move_to_first_child_element()
                } else {
                    self.state.place = Place::PropertyElement { field_index: field_index + 1 };
                    true
                }
            }
            Place::Attribute { .. } | Place::PropertyText { .. } | Place::Root => false,
            Place::PropertyEmbedded { .. } => unreachable!("handled above"),
        }
    }

    fn move_to_previous(&mut self) -> bool {
        if let Place::PropertyEmbedded { fragment, .. } = &mut self.state.place {
            return fragment.move_to_previous();
        }
        match &self.state.place {
            Place::Element => {
                if let Some(siblings) = self.state.siblings.clone() {
                    let mut index = self.state.sibling_index;
                    while index > 0 {
                        index -= 1;
                        if let Some(node) = self.resolve(siblings[index]) {
                            self.state.node = node;
                            self.state.sibling_index = index;
                            return true;
                        }
                    }
                }
                // first resolvable child: its previous sibling is the
                // parent's last property element, when the parent has any
                let Some(parent) = self.state.parent.as_deref() else {
                    return false;
                };
                let parent_fields = parent.node.content_type().fields_count();
                if parent_fields - 1 > self.last_attribute_index {
                    let mut state =
                        *self.state.parent.take().expect("parent checked above");
                    state.place =
                        Place::PropertyElement { field_index: parent_fields - 1 };
                    self.state = state;
                    return true;
                }
                false
            }
            Place::PropertyElement { field_index } => {
                let field_index = *field_index;
                if field_index > self.last_attribute_index + 1 {
                    self.state.place = Place::PropertyElement { field_index: field_index - 1 };
                    true
                } else {
                    false
                }
            }
            Place::Attribute { .. } | Place::PropertyText { .. } | Place::Root => false,
            Place::PropertyEmbedded { .. } => unreachable!("handled above"),
        }
    }

    fn move_to_parent(&mut self) -> bool {
        if let Place::PropertyEmbedded { field_index, fragment } = &mut self.state.place {
            let field_index = *field_index;
            assert!(
                fragment.move_to_parent(),
                "could not move to parent inside an embedded fragment"
            );
            if fragment.node_kind() == NodeKind::Root {
                // back out of the fragment; its synthetic root is never
                // exposed
                self.state.place = Place::PropertyElement { field_index };
            }
            return true;
        }
        match &self.state.place {
            Place::Attribute { .. } | Place::PropertyElement { .. } => {
                self.state.place = Place::Element;
                true
            }
            Place::Element => {
                if let Some(parent) = self.state.parent.take() {
                    self.state = *parent;
                } else {
                    self.state.place = Place::Root;
                }
                true
            }
            Place::PropertyText { field_index } => {
                let field_index = *field_index;
                self.state.place = Place::PropertyElement { field_index };
                true
            }
            Place::Root => false,
            Place::PropertyEmbedded { .. } => unreachable!("handled above"),
        }
    }

    fn move_to_root(&mut self) {
        while let Some(parent) = self.state.parent.take() {
            self.state = *parent;
        }
        self.state.place = Place::Root;
    }

    fn move_to(&mut self, other: &dyn TreeCursor) -> bool {
        let Some(other) = other.as_any().downcast_ref::<ContentCursor>() else {
            return false;
        };
        if !Arc::ptr_eq(&self.source, &other.source) {
            return false;
        }
        self.state = other.state.clone();
        true
    }

    /// Moves to the content node whose identifier matches `id`.
    ///
    /// Only element identifiers are considered; embedded fragments are not
    /// searched. The target must lie within the tree rooted at this
    /// cursor's own root and within the depth limit. The upward parent walk
    /// assumes an acyclic content graph.
    fn move_to_id(&mut self, id: &str) -> Result<bool, CursorError> {
        let Ok(target) = id.trim().parse::<i64>() else {
            return Ok(false);
        };

        // the cursor may be rooted below the source root; find its own root
        let mut root_state = &self.state;
        while let Some(parent) = root_state.parent.as_deref() {
            root_state = parent;
        }
        let root_node = Arc::clone(&root_state.node);
        let root_id = root_node.id();

        if target == root_id {
            self.state = State::element(root_node);
            return Ok(true);
        }

        let Some(mut content) = self.resolve(target) else {
            return Ok(false);
        };

        // walk up towards this cursor's root, collecting the path
        let mut pending: SmallVec<[Arc<dyn ContentNode>; 8]> = SmallVec::new();
        while content.parent_id() != root_id {
            pending.push(Arc::clone(&content));
            match self.resolve(content.parent_id()) {
                Some(parent) => content = parent,
                None => return Ok(false),
            }
        }
        if pending.len() >= self.max_depth {
            return Ok(false);
        }
        trace!(id = target, levels = pending.len() + 1, "replaying path for move_to_id");

        // replay downward, one element level per step, with sibling-list
        // bookkeeping taken from each parent's child-id list
        let mut state = State::element(root_node);
        let mut step = Some(content);
        while let Some(node) = step {
            let siblings: Arc<[i64]> = Arc::from(state.node.child_ids());
            let Some(sibling_index) = siblings.iter().position(|&sid| sid == node.id()) else {
                return Ok(false);
            };
            let depth = state.depth + 1;
            state = State {
                node,
                parent: Some(Box::new(state)),
                siblings: Some(siblings),
                sibling_index,
                depth,
                place: Place::Element,
            };
            step = pending.pop();
        }
        self.state = state;
        Ok(true)
    }

    fn is_same_position(&self, other: &dyn TreeCursor) -> bool {
        let Some(other) = other.as_any().downcast_ref::<ContentCursor>() else {
            return false;
        };
        Arc::ptr_eq(&self.source, &other.source) && same_place(&self.state, &other.state)
    }

    fn boxed_clone(&self) -> Box<dyn TreeCursor> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for ContentCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let place = match &self.state.place {
            Place::Root => "root",
            Place::Element => "element",
            Place::Attribute { .. } => "attribute",
            Place::PropertyElement { .. } => "property-element",
            Place::PropertyText { .. } => "property-text",
            Place::PropertyEmbedded { .. } => "property-embedded",
        };
        f.debug_struct("ContentCursor")
            .field("node", &self.state.node.id())
            .field("place", &place)
            .field("depth", &self.state.depth)
            .finish()
    }
}

/// Position equality: state-variant equal, identical underlying node (by
/// identity, not value) and, for embedded states, same position of the
/// embedded sub-cursors.
fn same_place(a: &State, b: &State) -> bool {
    let node_identical = Arc::ptr_eq(&a.node, &b.node);
    match (&a.place, &b.place) {
        (Place::Root, Place::Root) | (Place::Element, Place::Element) => node_identical,
        (Place::Attribute { field_index: x }, Place::Attribute { field_index: y })
        | (
            Place::PropertyElement { field_index: x },
            Place::PropertyElement { field_index: y },
        )
        | (Place::PropertyText { field_index: x }, Place::PropertyText { field_index: y }) => {
            node_identical && x == y
        }
        (
            Place::PropertyEmbedded { field_index: x, fragment: mine },
            Place::PropertyEmbedded { field_index: y, fragment: theirs },
        ) => node_identical && x == y && mine.is_same_position(theirs.as_ref()),
        _ => false,
    }
}
