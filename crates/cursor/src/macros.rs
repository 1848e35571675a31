//! Cursor model for navigating a macro invocation as if it were XML.
//!
//! A macro call carries a flat ordered list of named parameters. The
//! [`MacroCursor`] exposes them under a synthetic `macro` element: each
//! parameter becomes an element that wraps a string, an embedded sub-tree,
//! or nothing, optionally inside a synthetic `nodes` element, with optional
//! synthetic attributes. Descent inside an embedded sub-tree is depth
//! limited per parameter, counted only across `isDoc` document boundaries.

use std::any::Any;
use std::sync::Arc;

use contentnav_core::{CursorError, NodeKind, TreeCursor};

/// Name of the synthetic element wrapping the parameter list.
const MACRO_ELEMENT: &str = "macro";

/// Name of the synthetic element wrapping a parameter's sub-tree when
/// [`MacroParameter::wrapped_in_nodes`] is set.
const NODES_ELEMENT: &str = "nodes";

/// Attribute marking an embedded element as a document boundary for
/// depth-limiting purposes.
pub const DOC_MARKER: &str = "isDoc";

/// One named parameter of a macro invocation.
///
/// A parameter carries exactly one of a string value or an embedded
/// sub-tree handle. The handle is immutable master data; the cursor only
/// ever navigates defensive clones of it.
#[derive(Clone)]
pub struct MacroParameter {
    name: Arc<str>,
    text: Option<String>,
    subtree: Option<Arc<dyn TreeCursor>>,
    wrap_in_nodes: bool,
    max_subtree_depth: usize,
    attributes: Vec<(Arc<str>, String)>,
}

impl MacroParameter {
    /// A parameter wrapping a plain string value.
    pub fn text(name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(value.into()),
            subtree: None,
            wrap_in_nodes: false,
            max_subtree_depth: usize::MAX,
            attributes: Vec::new(),
        }
    }

    /// A parameter wrapping an embedded sub-tree, positioned at its own
    /// synthetic root.
    pub fn subtree(name: impl Into<Arc<str>>, handle: Arc<dyn TreeCursor>) -> Self {
        Self {
            name: name.into(),
            text: None,
            subtree: Some(handle),
            wrap_in_nodes: false,
            max_subtree_depth: usize::MAX,
            attributes: Vec::new(),
        }
    }

    /// A parameter with no value at all.
    pub fn empty(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            text: None,
            subtree: None,
            wrap_in_nodes: false,
            max_subtree_depth: usize::MAX,
            attributes: Vec::new(),
        }
    }

    /// Exposes the sub-tree under a synthetic `nodes` element.
    #[must_use]
    pub fn wrapped_in_nodes(mut self) -> Self {
        self.wrap_in_nodes = true;
        self
    }

    /// Limits descent inside the embedded sub-tree to `depth` document
    /// boundaries (elements carrying the `isDoc` marker attribute).
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_subtree_depth = depth;
        self
    }

    /// Appends a synthetic attribute to the parameter element.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The shared, immutable parameter bag of one macro invocation. Cursor
/// family identity is pointer identity of this bag.
struct MacroRoot {
    parameters: Vec<MacroParameter>,
}

/// Where the macro cursor currently is.
#[derive(Clone)]
enum MacroPlace {
    Root,
    Macro,
    Parameter { index: usize },
    ParameterAttribute { index: usize, attr_index: usize },
    ParameterNodes { index: usize },
    ParameterEmbedded { index: usize, fragment: Box<dyn TreeCursor>, doc_depth: usize },
    ParameterText { index: usize },
}

/// Cursor over the parameters of one macro invocation.
#[derive(Clone)]
pub struct MacroCursor {
    root: Arc<MacroRoot>,
    place: MacroPlace,
}

impl MacroCursor {
    pub fn new(parameters: impl IntoIterator<Item = MacroParameter>) -> Self {
        Self {
            root: Arc::new(MacroRoot { parameters: parameters.into_iter().collect() }),
            place: MacroPlace::Root,
        }
    }

    fn parameter(&self, index: usize) -> &MacroParameter {
        &self.root.parameters[index]
    }

    /// Enters a parameter's embedded sub-tree through a defensive clone,
    /// skipping the fragment's synthetic root. The document-depth counter
    /// starts at the number of `isDoc` boundaries on the entry path.
    fn enter_subtree(&self, handle: &Arc<dyn TreeCursor>) -> (Box<dyn TreeCursor>, usize) {
        let mut fragment = handle.boxed_clone();
        fragment.move_to_first_child();
        let doc_depth = usize::from(is_doc(fragment.as_ref()));
        (fragment, doc_depth)
    }
}

impl TreeCursor for MacroCursor {
    fn node_kind(&self) -> NodeKind {
        match &self.place {
            MacroPlace::Macro | MacroPlace::Parameter { .. } | MacroPlace::ParameterNodes { .. } => {
                NodeKind::Element
            }
            MacroPlace::ParameterEmbedded { fragment, .. } => fragment.node_kind(),
            MacroPlace::ParameterAttribute { .. } => NodeKind::Attribute,
            MacroPlace::ParameterText { .. } => NodeKind::Text,
            MacroPlace::Root => NodeKind::Root,
        }
    }

    fn name(&self) -> String {
        match &self.place {
            MacroPlace::Macro => MACRO_ELEMENT.to_owned(),
            MacroPlace::Parameter { index } => self.parameter(*index).name().to_owned(),
            MacroPlace::ParameterAttribute { index, attr_index } => {
                self.parameter(*index).attributes[*attr_index].0.to_string()
            }
            MacroPlace::ParameterEmbedded { fragment, .. } => fragment.name(),
            MacroPlace::ParameterNodes { .. } => NODES_ELEMENT.to_owned(),
            MacroPlace::ParameterText { .. } | MacroPlace::Root => String::new(),
        }
    }

    /// String value of the current node.
    ///
    /// The root and the `macro` element report the empty string; values
    /// start at parameter elements.
    fn value(&self) -> String {
        match &self.place {
            MacroPlace::Parameter { index } => {
                let parameter = self.parameter(*index);
                if let Some(handle) = &parameter.subtree {
                    // never use the raw parameter's handle
                    let mut probe = handle.boxed_clone();
                    probe.move_to_first_child();
                    probe.value()
                } else {
                    parameter.text.clone().unwrap_or_default()
                }
            }
            MacroPlace::ParameterAttribute { index, attr_index } => {
                self.parameter(*index).attributes[*attr_index].1.clone()
            }
            MacroPlace::ParameterEmbedded { fragment, .. } => fragment.value(),
            MacroPlace::ParameterNodes { index } => {
                match &self.parameter(*index).subtree {
                    Some(handle) => {
                        let mut probe = handle.boxed_clone();
                        probe.move_to_first_child();
                        probe.value()
                    }
                    None => String::new(),
                }
            }
            MacroPlace::ParameterText { index } => {
                self.parameter(*index).text.clone().unwrap_or_default()
            }
            MacroPlace::Macro | MacroPlace::Root => String::new(),
        }
    }

    fn is_empty_element(&self) -> bool {
        match &self.place {
            MacroPlace::Macro => self.root.parameters.is_empty(),
            MacroPlace::Parameter { index } => {
                let parameter = self.parameter(*index);
                if parameter.wrap_in_nodes || parameter.subtree.is_some() {
                    false
                } else {
                    parameter.text.is_none()
                }
            }
            MacroPlace::ParameterEmbedded { fragment, .. } => fragment.is_empty_element(),
            MacroPlace::ParameterNodes { index } => self.parameter(*index).subtree.is_none(),
            MacroPlace::ParameterAttribute { .. }
            | MacroPlace::ParameterText { .. }
            | MacroPlace::Root => panic!("cursor is not positioned on an element"),
        }
    }

    fn move_to_first_attribute(&mut self) -> bool {
        if let MacroPlace::ParameterEmbedded { fragment, .. } = &mut self.place {
            return fragment.move_to_first_attribute();
        }
        match &self.place {
            MacroPlace::Parameter { index } => {
                let index = *index;
                if self.parameter(index).attributes.is_empty() {
                    false
                } else {
                    self.place = MacroPlace::ParameterAttribute { index, attr_index: 0 };
                    true
                }
            }
            _ => false,
        }
    }

    fn move_to_next_attribute(&mut self) -> bool {
        if let MacroPlace::ParameterEmbedded { fragment, .. } = &mut self.place {
            return fragment.move_to_next_attribute();
        }
        match &self.place {
            MacroPlace::ParameterAttribute { index, attr_index } => {
                let (index, attr_index) = (*index, *attr_index);
                if attr_index + 1 < self.parameter(index).attributes.len() {
                    self.place = MacroPlace::ParameterAttribute { index, attr_index: attr_index + 1 };
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn move_to_first_child(&mut self) -> bool {
        if let MacroPlace::ParameterEmbedded { index, fragment, doc_depth } = &mut self.place {
            let max = self.root.parameters[*index].max_subtree_depth;
            if !fragment.move_to_first_child() {
                return false;
            }
            if is_doc(fragment.as_ref()) {
                if *doc_depth == max {
                    // one document boundary too deep; restore the previous
                    // position before reporting failure
                    let rolled_back = fragment.move_to_parent();
                    debug_assert!(rolled_back);
                    return false;
                }
                *doc_depth += 1;
            }
            return true;
        }
        match &self.place {
            MacroPlace::Root => {
                self.place = MacroPlace::Macro;
                true
            }
            MacroPlace::Macro => {
                if self.root.parameters.is_empty() {
                    false
                } else {
                    self.place = MacroPlace::Parameter { index: 0 };
                    true
                }
            }
            MacroPlace::Parameter { index } => {
                let index = *index;
                let parameter = self.parameter(index);
                if parameter.wrap_in_nodes {
                    self.place = MacroPlace::ParameterNodes { index };
                    true
                } else if let Some(handle) = &parameter.subtree {
                    let (fragment, doc_depth) = self.enter_subtree(handle);
                    self.place = MacroPlace::ParameterEmbedded { index, fragment, doc_depth };
                    true
                } else if parameter.text.is_some() {
                    self.place = MacroPlace::ParameterText { index };
                    true
                } else {
                    false
                }
            }
            MacroPlace::ParameterNodes { index } => {
                let index = *index;
                match &self.parameter(index).subtree {
                    Some(handle) => {
                        let (fragment, doc_depth) = self.enter_subtree(handle);
                        self.place = MacroPlace::ParameterEmbedded { index, fragment, doc_depth };
                        true
                    }
                    None => false,
                }
            }
            MacroPlace::ParameterAttribute { .. } | MacroPlace::ParameterText { .. } => false,
            MacroPlace::ParameterEmbedded { .. } => unreachable!("handled above"),
        }
    }

    fn move_to_next(&mut self) -> bool {
        if let MacroPlace::ParameterEmbedded { index, fragment, doc_depth } = &mut self.place {
            let was_doc = is_doc(fragment.as_ref());
            if !fragment.move_to_next() {
                return false;
            }
            if !was_doc && is_doc(fragment.as_ref()) {
                // a sideways move can also cross into a document level
                let max = self.root.parameters[*index].max_subtree_depth;
                if *doc_depth == max {
                    let rolled_back = fragment.move_to_previous();
                    debug_assert!(rolled_back);
                    return false;
                }
                *doc_depth += 1;
            }
            return true;
        }
        match &self.place {
            MacroPlace::Parameter { index } => {
                let index = *index;
                if index + 1 < self.root.parameters.len() {
                    self.place = MacroPlace::Parameter { index: index + 1 };
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn move_to_previous(&mut self) -> bool {
        if let MacroPlace::ParameterEmbedded { fragment, doc_depth, .. } = &mut self.place {
            let was_doc = is_doc(fragment.as_ref());
            if !fragment.move_to_previous() {
                return false;
            }
            if was_doc && !is_doc(fragment.as_ref()) {
                *doc_depth = doc_depth.saturating_sub(1);
            }
            return true;
        }
        match &self.place {
            MacroPlace::Parameter { index } => {
                let index = *index;
                if index > 0 {
                    self.place = MacroPlace::Parameter { index: index - 1 };
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn move_to_parent(&mut self) -> bool {
        if let MacroPlace::ParameterEmbedded { index, fragment, doc_depth } = &mut self.place {
            let index = *index;
            let was_doc = is_doc(fragment.as_ref());
            if !fragment.move_to_parent() {
                return false;
            }
            if was_doc {
                *doc_depth = doc_depth.saturating_sub(1);
            }
            // leaving the last document level, or reaching the fragment's
            // synthetic root, exits the sub-tree entirely
            if (was_doc && *doc_depth == 0) || fragment.node_kind() == NodeKind::Root {
                self.place = if self.root.parameters[index].wrap_in_nodes {
                    MacroPlace::ParameterNodes { index }
                } else {
                    MacroPlace::Parameter { index }
                };
            }
            return true;
        }
        match &self.place {
            MacroPlace::Macro => {
                self.place = MacroPlace::Root;
                true
            }
            MacroPlace::Parameter { .. } => {
                self.place = MacroPlace::Macro;
                true
            }
            MacroPlace::ParameterAttribute { index, .. } => {
                let index = *index;
                self.place = MacroPlace::Parameter { index };
                true
            }
            MacroPlace::ParameterNodes { index } | MacroPlace::ParameterText { index } => {
                let index = *index;
                self.place = MacroPlace::Parameter { index };
                true
            }
            MacroPlace::Root => false,
            MacroPlace::ParameterEmbedded { .. } => unreachable!("handled above"),
        }
    }

    fn move_to_root(&mut self) {
        self.place = MacroPlace::Root;
    }

    fn move_to(&mut self, other: &dyn TreeCursor) -> bool {
        let Some(other) = other.as_any().downcast_ref::<MacroCursor>() else {
            return false;
        };
        if !Arc::ptr_eq(&self.root, &other.root) {
            return false;
        }
        self.place = other.place.clone();
        true
    }

    /// Always unsupported: parameters may embed duplicate fragments of the
    /// same underlying content, so node identifiers are not unique within
    /// the macro's virtual tree.
    fn move_to_id(&mut self, _id: &str) -> Result<bool, CursorError> {
        Err(CursorError::Unsupported(
            "move_to_id on a macro cursor: embedded fragments may duplicate node identifiers",
        ))
    }

    fn is_same_position(&self, other: &dyn TreeCursor) -> bool {
        let Some(other) = other.as_any().downcast_ref::<MacroCursor>() else {
            return false;
        };
        if !Arc::ptr_eq(&self.root, &other.root) {
            return false;
        }
        match (&self.place, &other.place) {
            (MacroPlace::Root, MacroPlace::Root) | (MacroPlace::Macro, MacroPlace::Macro) => true,
            (MacroPlace::Parameter { index: x }, MacroPlace::Parameter { index: y })
            | (MacroPlace::ParameterNodes { index: x }, MacroPlace::ParameterNodes { index: y })
            | (MacroPlace::ParameterText { index: x }, MacroPlace::ParameterText { index: y }) => {
                x == y
            }
            (
                MacroPlace::ParameterAttribute { index: x, attr_index: xa },
                MacroPlace::ParameterAttribute { index: y, attr_index: ya },
            ) => x == y && xa == ya,
            (
                MacroPlace::ParameterEmbedded { index: x, fragment: mine, .. },
                MacroPlace::ParameterEmbedded { index: y, fragment: theirs, .. },
            ) => x == y && mine.is_same_position(theirs.as_ref()),
            _ => false,
        }
    }

    fn boxed_clone(&self) -> Box<dyn TreeCursor> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for MacroCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let place = match &self.place {
            MacroPlace::Root => "root",
            MacroPlace::Macro => "macro",
            MacroPlace::Parameter { .. } => "parameter",
            MacroPlace::ParameterAttribute { .. } => "parameter-attribute",
            MacroPlace::ParameterNodes { .. } => "parameter-nodes",
            MacroPlace::ParameterEmbedded { .. } => "parameter-embedded",
            MacroPlace::ParameterText { .. } => "parameter-text",
        };
        f.debug_struct("MacroCursor")
            .field("parameters", &self.root.parameters.len())
            .field("place", &place)
            .finish()
    }
}

/// Whether the cursor is positioned on an element carrying the `isDoc`
/// marker attribute. Probes on a clone; the cursor itself is not moved.
fn is_doc(cursor: &dyn TreeCursor) -> bool {
    if cursor.node_kind() != NodeKind::Element {
        return false;
    }
    let mut probe = cursor.boxed_clone();
    if !probe.move_to_first_attribute() {
        return false;
    }
    loop {
        if probe.name() == DOC_MARKER {
            return true;
        }
        if !probe.move_to_next_attribute() {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{attr, doc, elem};

    #[test]
    fn is_doc_scans_all_attributes() {
        let fragment = doc()
            .child(elem("page").attr(attr("alias", "home")).attr(attr(DOC_MARKER, "")))
            .build();
        let mut cursor = fragment.cursor();
        assert!(!is_doc(&cursor));
        cursor.move_to_first_child();
        assert!(is_doc(&cursor));
        // probing must not move the cursor itself
        assert_eq!(cursor.name(), "page");
        assert_eq!(cursor.node_kind(), NodeKind::Element);
    }

    #[test]
    fn is_doc_is_false_without_the_marker() {
        let fragment = doc().child(elem("page").attr(attr("alias", "home"))).build();
        let mut cursor = fragment.cursor();
        cursor.move_to_first_child();
        assert!(!is_doc(&cursor));
    }
}
