//! Behavior of the content cursor against in-memory sources.

use std::sync::Arc;

use contentnav_core::{ContentSource, ContentType, FieldType, FieldValue, NodeKind, TreeCursor};
use contentnav_cursor::fragment::{attr, doc, elem, text};
use contentnav_cursor::testing::{TestNode, TestSource};
use contentnav_cursor::ContentCursor;

/// Source with one attribute field (`sort`) and one property field
/// (`title`) per item:
///
/// ```text
/// root
/// └── item 1 (children 2, 3)
///     ├── item 2
///     └── item 3
/// ```
fn simple_source() -> Arc<dyn ContentSource> {
    let item = ContentType::new("item", vec![FieldType::new("sort"), FieldType::new("title")]);
    let source = TestSource::new(0)
        .with_node(
            TestNode::new(1, -1, item.clone())
                .with_children(vec![2, 3])
                .with_values(vec![FieldValue::Text("1".into()), FieldValue::Text("One".into())]),
        )
        .with_node(TestNode::new(2, 1, item.clone()).with_values(vec![
            FieldValue::Text("2".into()),
            FieldValue::Text("Two".into()),
        ]))
        .with_node(TestNode::new(3, 1, item).with_values(vec![
            FieldValue::Text("3".into()),
            FieldValue::Text("Three".into()),
        ]))
        .with_root_children(vec![1]);
    Arc::new(source)
}

/// Source whose root child list contains an id the source does not
/// resolve (filtered content).
fn sparse_source() -> Arc<dyn ContentSource> {
    let item = ContentType::new("item", Vec::new());
    let source = TestSource::new(-1)
        .with_node(TestNode::new(5, -1, item.clone()))
        .with_node(TestNode::new(9, -1, item))
        .with_root_children(vec![5, 7, 9]);
    Arc::new(source)
}

#[test]
fn new_cursor_is_at_root() {
    let cursor = ContentCursor::new(simple_source());
    assert_eq!(cursor.node_kind(), NodeKind::Root);
    assert_eq!(cursor.name(), "");
    assert_eq!(cursor.value(), "");
}

#[test]
fn root_descends_to_the_root_element() {
    let mut cursor = ContentCursor::new(simple_source());
    assert!(cursor.move_to_first_child());
    assert_eq!(cursor.node_kind(), NodeKind::Element);
    assert_eq!(cursor.name(), "root");
    assert!(cursor.move_to_parent());
    assert_eq!(cursor.node_kind(), NodeKind::Root);
    assert!(!cursor.move_to_parent());
}

#[test]
fn attributes_start_with_the_synthetic_id() {
    let mut cursor = ContentCursor::new(simple_source());
    cursor.move_to_first_child(); // root element
    cursor.move_to_first_child(); // item 1
    assert!(cursor.move_to_first_attribute());
    assert_eq!(cursor.node_kind(), NodeKind::Attribute);
    assert_eq!(cursor.name(), "id");
    assert_eq!(cursor.value(), "1");
    assert!(cursor.move_to_next_attribute());
    assert_eq!(cursor.name(), "sort");
    assert_eq!(cursor.value(), "1");
    assert!(!cursor.move_to_next_attribute());
    assert!(cursor.move_to_parent());
    assert_eq!(cursor.name(), "item");
}

#[test]
fn attribute_iteration_covers_every_attribute_field_once() {
    let item = ContentType::new(
        "item",
        vec![FieldType::new("sort"), FieldType::new("level"), FieldType::new("title")],
    );
    let source: Arc<dyn ContentSource> = Arc::new(
        TestSource::new(1)
            .with_node(TestNode::new(1, -1, item).with_values(vec![
                FieldValue::Text("7".into()),
                FieldValue::Text("2".into()),
                FieldValue::Text("One".into()),
            ]))
            .with_root_children(vec![1]),
    );
    let mut cursor = ContentCursor::new(source);
    cursor.move_to_first_child();
    cursor.move_to_first_child(); // item 1
    let mut names = Vec::new();
    assert!(cursor.move_to_first_attribute());
    loop {
        names.push(cursor.name());
        if !cursor.move_to_next_attribute() {
            break;
        }
    }
    // the synthetic id first, then the declared attribute fields in order,
    // each exactly once; "title" is a property element, not an attribute
    assert_eq!(names, ["id", "sort", "level"]);
}

#[test]
fn the_id_attribute_exists_without_declared_attribute_fields() {
    let mut cursor = ContentCursor::new(sparse_source());
    cursor.move_to_first_child();
    cursor.move_to_first_child(); // item 5
    assert!(cursor.move_to_first_attribute());
    assert_eq!(cursor.name(), "id");
    assert_eq!(cursor.value(), "5");
    assert!(!cursor.move_to_next_attribute());
}

#[test]
fn property_elements_come_before_real_children() {
    let mut cursor = ContentCursor::new(simple_source());
    cursor.move_to_first_child(); // root element
    cursor.move_to_first_child(); // item 1
    assert!(cursor.move_to_first_child());
    assert_eq!(cursor.node_kind(), NodeKind::Element);
    assert_eq!(cursor.name(), "title");
    assert_eq!(cursor.value(), "One");
    // last property element transitions into the first real child
    assert!(cursor.move_to_next());
    assert_eq!(cursor.name(), "item");
    assert_eq!(cursor.node().id(), 2);
    // and back again
    assert!(cursor.move_to_previous());
    assert_eq!(cursor.name(), "title");
    assert!(!cursor.move_to_previous());
}

#[test]
fn property_text_is_a_leaf() {
    let mut cursor = ContentCursor::new(simple_source());
    cursor.move_to_first_child();
    cursor.move_to_first_child();
    cursor.move_to_first_child(); // title property
    assert!(cursor.move_to_first_child());
    assert_eq!(cursor.node_kind(), NodeKind::Text);
    assert_eq!(cursor.value(), "One");
    assert_eq!(cursor.name(), "");
    assert!(!cursor.move_to_first_child());
    assert!(cursor.move_to_parent());
    assert_eq!(cursor.name(), "title");
}

#[test]
fn unresolvable_sibling_ids_are_skipped_both_ways() {
    let mut cursor = ContentCursor::new(sparse_source());
    cursor.move_to_first_child(); // root element
    assert!(cursor.move_to_first_child());
    assert_eq!(cursor.node().id(), 5);
    assert!(cursor.move_to_next());
    assert_eq!(cursor.node().id(), 9);
    assert!(!cursor.move_to_next());
    assert_eq!(cursor.node().id(), 9);
    assert!(cursor.move_to_previous());
    assert_eq!(cursor.node().id(), 5);
    assert!(!cursor.move_to_previous());
}

#[test]
fn element_without_children_or_property_fields_is_empty() {
    let mut cursor = ContentCursor::new(sparse_source());
    cursor.move_to_first_child();
    cursor.move_to_first_child(); // item 5, no fields, no children
    assert!(cursor.is_empty_element());
}

#[test]
fn unresolvable_children_do_not_count_against_emptiness() {
    let item = ContentType::new("item", Vec::new());
    let source: Arc<dyn ContentSource> = Arc::new(
        TestSource::new(-1)
            .with_node(TestNode::new(4, -1, item).with_children(vec![70, 71]))
            .with_root_children(vec![4]),
    );
    let mut cursor = ContentCursor::new(source);
    cursor.move_to_first_child();
    cursor.move_to_first_child(); // item 4; children all filtered out
    assert!(cursor.is_empty_element());
    assert!(!cursor.move_to_first_child());
}

#[test]
fn element_with_a_property_field_is_not_empty() {
    let mut cursor = ContentCursor::new(simple_source());
    cursor.move_to_first_child();
    cursor.move_to_first_child(); // item 1 has a title property
    assert!(!cursor.is_empty_element());
}

#[test]
fn embedded_property_skips_the_fragment_root() {
    let fragment = doc()
        .child(
            elem("rte")
                .attr(attr("version", "2"))
                .child(elem("p").child_node(text("Hello"))),
        )
        .build();
    let item = ContentType::new("item", vec![FieldType::new("body")]);
    let source: Arc<dyn ContentSource> = Arc::new(
        TestSource::new(-1)
            .with_node(TestNode::new(1, -1, item).with_values(vec![FieldValue::Subtree(
                Arc::new(fragment.cursor()),
            )]))
            .with_root_children(vec![1]),
    );
    let mut cursor = ContentCursor::new(source);
    cursor.move_to_first_child(); // root element
    cursor.move_to_first_child(); // item 1
    cursor.move_to_first_child(); // body property
    assert_eq!(cursor.name(), "body");
    assert_eq!(cursor.value(), "Hello");
    assert!(!cursor.is_empty_element());
    // entering the property lands on the fragment's first element, not on
    // its synthetic root
    assert!(cursor.move_to_first_child());
    assert_eq!(cursor.name(), "rte");
    assert!(cursor.move_to_first_attribute());
    assert_eq!(cursor.name(), "version");
    assert!(cursor.move_to_parent());
    assert!(cursor.move_to_first_child());
    assert_eq!(cursor.name(), "p");
    // climbing back out of the fragment returns to the property element
    assert!(cursor.move_to_parent());
    assert_eq!(cursor.name(), "rte");
    assert!(cursor.move_to_parent());
    assert_eq!(cursor.name(), "body");
    assert!(cursor.move_to_parent());
    assert_eq!(cursor.name(), "item");
}

#[test]
fn clones_navigate_independently() {
    let mut cursor = ContentCursor::new(simple_source());
    cursor.move_to_first_child();
    cursor.move_to_first_child(); // item 1
    let mut clone = cursor.boxed_clone();
    assert!(clone.is_same_position(&cursor));

    // drive the clone two levels away
    assert!(clone.move_to_first_child());
    assert!(clone.move_to_next());
    assert!(!clone.is_same_position(&cursor));

    // the original still sits on item 1 with its own ancestor chain
    assert_eq!(cursor.node().id(), 1);
    assert!(cursor.move_to_parent());
    assert_eq!(cursor.name(), "root");

    // and the clone's chain is intact as well
    assert!(clone.move_to_parent());
    assert_eq!(clone.node_kind(), NodeKind::Element);
}

#[test]
fn move_to_parent_returns_to_an_equal_position() {
    let mut cursor = ContentCursor::new(simple_source());
    cursor.move_to_first_child();
    cursor.move_to_first_child();
    let before = cursor.boxed_clone();
    assert!(cursor.move_to_first_child());
    assert!(cursor.move_to_parent());
    assert!(cursor.is_same_position(before.as_ref()));
}

#[test]
fn move_to_requires_the_same_source_family() {
    let mut cursor = ContentCursor::new(simple_source());
    let other = ContentCursor::new(simple_source());
    assert!(!cursor.move_to(&other));
    assert_eq!(cursor.node_kind(), NodeKind::Root);

    let mut sibling = cursor.clone();
    sibling.move_to_first_child();
    assert!(cursor.move_to(&sibling));
    assert!(cursor.is_same_position(&sibling));
}

#[test]
fn move_to_id_builds_the_ancestor_chain() {
    let mut cursor = ContentCursor::new(simple_source());
    assert_eq!(cursor.move_to_id("3"), Ok(true));
    assert_eq!(cursor.node().id(), 3);
    assert_eq!(cursor.name(), "item");
    // sibling bookkeeping was replayed, so sideways moves work
    assert!(cursor.move_to_previous());
    assert_eq!(cursor.node().id(), 2);
    // and the chain continues up to the root element
    assert!(cursor.move_to_parent());
    assert_eq!(cursor.node().id(), 1);
    assert!(cursor.move_to_parent());
    assert_eq!(cursor.name(), "root");
}

#[test]
fn move_to_id_misses_are_plain_failures() {
    let mut cursor = ContentCursor::new(simple_source());
    cursor.move_to_first_child();
    let before = cursor.boxed_clone();
    assert_eq!(cursor.move_to_id("99"), Ok(false));
    assert_eq!(cursor.move_to_id("not-a-number"), Ok(false));
    assert!(cursor.is_same_position(before.as_ref()));
}

#[test]
fn move_to_id_respects_the_depth_limit() {
    let source = simple_source();
    let mut shallow =
        ContentCursor::with_root(Arc::clone(&source), 0, 1).expect("source root resolves");
    // item 1 sits at depth 1, inside the limit
    assert_eq!(shallow.move_to_id("1"), Ok(true));
    // items 2 and 3 sit at depth 2, beyond it
    assert_eq!(shallow.move_to_id("2"), Ok(false));
    assert_eq!(shallow.node().id(), 1);
}

#[test]
fn depth_limit_hides_deeper_children() {
    let source = simple_source();
    let mut cursor =
        ContentCursor::with_root(Arc::clone(&source), 0, 1).expect("source root resolves");
    cursor.move_to_first_child(); // root element, depth 0
    assert!(cursor.move_to_first_child()); // item 1, depth 1
    // item 1 has property fields, so it is not empty, but its real
    // children are out of reach
    let mut probe = cursor.clone();
    assert!(probe.move_to_first_child()); // title property
    assert!(!probe.move_to_next()); // no transition into item 2
}

#[test]
fn cursor_rooted_below_the_source_root() {
    let source = simple_source();
    let mut cursor =
        ContentCursor::with_root(Arc::clone(&source), 1, usize::MAX).expect("item 1 resolves");
    assert_eq!(cursor.node_kind(), NodeKind::Root);
    assert!(cursor.move_to_first_child());
    assert_eq!(cursor.node().id(), 1);
    assert_eq!(cursor.name(), "item");
    // the subtree root has no siblings in this view
    assert!(!cursor.move_to_next());

    // ids outside the subtree do not resolve through this cursor
    assert_eq!(cursor.move_to_id("1"), Ok(true));
    cursor.move_to_root();
    assert_eq!(cursor.node_kind(), NodeKind::Root);
}

#[test]
fn unknown_root_is_a_construction_error() {
    let source = simple_source();
    let err = ContentCursor::with_root(source, 99, usize::MAX).unwrap_err();
    assert_eq!(err, contentnav_core::CursorError::UnknownRoot(99));
}

#[test]
fn clone_with_root_shares_the_cache_family() {
    let mut cursor = ContentCursor::new(simple_source());
    cursor.move_to_first_child();
    cursor.move_to_first_child(); // item 1, now cached
    let first = Arc::clone(cursor.node());

    let mut rerooted = cursor.clone_with_root(1, usize::MAX).expect("item 1 resolves");
    rerooted.move_to_first_child();
    // the re-rooted cursor observes the identical node instance
    assert!(Arc::ptr_eq(&first, rerooted.node()));
}

#[test]
fn move_to_root_rewinds_the_whole_chain() {
    let mut cursor = ContentCursor::new(simple_source());
    assert_eq!(cursor.move_to_id("2"), Ok(true));
    cursor.move_to_root();
    assert_eq!(cursor.node_kind(), NodeKind::Root);
    assert!(cursor.move_to_first_child());
    assert_eq!(cursor.name(), "root");
}
