//! Host tree behavior seen from outside the crate.

use tapestry_dom::{Dom, DomPosition, DomRange, NodeType};

fn fixture(html: &str) -> (Dom, tapestry_dom::NodeId) {
    let mut dom = Dom::new();
    let root = dom.create_element("div");
    dom.set_inner_html(root, html).unwrap();
    (dom, root)
}

#[test]
fn detached_nodes_stay_addressable_until_disposed() {
    let (mut dom, root) = fixture("<p>a</p><p>b</p>");
    let first = dom.first_child(root).unwrap();
    dom.remove_child(root, first).unwrap();

    assert!(dom.is_alive(first));
    assert!(!dom.contains(root, first));
    assert_eq!(dom.inner_html(root), "<p>b</p>");

    // Put it back at the end.
    dom.append_child(root, first).unwrap();
    assert_eq!(dom.inner_html(root), "<p>b</p><p>a</p>");
}

#[test]
fn set_inner_html_disposes_old_children() {
    let (mut dom, root) = fixture("<span>x</span>");
    let span = dom.first_child(root).unwrap();
    let text = dom.first_child(span).unwrap();

    dom.set_inner_html(root, "y").unwrap();

    assert!(!dom.is_alive(span));
    assert!(!dom.is_alive(text));
    assert_eq!(dom.node_type(dom.first_child(root).unwrap()), Some(NodeType::Text));
}

#[test]
fn queries_find_elements_in_document_order() {
    let (dom, root) = fixture(r#"<table id="t"><tr><td>1</td><td>2</td></tr></table><div><table><tr><td>3</td></tr></table></div>"#);
    let cells = dom.query_tag(root, "td");
    assert_eq!(cells.len(), 3);
    assert_eq!(dom.text_content(cells[2]), "3");

    let table = dom.element_by_id(root, "t").unwrap();
    assert_eq!(dom.find_closest_ancestor(cells[0], "table", root), Some(table));
    assert_ne!(dom.find_closest_ancestor(cells[2], "table", root), Some(table));
    let second = dom.query_tag(root, "table")[1];
    assert_eq!(dom.find_closest_ancestor(cells[2], "div", root), dom.parent(second));
}

#[test]
fn host_selection_survives_node_moves() {
    let (mut dom, root) = fixture("<b>bold</b>");
    let bold = dom.first_child(root).unwrap();
    let text = dom.first_child(bold).unwrap();
    dom.set_selection_range(DomRange::caret(DomPosition::new(text, 2)), false);

    let wrapper = dom.wrap(bold, "i").unwrap();
    assert_eq!(dom.inner_html(root), "<i><b>bold</b></i>");
    assert_eq!(dom.parent(bold), Some(wrapper));

    let selection = dom.selection().copied().unwrap();
    assert_eq!(selection.range.start, DomPosition::new(text, 2));
    assert!(dom.contains(root, selection.range.start.node));
}
