//! Parsing and rendering against each other.

use tapestry_core::{DomToModelContext, ModelToDomContext, content_model_to_dom, dom_to_content_model};
use tapestry_dom::{Dom, DomPosition, DomRange, DomSelection, NodeId};
use tapestry_model::selection::selected_paragraphs;
use tapestry_model::{Block, ContentModelDocument, PathStep};

fn parse(dom: &mut Dom, root: NodeId, selection: Option<DomSelection>) -> ContentModelDocument {
    let mut context = DomToModelContext::with_defaults().with_selection(selection);
    dom_to_content_model(dom, root, &mut context)
}

/// Render into a fresh root without touching the source nodes.
fn render_detached(dom: &mut Dom, model: &mut ContentModelDocument) -> (NodeId, Option<DomSelection>) {
    let root = dom.create_element("div");
    let mut context = ModelToDomContext::with_defaults();
    context.allow_cache_element = false;
    let selection = content_model_to_dom(dom, root, model, &mut context);
    (root, selection)
}

#[test]
fn rendered_markup_is_a_fixed_point() {
    let fixtures = [
        "<div>plain</div>",
        "<div>a <i>b</i> <u>c</u></div>",
        r#"<div style="text-align: center">centered</div>"#,
        "<ol><li><div>x</div></li><li><div>y</div></li></ol>",
        "<table><tbody><tr><td>1</td><td>2</td></tr></tbody></table>",
    ];
    let mut dom = Dom::new();
    for html in fixtures {
        let source = dom.create_element("div");
        dom.set_inner_html(source, html).unwrap();
        let mut first = parse(&mut dom, source, None);
        let (rendered, _) = render_detached(&mut dom, &mut first);

        let mut second = parse(&mut dom, rendered, None);
        let (again, _) = render_detached(&mut dom, &mut second);
        assert_eq!(dom.inner_html(again), dom.inner_html(rendered), "fixture {html}");
    }
}

#[test]
fn caret_survives_parse_and_render() {
    let mut dom = Dom::new();
    let source = dom.create_element("div");
    dom.set_inner_html(source, "<div>hello world</div>").unwrap();
    let text = dom.first_child(dom.first_child(source).unwrap()).unwrap();
    let caret = DomSelection::range(DomRange::caret(DomPosition::new(text, 5)));

    let mut model = parse(&mut dom, source, Some(caret));
    let (rendered, selection) = render_detached(&mut dom, &mut model);
    let first_text = dom.first_child(dom.first_child(rendered).unwrap()).unwrap();
    assert_eq!(dom.text(first_text), Some("hello"));
    assert_eq!(
        selection,
        Some(DomSelection::range(DomRange::caret(DomPosition::new(first_text, 5))))
    );
    assert_eq!(dom.text_content(rendered), "hello world");

    let reparsed = parse(&mut dom, rendered, selection);
    assert_eq!(selected_paragraphs(&reparsed), vec![vec![PathStep::Block(0)]]);
    let paragraph = reparsed.blocks[0].as_paragraph().unwrap();
    assert_eq!(paragraph.text(), "hello world");
    assert!(paragraph.segments.iter().any(|segment| segment.is_marker()));
}

#[test]
fn parsing_twice_gives_equal_models() {
    let mut dom = Dom::new();
    let source = dom.create_element("div");
    dom.set_inner_html(
        source,
        r#"<div>one <b>two</b></div><ul><li>a</li><li>b</li></ul><blockquote><div>q</div></blockquote>"#,
    )
    .unwrap();
    let first = parse(&mut dom, source, None);
    let second = parse(&mut dom, source, None);
    assert_eq!(first, second);
}

#[test]
fn wrapped_list_fragments_keep_one_numbering() {
    let mut dom = Dom::new();
    let source = dom.create_element("div");
    dom.set_inner_html(
        source,
        r#"<div><ol><li>one</li></ol></div><div><ol start="2"><li>two</li></ol></div><div><ol><li>three</li></ol></div>"#,
    )
    .unwrap();
    let mut model = parse(&mut dom, source, None);

    let overrides: Vec<Option<u32>> = model
        .blocks
        .iter()
        .map(|block| {
            let item = block.as_group().and_then(|group| group.as_list_item()).unwrap();
            item.levels[0].format.start_number_override
        })
        .collect();
    assert_eq!(overrides, vec![Some(1), None, None]);

    let (rendered, _) = render_detached(&mut dom, &mut model);
    assert_eq!(dom.query_tag(rendered, "ol").len(), 1);
    assert_eq!(dom.query_tag(rendered, "li").len(), 3);
    assert!(model.blocks.iter().all(|block| matches!(block, Block::BlockGroup(_))));
}
