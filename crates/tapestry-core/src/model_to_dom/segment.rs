//! Segment handlers.
//!
//! Text, `br` and images render into a `span` carrier: the decorator wraps
//! the content in `code` and `a`, then segment keys style the carrier and
//! wrap element-based formatting around the decorated content. A carrier
//! left without attributes is unwrapped.

use tapestry_dom::{Dom, NodeId};
use tapestry_model::api::check_xss;
use tapestry_model::{Dataset, Entity, Format, Segment, SegmentKind};

use super::block::insert;
use super::context::{ModelToDomContext, SelectionPoint};
use crate::dom_to_model::{DELIMITER_AFTER, DELIMITER_BEFORE};
use crate::format::{FormatCategory, implicit_format};

const ZERO_WIDTH_SPACE: &str = "\u{200B}";

fn set_attribute(dom: &mut Dom, element: NodeId, name: &str, value: &str) {
    if let Err(error) = dom.set_attribute(element, name, value) {
        tracing::debug!(target: "tapestry::model_to_dom", %error, name, "attribute write failed");
    }
}

pub(crate) fn set_dataset(dom: &mut Dom, element: NodeId, dataset: &Dataset) {
    for (key, value) in dataset {
        set_attribute(dom, element, &format!("data-{key}"), value);
    }
}

/// Dispatch one segment and record the selection it covers.
pub fn handle_segment(dom: &mut Dom, segment: &mut Segment, container: NodeId, context: &mut ModelToDomContext) {
    let before = dom.last_child(container);
    let handlers = context.handlers;
    match segment.kind {
        SegmentKind::Text { .. } => (handlers.text)(dom, segment, container, context),
        SegmentKind::Br => (handlers.br)(dom, segment, container, context),
        SegmentKind::Image(_) => (handlers.image)(dom, segment, container, context),
        SegmentKind::Entity(_) => (handlers.entity_segment)(dom, segment, container, context),
        SegmentKind::General { .. } => (handlers.general_segment)(dom, segment, container, context),
        SegmentKind::SelectionMarker => {}
    }

    if segment.is_selected {
        let start = match before {
            Some(node) => SelectionPoint::After(node),
            None => SelectionPoint::StartOf(container),
        };
        let end = match dom.last_child(container) {
            Some(node) if Some(node) != before => SelectionPoint::After(node),
            _ => start,
        };
        context.selection.record(start, end);
    }
}

fn render_in_carrier(dom: &mut Dom, segment: &Segment, container: NodeId, content: NodeId, context: &mut ModelToDomContext) {
    let carrier = dom.create_element("span");
    insert(dom, container, carrier, None);
    insert(dom, carrier, content, None);

    let decorator = context.handlers.segment_decorator;
    decorator(dom, segment, carrier, context);
    context.apply_segment(&segment.format, dom, carrier);

    let is_bare = dom
        .element(carrier)
        .is_some_and(|element| element.attributes().next().is_none());
    if is_bare {
        if let Err(error) = dom.unwrap(carrier) {
            tracing::debug!(target: "tapestry::model_to_dom", %error, "carrier unwrap failed");
        }
    }
}

/// Wraps the carrier content in `code`, then `a`.
pub fn handle_segment_decorator(dom: &mut Dom, segment: &Segment, carrier: NodeId, context: &mut ModelToDomContext) {
    if let Some(code) = &segment.code {
        match dom.wrap_children(carrier, "code") {
            Ok(element) => context.apply(FormatCategory::Code, &code.format, dom, element, &implicit_format("code")),
            Err(error) => tracing::debug!(target: "tapestry::model_to_dom", %error, "code wrap failed"),
        }
    }
    if let Some(link) = &segment.link {
        match dom.wrap_children(carrier, "a") {
            Ok(element) => {
                context.apply(FormatCategory::Link, &link.format, dom, element, &implicit_format("a"));
                set_dataset(dom, element, &link.dataset);
            }
            Err(error) => tracing::debug!(target: "tapestry::model_to_dom", %error, "link wrap failed"),
        }
    }
}

/// Reuses the text node the segment came from unless an earlier segment of
/// this render already claimed it.
pub fn handle_text(dom: &mut Dom, segment: &mut Segment, container: NodeId, context: &mut ModelToDomContext) {
    let text = segment.as_text().unwrap_or_default().to_string();
    let reusable = segment
        .cached_element
        .filter(|node| context.allow_cache_element && dom.is_text(*node) && !context.used_text_nodes.contains(node));
    let node = match reusable {
        Some(node) => {
            if dom.text(node) != Some(text.as_str()) {
                if let Err(error) = dom.set_text(node, text) {
                    tracing::debug!(target: "tapestry::model_to_dom", %error, "text update failed");
                }
            }
            context.stats.reused += 1;
            node
        }
        None => {
            context.stats.created += 1;
            dom.create_text(text)
        }
    };
    context.used_text_nodes.insert(node);
    segment.cached_element = context.allow_cache_element.then_some(node);
    render_in_carrier(dom, segment, container, node, context);
}

pub fn handle_br(dom: &mut Dom, segment: &mut Segment, container: NodeId, context: &mut ModelToDomContext) {
    let br = dom.create_element("br");
    context.node_created(dom, br);
    segment.cached_element = context.allow_cache_element.then_some(br);
    render_in_carrier(dom, segment, container, br, context);
}

pub fn handle_image(dom: &mut Dom, segment: &mut Segment, container: NodeId, context: &mut ModelToDomContext) {
    let Some(image) = segment.as_image() else {
        return;
    };
    let img = dom.create_element("img");
    let src = check_xss(&image.src);
    set_attribute(dom, img, "src", &src);
    if let Some(alt) = &image.alt {
        set_attribute(dom, img, "alt", alt);
    }
    if let Some(title) = &image.title {
        set_attribute(dom, img, "title", title);
    }
    set_dataset(dom, img, &image.dataset);
    if image.is_selected_as_image_selection {
        context.selection.image = Some(img);
    }
    context.apply(FormatCategory::Image, &segment.format, dom, img, &Format::default());
    context.node_created(dom, img);

    segment.cached_element = context.allow_cache_element.then_some(img);
    render_in_carrier(dom, segment, container, img, context);
}

/// Class list and editability of an entity wrapper. Wrappers adopted without
/// entity classes keep their markup.
pub(crate) fn apply_entity_markup(dom: &mut Dom, entity: &Entity) {
    if entity.info.is_fake_entity {
        return;
    }
    let mut classes: Vec<String> = dom
        .classes(entity.wrapper)
        .into_iter()
        .filter(|class| !class.starts_with("_E"))
        .map(str::to_owned)
        .collect();
    classes.extend(entity.info.to_classes().iter().map(ToString::to_string));
    set_attribute(dom, entity.wrapper, "class", &classes.join(" "));
    if entity.info.is_readonly {
        set_attribute(dom, entity.wrapper, "contenteditable", "false");
    }
}

fn delimiter(dom: &mut Dom, class: &str) -> NodeId {
    let span = dom.create_element("span");
    set_attribute(dom, span, "class", class);
    let text = dom.create_text(ZERO_WIDTH_SPACE);
    insert(dom, span, text, None);
    span
}

/// Moves the live wrapper into place, bracketed by delimiters when it is
/// read-only so the caret has somewhere to go on either side.
pub fn handle_entity_segment(dom: &mut Dom, segment: &mut Segment, container: NodeId, context: &mut ModelToDomContext) {
    let SegmentKind::Entity(entity) = &segment.kind else {
        return;
    };
    if !dom.is_alive(entity.wrapper) {
        tracing::debug!(target: "tapestry::model_to_dom", "entity wrapper is gone");
        return;
    }
    apply_entity_markup(dom, entity);
    let wrapper = entity.wrapper;
    let delimit = context.add_delimiter_for_entity && entity.info.is_readonly;

    if delimit {
        let before = delimiter(dom, DELIMITER_BEFORE);
        insert(dom, container, before, None);
    }
    insert(dom, container, wrapper, None);
    if delimit {
        let after = delimiter(dom, DELIMITER_AFTER);
        insert(dom, container, after, None);
    }
    context.stats.reused += 1;
    segment.cached_element = context.allow_cache_element.then_some(wrapper);
}

/// Unknown inline element: its clone holds the rendered child blocks.
pub fn handle_general_segment(dom: &mut Dom, segment: &mut Segment, container: NodeId, context: &mut ModelToDomContext) {
    let SegmentKind::General { element, blocks } = &mut segment.kind else {
        return;
    };
    if !dom.is_alive(*element) {
        *element = dom.create_element("span");
        context.node_created(dom, *element);
    }
    let element = *element;
    insert(dom, container, element, None);
    let handler = context.handlers.block_group_children;
    handler(dom, blocks, element, context);
    segment.cached_element = context.allow_cache_element.then_some(element);
}

#[cfg(test)]
mod tests {
    use tapestry_model::{Code, EntityInfo, Link};

    use super::*;

    fn render(segment: &mut Segment) -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let container = dom.create_element("div");
        let mut context = ModelToDomContext::with_defaults();
        handle_segment(&mut dom, segment, container, &mut context);
        (dom, container)
    }

    #[test]
    fn test_plain_text_has_no_carrier() {
        let mut segment = Segment::text("hi", Format::default());
        let (dom, container) = render(&mut segment);
        assert_eq!(dom.inner_html(container), "hi");
        assert_eq!(segment.cached_element, dom.first_child(container));
    }

    #[test]
    fn test_decorators_nest_inside_formatting() {
        let format = Format {
            font_weight: Some("bold".into()),
            text_color: Some("red".into()),
            ..Default::default()
        };
        let link = Link {
            format: Format {
                href: Some("https://example.com".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut segment = Segment::text("x", format)
            .with_link(Some(link))
            .with_code(Some(Code::default()));
        let (dom, container) = render(&mut segment);
        insta::assert_snapshot!(dom.inner_html(container), @r#"<span style="color: red;"><b><a href="https://example.com"><code>x</code></a></b></span>"#);
    }

    #[test]
    fn test_script_image_source_is_dropped() {
        let mut segment = Segment::image("javascript:alert(1)", Format::default());
        let (dom, container) = render(&mut segment);
        let img = dom.first_child(container).unwrap();
        assert_eq!(dom.attribute(img, "src"), Some(""));
    }

    #[test]
    fn test_readonly_entity_gets_delimiters() {
        let mut dom = Dom::new();
        let container = dom.create_element("div");
        let wrapper = dom.create_element("span");
        let info = EntityInfo {
            entity_type: Some("mention".into()),
            is_readonly: true,
            ..Default::default()
        };
        let mut segment = Segment::entity(Entity::new(wrapper, info, Format::default()));
        let mut context = ModelToDomContext::with_defaults();
        handle_segment(&mut dom, &mut segment, container, &mut context);

        assert_eq!(dom.child_count(container), 3);
        assert!(dom.has_class(dom.child_at(container, 0).unwrap(), DELIMITER_BEFORE));
        assert_eq!(dom.child_at(container, 1), Some(wrapper));
        assert_eq!(dom.attribute(wrapper, "contenteditable"), Some("false"));
        assert!(dom.has_class(wrapper, "_EType_mention"));
        assert!(dom.has_class(dom.child_at(container, 2).unwrap(), DELIMITER_AFTER));
    }
}
