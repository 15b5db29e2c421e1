//! Copying models with or without their DOM back-references.

use tapestry_dom::{Dom, NodeId};

use crate::block::{Block, GroupKind};
use crate::document::ContentModelDocument;
use crate::segment::{Segment, SegmentKind};

/// What happens to `cached_element` in a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedElementMode {
    /// The copy still backs the same DOM.
    Keep,
    /// The copy is independent of the DOM.
    Drop,
}

/// Deep copy of a model.
///
/// Entity wrappers and general elements are live nodes, so even a dropped
/// copy shares them with the source. Use [`clone_model_disconnected`] when
/// the copy must own its own nodes.
pub fn clone_model(doc: &ContentModelDocument, mode: CachedElementMode) -> ContentModelDocument {
    let mut copy = doc.clone();
    if mode == CachedElementMode::Drop {
        drop_cached_elements(&mut copy.blocks);
    }
    copy
}

/// Deep copy that owns detached clones of every entity wrapper and general
/// element, with all back-references dropped.
pub fn clone_model_disconnected(doc: &ContentModelDocument, dom: &mut Dom) -> ContentModelDocument {
    let mut copy = clone_model(doc, CachedElementMode::Drop);
    detach_owned_nodes(&mut copy.blocks, dom);
    copy
}

fn drop_cached_elements(blocks: &mut [Block]) {
    for block in blocks {
        block.clear_cached_element();
        match block {
            Block::Paragraph(paragraph) => drop_segment_caches(&mut paragraph.segments),
            Block::BlockGroup(group) => {
                if let GroupKind::ListItem(item) = &mut group.kind {
                    for level in &mut item.levels {
                        level.cached_element = None;
                    }
                }
                drop_cached_elements(&mut group.blocks);
            }
            Block::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                    cell.cached_element = None;
                    drop_cached_elements(&mut cell.blocks);
                }
            }
            Block::Divider(_) | Block::Entity(_) => {}
        }
    }
}

fn drop_segment_caches(segments: &mut [Segment]) {
    for segment in segments {
        segment.cached_element = None;
        if let SegmentKind::General { blocks, .. } = &mut segment.kind {
            drop_cached_elements(blocks);
        }
    }
}

fn deep_clone(dom: &mut Dom, node: NodeId) -> NodeId {
    dom.clone_node(node, true).unwrap_or(node)
}

fn detach_owned_nodes(blocks: &mut [Block], dom: &mut Dom) {
    for block in blocks {
        match block {
            Block::Entity(entity) => entity.wrapper = deep_clone(dom, entity.wrapper),
            Block::Paragraph(paragraph) => {
                for segment in &mut paragraph.segments {
                    match &mut segment.kind {
                        SegmentKind::Entity(entity) => entity.wrapper = deep_clone(dom, entity.wrapper),
                        SegmentKind::General { element, blocks } => {
                            *element = clone_shallow(dom, *element);
                            detach_owned_nodes(blocks, dom);
                        }
                        _ => {}
                    }
                }
            }
            Block::BlockGroup(group) => {
                if let GroupKind::General { element } = &mut group.kind {
                    *element = clone_shallow(dom, *element);
                }
                detach_owned_nodes(&mut group.blocks, dom);
            }
            Block::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                    detach_owned_nodes(&mut cell.blocks, dom);
                }
            }
            Block::Divider(_) => {}
        }
    }
}

fn clone_shallow(dom: &mut Dom, node: NodeId) -> NodeId {
    dom.clone_node(node, false).unwrap_or(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Paragraph;
    use crate::entity::{Entity, EntityInfo};
    use crate::format::Format;

    #[test]
    fn test_drop_mode_clears_segment_caches() {
        let mut dom = Dom::new();
        let text = dom.create_text("a");
        let p = dom.create_element("p");
        let mut paragraph = Paragraph::new(false, Format::default())
            .with_segments(vec![Segment::text("a", Format::default())]);
        paragraph.cached_element = Some(p);
        paragraph.segments[0].cached_element = Some(text);
        let doc = ContentModelDocument::with_blocks(vec![Block::Paragraph(paragraph)]);

        let kept = clone_model(&doc, CachedElementMode::Keep);
        assert_eq!(kept, doc);

        let dropped = clone_model(&doc, CachedElementMode::Drop);
        let paragraph = dropped.blocks[0].as_paragraph().unwrap();
        assert_eq!(paragraph.cached_element, None);
        assert_eq!(paragraph.segments[0].cached_element, None);
    }

    #[test]
    fn test_disconnected_clone_owns_entity_wrapper() {
        let mut dom = Dom::new();
        let wrapper = dom.create_element("div");
        let inner = dom.create_text("x");
        dom.append_child(wrapper, inner).unwrap();
        let doc = ContentModelDocument::with_blocks(vec![Block::Entity(Entity::new(
            wrapper,
            EntityInfo::default(),
            Format::default(),
        ))]);

        let copy = clone_model_disconnected(&doc, &mut dom);
        let Block::Entity(entity) = &copy.blocks[0] else {
            unreachable!()
        };
        assert_ne!(entity.wrapper, wrapper);
        assert_eq!(dom.text_content(entity.wrapper), "x");
    }
}
