//! Ancestor chains into the block tree.
//!
//! Model nodes carry no parent pointers. Code that needs to walk back up, or
//! to invalidate every ancestor of a node it is about to change, addresses the
//! node with a [`ModelPath`] from the document root instead.

use crate::block::Block;
use crate::document::ContentModelDocument;
use crate::segment::Segment;
use crate::table::TableCell;

/// One step down the block tree.
///
/// `Block` indexes into the blocks of the current group. `Cell` steps from a
/// table block into one of its cells, whose blocks the next step indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathStep {
    Block(usize),
    Cell { row: usize, column: usize },
}

/// Route from the document root to a block. Compares in document order.
pub type ModelPath = Vec<PathStep>;

/// A segment addressed by the paragraph holding it and its index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentPath {
    pub paragraph: ModelPath,
    pub index: usize,
}

impl SegmentPath {
    pub fn new(paragraph: ModelPath, index: usize) -> Self {
        Self { paragraph, index }
    }
}

fn resolve<'a>(blocks: &'a [Block], path: &[PathStep]) -> Option<&'a Block> {
    let (PathStep::Block(index), rest) = path.split_first()? else {
        return None;
    };
    let block = blocks.get(*index)?;
    match rest.first() {
        None => Some(block),
        Some(PathStep::Block(_)) => resolve(&block.as_group()?.blocks, rest),
        Some(PathStep::Cell { row, column }) => {
            let cell = block.as_table()?.cell(*row, *column)?;
            resolve(&cell.blocks, &rest[1..])
        }
    }
}

fn resolve_mut<'a>(
    blocks: &'a mut [Block],
    path: &[PathStep],
    clear_cache: bool,
) -> Option<&'a mut Block> {
    let (PathStep::Block(index), rest) = path.split_first()? else {
        return None;
    };
    let block = blocks.get_mut(*index)?;
    if clear_cache {
        block.clear_cached_element();
    }
    match rest.first() {
        None => Some(block),
        Some(PathStep::Block(_)) => resolve_mut(&mut block.as_group_mut()?.blocks, rest, clear_cache),
        Some(PathStep::Cell { row, column }) => {
            let cell = block.as_table_mut()?.cell_mut(*row, *column)?;
            if clear_cache {
                cell.cached_element = None;
            }
            resolve_mut(&mut cell.blocks, &rest[1..], clear_cache)
        }
    }
}

/// Block at `path`.
pub fn block_at<'a>(doc: &'a ContentModelDocument, path: &[PathStep]) -> Option<&'a Block> {
    resolve(&doc.blocks, path)
}

/// Block at `path`, for changes that leave rendering untouched, such as
/// selection flags.
pub fn block_at_mut<'a>(
    doc: &'a mut ContentModelDocument,
    path: &[PathStep],
) -> Option<&'a mut Block> {
    resolve_mut(&mut doc.blocks, path, false)
}

/// Block at `path`, prepared for a change that must be re-rendered.
///
/// Clears `cached_element` on the block and on every group, table, row and
/// cell above it, so the renderer cannot reuse a stale node on the way down.
pub fn mutate_block<'a>(
    doc: &'a mut ContentModelDocument,
    path: &[PathStep],
) -> Option<&'a mut Block> {
    resolve_mut(&mut doc.blocks, path, true)
}

/// Table cell at `path`, where `path` ends in a [`PathStep::Cell`].
pub fn cell_at<'a>(doc: &'a ContentModelDocument, path: &[PathStep]) -> Option<&'a TableCell> {
    let (PathStep::Cell { row, column }, table_path) = path.split_last()? else {
        return None;
    };
    block_at(doc, table_path)?.as_table()?.cell(*row, *column)
}

/// The blocks owned by the container at `path`.
///
/// An empty path is the document itself. A path ending in a `Cell` step is
/// that cell; a path ending in a group block is the group.
pub fn container_blocks<'a>(
    doc: &'a ContentModelDocument,
    path: &[PathStep],
) -> Option<&'a [Block]> {
    match path.last() {
        None => Some(&doc.blocks),
        Some(PathStep::Cell { .. }) => cell_at(doc, path).map(|cell| cell.blocks.as_slice()),
        Some(PathStep::Block(_)) => block_at(doc, path)?.as_group().map(|g| g.blocks.as_slice()),
    }
}

pub fn segment_at<'a>(doc: &'a ContentModelDocument, path: &SegmentPath) -> Option<&'a Segment> {
    block_at(doc, &path.paragraph)?
        .as_paragraph()?
        .segments
        .get(path.index)
}

/// Segment at `path` for flag changes that do not need re-rendering.
pub fn segment_at_mut<'a>(
    doc: &'a mut ContentModelDocument,
    path: &SegmentPath,
) -> Option<&'a mut Segment> {
    block_at_mut(doc, &path.paragraph)?
        .as_paragraph_mut()?
        .segments
        .get_mut(path.index)
}

/// Depth-first pre-order walk over every block, descending into groups and
/// table cells.
pub fn visit_blocks<'a>(doc: &'a ContentModelDocument, mut visitor: impl FnMut(&ModelPath, &'a Block)) {
    let mut path = ModelPath::new();
    walk(&doc.blocks, &mut path, &mut visitor);
}

fn walk<'a>(blocks: &'a [Block], path: &mut ModelPath, visitor: &mut impl FnMut(&ModelPath, &'a Block)) {
    for (index, block) in blocks.iter().enumerate() {
        path.push(PathStep::Block(index));
        visitor(path, block);
        match block {
            Block::BlockGroup(group) => walk(&group.blocks, path, visitor),
            Block::Table(table) => {
                for (row_index, row) in table.rows.iter().enumerate() {
                    for (column_index, cell) in row.cells.iter().enumerate() {
                        path.push(PathStep::Cell {
                            row: row_index,
                            column: column_index,
                        });
                        walk(&cell.blocks, path, visitor);
                        path.pop();
                    }
                }
            }
            _ => {}
        }
        path.pop();
    }
}

/// Paths of every paragraph, in document order.
pub fn paragraph_paths(doc: &ContentModelDocument) -> Vec<ModelPath> {
    let mut paths = Vec::new();
    visit_blocks(doc, |path, block| {
        if matches!(block, Block::Paragraph(_)) {
            paths.push(path.clone());
        }
    });
    paths
}

/// Mutable walk over every block. Children are visited after their parent
/// has been handed out, so the visitor may edit a group before its content.
pub fn visit_blocks_mut(doc: &mut ContentModelDocument, mut visitor: impl FnMut(&ModelPath, &mut Block)) {
    let mut path = ModelPath::new();
    walk_mut(&mut doc.blocks, &mut path, &mut visitor);
}

fn walk_mut(blocks: &mut [Block], path: &mut ModelPath, visitor: &mut impl FnMut(&ModelPath, &mut Block)) {
    for (index, block) in blocks.iter_mut().enumerate() {
        path.push(PathStep::Block(index));
        visitor(path, block);
        match block {
            Block::BlockGroup(group) => walk_mut(&mut group.blocks, path, visitor),
            Block::Table(table) => {
                for (row_index, row) in table.rows.iter_mut().enumerate() {
                    for (column_index, cell) in row.cells.iter_mut().enumerate() {
                        path.push(PathStep::Cell {
                            row: row_index,
                            column: column_index,
                        });
                        walk_mut(&mut cell.blocks, path, visitor);
                        path.pop();
                    }
                }
            }
            _ => {}
        }
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockGroup, Paragraph};
    use crate::format::Format;
    use crate::table::{Table, TableCell};
    use tapestry_dom::Dom;

    fn sample() -> ContentModelDocument {
        let mut quote = BlockGroup::format_container("blockquote", Format::default());
        quote
            .blocks
            .push(Block::Paragraph(Paragraph::new(false, Format::default())));
        let mut table = Table::new(1, Format::default());
        let mut cell = TableCell::default();
        cell.blocks
            .push(Block::Paragraph(Paragraph::new(true, Format::default())));
        table.rows[0].cells = vec![TableCell::default(), cell];
        ContentModelDocument::with_blocks(vec![Block::BlockGroup(quote), Block::Table(table)])
    }

    #[test]
    fn test_resolve_through_group_and_cell() {
        let doc = sample();
        let inner = block_at(&doc, &[PathStep::Block(0), PathStep::Block(0)]).unwrap();
        assert!(!inner.as_paragraph().unwrap().is_implicit);
        let in_cell = block_at(
            &doc,
            &[PathStep::Block(1), PathStep::Cell { row: 0, column: 1 }, PathStep::Block(0)],
        )
        .unwrap();
        assert!(in_cell.as_paragraph().unwrap().is_implicit);
        assert!(block_at(&doc, &[PathStep::Cell { row: 0, column: 0 }]).is_none());
        assert!(block_at(&doc, &[PathStep::Block(5)]).is_none());
    }

    #[test]
    fn test_mutate_block_clears_ancestors() {
        let mut dom = Dom::new();
        let node = dom.create_element("td");
        let mut doc = sample();
        let Block::Table(table) = &mut doc.blocks[1] else {
            unreachable!()
        };
        table.cached_element = Some(node);
        table.rows[0].cached_element = Some(node);
        table.rows[0].cells[1].cached_element = Some(node);
        table.rows[0].cells[0].cached_element = Some(node);

        let path = [PathStep::Block(1), PathStep::Cell { row: 0, column: 1 }, PathStep::Block(0)];
        mutate_block(&mut doc, &path).unwrap();

        let table = doc.blocks[1].as_table().unwrap();
        assert_eq!(table.cached_element, None);
        assert_eq!(table.rows[0].cached_element, None);
        assert_eq!(table.rows[0].cells[1].cached_element, None);
        // Sibling cell is untouched.
        assert_eq!(table.rows[0].cells[0].cached_element, Some(node));
    }

    #[test]
    fn test_visit_order_matches_path_order() {
        let doc = sample();
        let mut seen = Vec::new();
        visit_blocks(&doc, |path, _| seen.push(path.clone()));
        assert_eq!(seen.len(), 4);
        let mut sorted = seen.clone();
        sorted.sort();
        assert_eq!(seen, sorted);
        assert_eq!(paragraph_paths(&doc).len(), 2);
    }
}
