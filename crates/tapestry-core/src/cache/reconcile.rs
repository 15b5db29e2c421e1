//! Moving the selection of a cached model without re-parsing.

use tapestry_dom::{Dom, DomPosition, DomSelection, NodeId};
use tapestry_model::path::{block_at, cell_at, segment_at};
use tapestry_model::selection::{BoundaryPoint, clear_selection, select_image, select_range, select_table_cells};
use tapestry_model::{Block, CellRect, ContentModelDocument, PathStep, SegmentPath};

use super::index::DomIndex;
use crate::dom_to_model::{is_folded_space, preserves_whitespace};
use crate::error::ReconcileError;

/// Rewrite the selection flags of `model` to match `selection`.
///
/// Only selection markers and flags change. On `Err` the model may be left
/// half updated and must be dropped.
pub fn reconcile_selection(
    dom: &Dom,
    root: NodeId,
    model: &mut ContentModelDocument,
    index: &DomIndex,
    selection: &DomSelection,
) -> Result<(), ReconcileError> {
    clear_selection(model);
    match *selection {
        DomSelection::Range { range, is_reverted } => {
            let start = locate(dom, root, model, index, range.start)?;
            let end = if range.collapsed() {
                start.clone()
            } else {
                locate(dom, root, model, index, range.end)?
            };
            if !select_range(model, &start, &end, is_reverted) {
                return Err(ReconcileError::InvariantViolation(
                    "range boundary is not in a paragraph".into(),
                ));
            }
        }
        DomSelection::Image { image } => {
            let path = index
                .segments
                .get(&image)
                .ok_or_else(|| ReconcileError::SelectionUnresolvable("image is not indexed".into()))?;
            check_ancestors(dom, root, model, &path.paragraph, image)?;
            if !select_image(model, path) {
                return Err(ReconcileError::StructuralMismatch("indexed node is not an image".into()));
            }
        }
        DomSelection::Table {
            table,
            first_column,
            first_row,
            last_column,
            last_row,
        } => {
            let path = index
                .tables
                .get(&table)
                .ok_or_else(|| ReconcileError::SelectionUnresolvable("table is not indexed".into()))?;
            check_ancestors(dom, root, model, path, table)?;
            let rect = CellRect::from_corners((first_row, first_column), (last_row, last_column));
            let Some(model_table) = block_at(model, path).and_then(Block::as_table) else {
                return Err(ReconcileError::StructuralMismatch("indexed node is not a table".into()));
            };
            if rect.last_row >= model_table.rows.len() || rect.last_column >= model_table.column_count() {
                return Err(ReconcileError::InvariantViolation(format!(
                    "cell ({}, {}) is outside the table",
                    rect.last_row, rect.last_column
                )));
            }
            select_table_cells(model, path, rect);
        }
    }
    Ok(())
}

/// Every block on the way down to `path` that remembers an element must
/// still contain `node`.
fn check_ancestors(
    dom: &Dom,
    root: NodeId,
    model: &ContentModelDocument,
    path: &[PathStep],
    node: NodeId,
) -> Result<(), ReconcileError> {
    if !dom.is_connected_to(node, root) {
        return Err(ReconcileError::StructuralMismatch("node left the editor".into()));
    }
    for depth in 1..=path.len() {
        let prefix = &path[..depth];
        let cached = match prefix.last() {
            Some(PathStep::Cell { .. }) => cell_at(model, prefix).map(|cell| cell.cached_element),
            _ => block_at(model, prefix).map(Block::cached_element),
        };
        match cached {
            None => {
                return Err(ReconcileError::StructuralMismatch(format!(
                    "no model node at depth {depth}"
                )));
            }
            Some(Some(element)) if !dom.contains(element, node) => {
                return Err(ReconcileError::StructuralMismatch(format!(
                    "ancestor at depth {depth} no longer holds the node"
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn locate(
    dom: &Dom,
    root: NodeId,
    model: &ContentModelDocument,
    index: &DomIndex,
    position: DomPosition,
) -> Result<BoundaryPoint, ReconcileError> {
    if dom.is_text(position.node) {
        return locate_in_text(dom, root, model, index, position.node, position.offset);
    }
    if let Some(child) = dom.child_at(position.node, position.offset) {
        if let Some(point) = point_before(dom, root, model, index, child)? {
            return Ok(point);
        }
    }
    if let Some(previous) = position
        .offset
        .checked_sub(1)
        .and_then(|offset| dom.child_at(position.node, offset))
    {
        if let Some(point) = point_after(dom, root, model, index, previous)? {
            return Ok(point);
        }
    }
    if let Some(paragraph) = index.paragraphs.get(&position.node) {
        check_ancestors(dom, root, model, paragraph, position.node)?;
        return Ok(BoundaryPoint::new(paragraph.clone(), 0, 0));
    }
    Err(ReconcileError::SelectionUnresolvable(
        "position is not inside any indexed node".into(),
    ))
}

/// Verify the text of an indexed node against its segments, then find the
/// segment holding char `offset`.
///
/// Segments hold the text as the parser folded it, so the comparison and
/// the offset go through the same folding.
fn locate_in_text(
    dom: &Dom,
    root: NodeId,
    model: &ContentModelDocument,
    index: &DomIndex,
    node: NodeId,
    offset: usize,
) -> Result<BoundaryPoint, ReconcileError> {
    let paths = index
        .text_nodes
        .get(&node)
        .ok_or_else(|| ReconcileError::SelectionUnresolvable("text node is not indexed".into()))?;
    let Some(first) = paths.first() else {
        return Err(ReconcileError::SelectionUnresolvable("text node has no segments".into()));
    };
    let mut runs: Vec<(&SegmentPath, usize)> = Vec::with_capacity(paths.len());
    let mut model_text = String::new();
    for path in paths {
        let text = segment_at(model, path)
            .and_then(|segment| segment.as_text())
            .ok_or_else(|| ReconcileError::StructuralMismatch("indexed segment is gone".into()))?;
        model_text.push_str(text);
        runs.push((path, text.chars().count()));
    }
    let raw = dom
        .text(node)
        .ok_or_else(|| ReconcileError::StructuralMismatch("indexed node is no longer text".into()))?;
    let preserve = block_at(model, &first.paragraph)
        .map(Block::format)
        .is_some_and(preserves_whitespace);
    let offset = FoldedText::new(raw, preserve)
        .offset_matching(&model_text, offset)
        .ok_or_else(|| ReconcileError::StructuralMismatch("text node content changed".into()))?;
    check_ancestors(dom, root, model, &first.paragraph, node)?;

    let mut consumed = 0;
    for (path, length) in runs {
        if offset <= consumed + length {
            return Ok(BoundaryPoint::new(path.paragraph.clone(), path.index, offset - consumed));
        }
        consumed += length;
    }
    Err(ReconcileError::InvariantViolation(format!(
        "offset {offset} is past the end of the text"
    )))
}

/// A DOM text value with whitespace runs collapsed, and where every raw char
/// offset lands in the collapsed text.
struct FoldedText {
    chars: Vec<char>,
    /// One entry per raw offset, end included.
    offsets: Vec<usize>,
}

impl FoldedText {
    fn new(raw: &str, preserve: bool) -> Self {
        let mut chars = Vec::with_capacity(raw.len());
        let mut offsets = Vec::with_capacity(raw.len() + 1);
        let mut in_space = false;
        for c in raw.chars() {
            offsets.push(chars.len());
            if !preserve && is_folded_space(c) {
                if !in_space {
                    chars.push(' ');
                }
                in_space = true;
            } else {
                chars.push(c);
                in_space = false;
            }
        }
        offsets.push(chars.len());
        Self { chars, offsets }
    }

    /// Map raw `offset` into `model_text` when both say the same thing.
    ///
    /// The parser may drop one leading space at a line start and pins a
    /// trailing space as U+00A0, so those differences still match.
    fn offset_matching(&self, model_text: &str, offset: usize) -> Option<usize> {
        let model: Vec<char> = model_text.chars().map(as_plain_space).collect();
        let folded: Vec<char> = self.chars.iter().copied().map(as_plain_space).collect();
        let skipped = if folded == model {
            0
        } else if folded.first() == Some(&' ') && folded[1..] == model[..] {
            1
        } else {
            return None;
        };
        let at = self.offsets.get(offset).copied().unwrap_or(self.chars.len());
        Some(at.saturating_sub(skipped).min(model.len()))
    }
}

fn as_plain_space(c: char) -> char {
    if c == '\u{a0}' { ' ' } else { c }
}

/// The point just before the first indexed node at or under `node`.
fn point_before(
    dom: &Dom,
    root: NodeId,
    model: &ContentModelDocument,
    index: &DomIndex,
    node: NodeId,
) -> Result<Option<BoundaryPoint>, ReconcileError> {
    let mut current = node;
    loop {
        if dom.is_text(current) {
            if !index.text_nodes.contains_key(&current) {
                return Ok(None);
            }
            return locate_in_text(dom, root, model, index, current, 0).map(Some);
        }
        if let Some(path) = index.segments.get(&current) {
            check_ancestors(dom, root, model, &path.paragraph, current)?;
            return Ok(Some(BoundaryPoint::new(path.paragraph.clone(), path.index, 0)));
        }
        if let Some(paragraph) = index.paragraphs.get(&current) {
            check_ancestors(dom, root, model, paragraph, current)?;
            return Ok(Some(BoundaryPoint::new(paragraph.clone(), 0, 0)));
        }
        match dom.first_child(current) {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
}

/// The point just after the last indexed node at or under `node`.
fn point_after(
    dom: &Dom,
    root: NodeId,
    model: &ContentModelDocument,
    index: &DomIndex,
    node: NodeId,
) -> Result<Option<BoundaryPoint>, ReconcileError> {
    let mut current = node;
    loop {
        if dom.is_text(current) {
            if !index.text_nodes.contains_key(&current) {
                return Ok(None);
            }
            return locate_in_text(dom, root, model, index, current, dom.node_length(current)).map(Some);
        }
        if let Some(path) = index.segments.get(&current) {
            check_ancestors(dom, root, model, &path.paragraph, current)?;
            return Ok(Some(BoundaryPoint::new(path.paragraph.clone(), path.index + 1, 0)));
        }
        if let Some(paragraph) = index.paragraphs.get(&current) {
            check_ancestors(dom, root, model, paragraph, current)?;
            let end = block_at(model, paragraph)
                .and_then(Block::as_paragraph)
                .map_or(0, |p| p.segments.len());
            return Ok(Some(BoundaryPoint::new(paragraph.clone(), end, 0)));
        }
        match dom.last_child(current) {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }
}
