//! Reducing a model to its selection.

use tapestry_dom::DomSelection;

use crate::block::Block;
use crate::document::ContentModelDocument;
use crate::table::Table;

/// Remove every unselected part of `model`.
///
/// For a table selection the selected table is also cut down to the selected
/// rectangle, with spans that reached in from outside dropped.
pub fn trim_model_for_selection(model: &mut ContentModelDocument, selection: &DomSelection) {
    prune_unselected(&mut model.blocks);

    if matches!(selection, DomSelection::Table { .. }) {
        for block in &mut model.blocks {
            if let Block::Table(table) = block {
                if table.selected_cells().is_some() {
                    reduce_to_selection(table);
                    break;
                }
            }
        }
    }
}

/// Returns true when anything survived.
fn prune_unselected(blocks: &mut Vec<Block>) -> bool {
    blocks.retain_mut(|block| match block {
        Block::Paragraph(paragraph) => {
            paragraph.segments.retain(|s| s.is_selected && !s.is_marker());
            !paragraph.segments.is_empty()
        }
        Block::Table(table) => {
            if table.selected_cells().is_some() {
                return true;
            }
            let mut any = false;
            for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                any |= prune_unselected(&mut cell.blocks);
            }
            any
        }
        Block::Divider(divider) => divider.is_selected,
        Block::Entity(entity) => entity.is_selected,
        Block::BlockGroup(group) => prune_unselected(&mut group.blocks),
    });
    !blocks.is_empty()
}

fn reduce_to_selection(table: &mut Table) {
    let Some(rect) = table.selected_cells() else {
        return;
    };
    table.rows.truncate(rect.last_row + 1);
    table.rows.drain(..rect.first_row);
    for (row_index, row) in table.rows.iter_mut().enumerate() {
        row.cells.truncate(rect.last_column + 1);
        row.cells.drain(..rect.first_column.min(row.cells.len()));
        for (column_index, cell) in row.cells.iter_mut().enumerate() {
            if row_index == 0 {
                cell.span_above = false;
            }
            if column_index == 0 {
                cell.span_left = false;
            }
        }
    }
    if table.widths.len() > rect.first_column {
        table.widths.truncate(rect.last_column + 1);
        table.widths.drain(..rect.first_column);
    }
    table.cached_element = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Paragraph;
    use crate::format::Format;
    use crate::segment::Segment;
    use crate::table::{CellRect, TableCell};
    use tapestry_dom::{Dom, DomPosition, DomRange};

    fn text(text: &str, selected: bool) -> Segment {
        let mut segment = Segment::text(text, Format::default());
        segment.is_selected = selected;
        segment
    }

    #[test]
    fn test_range_keeps_selected_segments() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        let mut model = ContentModelDocument::with_blocks(vec![
            Block::Paragraph(Paragraph::new(false, Format::default()).with_segments(vec![text("a", false)])),
            Block::Paragraph(
                Paragraph::new(false, Format::default())
                    .with_segments(vec![text("b", false), text("c", true)]),
            ),
        ]);
        let selection = DomSelection::range(DomRange::caret(DomPosition::new(root, 0)));
        trim_model_for_selection(&mut model, &selection);
        assert_eq!(model.blocks.len(), 1);
        assert_eq!(model.blocks[0].as_paragraph().unwrap().text(), "c");
    }

    #[test]
    fn test_table_reduced_to_rectangle() {
        let mut dom = Dom::new();
        let node = dom.create_element("table");
        let mut table = Table::new(3, Format::default());
        for row in &mut table.rows {
            row.cells = (0..3).map(|_| TableCell::default()).collect();
        }
        table.rows[1].cells[2] = TableCell::new(true, false, false, Format::default());
        table.widths = vec!["10px".into(), "20px".into(), "30px".into()];
        table.select_cells(Some(CellRect::from_corners((1, 2), (2, 2))));
        let mut model = ContentModelDocument::with_blocks(vec![Block::Table(table)]);

        let selection = DomSelection::Table {
            table: node,
            first_column: 2,
            first_row: 1,
            last_column: 2,
            last_row: 2,
        };
        trim_model_for_selection(&mut model, &selection);

        let table = model.blocks[0].as_table().unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows.iter().all(|row| row.cells.len() == 1));
        assert!(!table.rows[0].cells[0].span_left);
        assert_eq!(table.widths, vec!["30px"]);
    }
}
