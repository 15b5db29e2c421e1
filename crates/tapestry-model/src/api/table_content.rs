//! Moving selected content into and out of table cells.

use tapestry_dom::DomSelection;

use crate::api::trim::trim_model_for_selection;
use crate::block::Block;
use crate::document::ContentModelDocument;
use crate::format::Format;
use crate::table::{Table, TableCell, TableRow};

/// Rows of blocks covered by `selection`.
///
/// `model` should be a disconnected copy; it is trimmed in place. Selected
/// tables contribute one row per table row, skipping merged placeholders.
/// Every other block becomes a row of its own. A collapsed range yields
/// nothing.
pub fn get_selected_content_for_table(
    mut model: ContentModelDocument,
    selection: &DomSelection,
) -> Vec<Vec<Block>> {
    if selection.is_collapsed_range() {
        return Vec::new();
    }
    trim_model_for_selection(&mut model, selection);

    let mut rows = Vec::new();
    for block in model.blocks {
        match block {
            Block::Table(table) => {
                for row in table.rows {
                    let blocks: Vec<Block> = row
                        .cells
                        .into_iter()
                        .filter(|cell| !cell.is_placeholder())
                        .flat_map(|cell| cell.blocks)
                        .collect();
                    if !blocks.is_empty() {
                        rows.push(blocks);
                    }
                }
            }
            other => rows.push(vec![other]),
        }
    }
    rows
}

/// Write `content` into `table`, one block per cell from the top left.
///
/// Missing rows are appended with `column_count` cells of `cell_format`.
/// Blocks past the end of a row are dropped.
pub fn insert_table_content(
    table: &mut Table,
    content: Vec<Vec<Block>>,
    column_count: usize,
    cell_format: Option<&Format>,
) {
    for (row_index, row_blocks) in content.into_iter().enumerate() {
        if table.rows.len() <= row_index {
            table.rows.push(TableRow {
                cells: (0..column_count)
                    .map(|_| TableCell::new(false, false, false, cell_format.cloned().unwrap_or_default()))
                    .collect(),
                ..Default::default()
            });
        }
        let row = &mut table.rows[row_index];
        row.cached_element = None;
        for (cell, block) in row.cells.iter_mut().zip(row_blocks) {
            cell.blocks = vec![block];
            cell.cached_element = None;
        }
    }
    table.cached_element = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Paragraph;
    use crate::segment::Segment;
    use tapestry_dom::{Dom, DomPosition, DomRange};

    fn para(text: &str) -> Block {
        let mut segment = Segment::text(text, Format::default());
        segment.is_selected = true;
        Block::Paragraph(Paragraph::new(false, Format::default()).with_segments(vec![segment]))
    }

    #[test]
    fn test_paragraphs_become_rows() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        let text = dom.create_text("ab");
        dom.append_child(root, text).unwrap();
        let model = ContentModelDocument::with_blocks(vec![para("a"), para("b")]);
        let selection = DomSelection::range(DomRange::new(
            DomPosition::new(text, 0),
            DomPosition::new(text, 2),
        ));
        let rows = get_selected_content_for_table(model, &selection);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0].as_paragraph().unwrap().text(), "b");
    }

    #[test]
    fn test_insert_grows_rows() {
        let mut table = Table::new(1, Format::default());
        table.rows[0].cells = vec![TableCell::default(), TableCell::default()];
        let format = Format {
            background_color: Some("#ffffff".into()),
            ..Default::default()
        };
        insert_table_content(
            &mut table,
            vec![vec![para("a"), para("b"), para("c")], vec![para("d")]],
            2,
            Some(&format),
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.rows[1].cells[0].blocks[0].as_paragraph().unwrap().text(), "d");
        assert_eq!(table.rows[1].cells[1].format, format);
        assert!(table.rows[1].cells[1].blocks.is_empty());
    }
}
