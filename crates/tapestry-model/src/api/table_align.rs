//! Cell alignment inside a table selection.

use serde_json::{Map, Value};

use crate::block::Block;
use crate::format::TextAlign;
use crate::table::{Table, TableCell};

/// Dataset key holding per-cell editing metadata as JSON.
pub const EDITING_INFO_KEY: &str = "editingInfo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorizontalAlignOperation {
    AlignCellLeft,
    AlignCellCenter,
    AlignCellRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerticalAlignOperation {
    AlignCellTop,
    AlignCellMiddle,
    AlignCellBottom,
}

impl HorizontalAlignOperation {
    fn text_align(self, is_rtl: bool) -> TextAlign {
        match (self, is_rtl) {
            (HorizontalAlignOperation::AlignCellLeft, false)
            | (HorizontalAlignOperation::AlignCellRight, true) => TextAlign::Start,
            (HorizontalAlignOperation::AlignCellRight, false)
            | (HorizontalAlignOperation::AlignCellLeft, true) => TextAlign::End,
            (HorizontalAlignOperation::AlignCellCenter, _) => TextAlign::Center,
        }
    }
}

impl VerticalAlignOperation {
    fn css(self) -> &'static str {
        match self {
            VerticalAlignOperation::AlignCellTop => "top",
            VerticalAlignOperation::AlignCellMiddle => "middle",
            VerticalAlignOperation::AlignCellBottom => "bottom",
        }
    }
}

/// Set horizontal alignment on every cell in the selected rectangle.
///
/// Paragraph alignment inside those cells is removed so the cell value shows;
/// list items take the cell value directly.
pub fn align_table_cell_horizontally(table: &mut Table, operation: HorizontalAlignOperation) {
    align_selected_cells(table, |cell| {
        let alignment = operation.text_align(cell.format.is_rtl());
        cell.format.text_align = Some(alignment);
        for block in &mut cell.blocks {
            match block {
                Block::Paragraph(paragraph) if paragraph.format.text_align.is_some() => {
                    paragraph.format.text_align = None;
                    paragraph.cached_element = None;
                }
                Block::BlockGroup(group) if group.as_list_item().is_some() => {
                    group.format.text_align = Some(alignment);
                    group.cached_element = None;
                }
                _ => {}
            }
        }
    });
}

/// Set vertical alignment on every cell in the selected rectangle and record
/// that the cell overrides the table's own vertical alignment.
pub fn align_table_cell_vertically(table: &mut Table, operation: VerticalAlignOperation) {
    align_selected_cells(table, |cell| {
        cell.format.vertical_align = Some(operation.css().into());
        update_editing_info(cell, |info| {
            info.insert("vAlignOverride".to_string(), Value::Bool(true));
        });
    });
}

fn align_selected_cells(table: &mut Table, mut callback: impl FnMut(&mut TableCell)) {
    let Some(rect) = table.selected_cells() else {
        return;
    };
    for row in rect.first_row..=rect.last_row {
        for column in rect.first_column..=rect.last_column {
            if let Some(cell) = table.cell_mut(row, column) {
                cell.cached_element = None;
                callback(cell);
            }
        }
    }
}

/// Rewrite the JSON metadata stored in a cell's dataset.
///
/// Unparseable metadata is replaced.
pub fn update_editing_info(cell: &mut TableCell, update: impl FnOnce(&mut Map<String, Value>)) {
    let mut info = cell
        .dataset
        .get(EDITING_INFO_KEY)
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();
    update(&mut info);
    cell.dataset
        .insert(EDITING_INFO_KEY.to_string(), Value::Object(info).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Paragraph;
    use crate::format::{Direction, Format};
    use crate::table::CellRect;
    use tapestry_dom::Dom;

    fn table_2x3(dom: &mut Dom) -> Table {
        let mut table = Table::new(2, Format::default());
        table.cached_element = Some(dom.create_element("table"));
        for row in &mut table.rows {
            for _ in 0..3 {
                let mut cell = TableCell::default();
                cell.cached_element = Some(dom.create_element("td"));
                row.cells.push(cell);
            }
        }
        table
    }

    #[test]
    fn test_align_center_touches_only_selected_cells() {
        let mut dom = Dom::new();
        let mut table = table_2x3(&mut dom);
        table.select_cells(Some(CellRect::from_corners((0, 1), (1, 2))));

        align_table_cell_horizontally(&mut table, HorizontalAlignOperation::AlignCellCenter);

        assert!(table.cached_element.is_some());
        for (r, row) in table.rows.iter().enumerate() {
            for (c, cell) in row.cells.iter().enumerate() {
                if c >= 1 {
                    assert_eq!(cell.format.text_align, Some(TextAlign::Center), "{r},{c}");
                    assert_eq!(cell.cached_element, None);
                } else {
                    assert_eq!(cell.format.text_align, None);
                    assert!(cell.cached_element.is_some());
                }
            }
        }
    }

    #[test]
    fn test_align_left_in_rtl_cell_maps_to_end() {
        let mut dom = Dom::new();
        let mut table = table_2x3(&mut dom);
        table.rows[0].cells[0].format.direction = Some(Direction::Rtl);
        table.rows[0].cells[0].is_selected = true;
        table.rows[0].cells[0].blocks.push(Block::Paragraph(Paragraph::new(
            false,
            Format {
                text_align: Some(TextAlign::Center),
                ..Default::default()
            },
        )));

        align_table_cell_horizontally(&mut table, HorizontalAlignOperation::AlignCellLeft);

        let cell = &table.rows[0].cells[0];
        assert_eq!(cell.format.text_align, Some(TextAlign::End));
        assert_eq!(cell.blocks[0].format().text_align, None);
    }

    #[test]
    fn test_align_vertically_records_override() {
        let mut dom = Dom::new();
        let mut table = table_2x3(&mut dom);
        table.rows[1].cells[2].is_selected = true;
        table.rows[1].cells[2]
            .dataset
            .insert(EDITING_INFO_KEY.into(), r#"{"bgColorOverride":true}"#.into());

        align_table_cell_vertically(&mut table, VerticalAlignOperation::AlignCellBottom);

        let cell = &table.rows[1].cells[2];
        assert_eq!(cell.format.vertical_align.as_deref(), Some("bottom"));
        insta::assert_snapshot!(cell.dataset[EDITING_INFO_KEY], @r#"{"bgColorOverride":true,"vAlignOverride":true}"#);
    }
}
