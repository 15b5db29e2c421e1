//! Tables as dense cell grids.
//!
//! Every grid slot has a cell. A slot covered by a merged cell is a
//! placeholder flagged `span_left` and/or `span_above`; it never holds content
//! of its own and defers to the origin cell up and to the left.

use serde::Serialize;
use smol_str::SmolStr;
use tapestry_dom::NodeId;

use crate::block::Block;
use crate::format::Format;
use crate::segment::Dataset;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub blocks: Vec<Block>,
    pub format: Format,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub span_left: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub span_above: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_header: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_selected: bool,
    #[serde(skip_serializing_if = "Dataset::is_empty")]
    pub dataset: Dataset,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

impl TableCell {
    pub fn new(span_left: bool, span_above: bool, is_header: bool, format: Format) -> Self {
        Self {
            span_left,
            span_above,
            is_header,
            format,
            ..Default::default()
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.span_left || self.span_above
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub format: Format,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

/// Inclusive rectangle of grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRect {
    pub first_row: usize,
    pub first_column: usize,
    pub last_row: usize,
    pub last_column: usize,
}

impl CellRect {
    /// Rectangle spanning two corners given in any order.
    pub fn from_corners(a: (usize, usize), b: (usize, usize)) -> Self {
        Self {
            first_row: a.0.min(b.0),
            first_column: a.1.min(b.1),
            last_row: a.0.max(b.0),
            last_column: a.1.max(b.1),
        }
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_column..=self.last_column).contains(&column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub rows: Vec<TableRow>,
    /// Column widths as CSS lengths, empty when unknown.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub widths: Vec<SmolStr>,
    pub format: Format,
    #[serde(skip_serializing_if = "Dataset::is_empty")]
    pub dataset: Dataset,
    #[serde(skip)]
    pub cached_element: Option<NodeId>,
}

impl Table {
    /// Table with `row_count` empty rows.
    pub fn new(row_count: usize, format: Format) -> Self {
        Self {
            rows: (0..row_count).map(|_| TableRow::default()).collect(),
            format,
            ..Default::default()
        }
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&TableCell> {
        self.rows.get(row)?.cells.get(column)
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row)?.cells.get_mut(column)
    }

    /// True when no row has any cell.
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.cells.is_empty())
    }

    /// Grid coordinates of the cell that owns slot (`row`, `column`).
    pub fn origin_of(&self, mut row: usize, mut column: usize) -> (usize, usize) {
        while column > 0 && self.cell(row, column).is_some_and(|c| c.span_left) {
            column -= 1;
        }
        while row > 0 && self.cell(row, column).is_some_and(|c| c.span_above) {
            row -= 1;
        }
        (row, column)
    }

    /// Number of columns the origin cell at (`row`, `column`) covers.
    pub fn col_span(&self, row: usize, column: usize) -> usize {
        let Some(cells) = self.rows.get(row).map(|r| &r.cells) else {
            return 1;
        };
        1 + cells
            .iter()
            .skip(column + 1)
            .take_while(|cell| cell.span_left)
            .count()
    }

    /// Number of rows the origin cell at (`row`, `column`) covers.
    pub fn row_span(&self, row: usize, column: usize) -> usize {
        1 + self
            .rows
            .iter()
            .skip(row + 1)
            .take_while(|r| r.cells.get(column).is_some_and(|cell| cell.span_above))
            .count()
    }

    /// Bounding rectangle of the selected cells.
    pub fn selected_cells(&self) -> Option<CellRect> {
        let mut rect: Option<CellRect> = None;
        for (row_index, row) in self.rows.iter().enumerate() {
            for (column_index, cell) in row.cells.iter().enumerate() {
                if !cell.is_selected {
                    continue;
                }
                rect = Some(match rect {
                    None => CellRect::from_corners((row_index, column_index), (row_index, column_index)),
                    Some(r) => CellRect {
                        first_row: r.first_row.min(row_index),
                        first_column: r.first_column.min(column_index),
                        last_row: r.last_row.max(row_index),
                        last_column: r.last_column.max(column_index),
                    },
                });
            }
        }
        rect
    }

    /// Mark exactly the cells inside `rect` as selected.
    pub fn select_cells(&mut self, rect: Option<CellRect>) {
        for (row_index, row) in self.rows.iter_mut().enumerate() {
            for (column_index, cell) in row.cells.iter_mut().enumerate() {
                cell.is_selected = rect.is_some_and(|r| r.contains(row_index, column_index));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x3 grid where (0,1) spans two columns and (0,0) spans two rows.
    fn merged() -> Table {
        let mut table = Table::new(2, Format::default());
        table.rows[0].cells = vec![
            TableCell::default(),
            TableCell::default(),
            TableCell::new(true, false, false, Format::default()),
        ];
        table.rows[1].cells = vec![
            TableCell::new(false, true, false, Format::default()),
            TableCell::default(),
            TableCell::default(),
        ];
        table
    }

    #[test]
    fn test_spans() {
        let table = merged();
        assert_eq!(table.col_span(0, 1), 2);
        assert_eq!(table.row_span(0, 0), 2);
        assert_eq!(table.row_span(0, 1), 1);
        assert_eq!(table.origin_of(0, 2), (0, 1));
        assert_eq!(table.origin_of(1, 0), (0, 0));
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_selected_cells_rect() {
        let mut table = merged();
        assert_eq!(table.selected_cells(), None);
        table.select_cells(Some(CellRect::from_corners((1, 2), (0, 1))));
        assert_eq!(
            table.selected_cells(),
            Some(CellRect {
                first_row: 0,
                first_column: 1,
                last_row: 1,
                last_column: 2,
            })
        );
        assert!(!table.rows[1].cells[0].is_selected);
    }
}
