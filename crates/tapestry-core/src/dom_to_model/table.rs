//! Table markup into a dense cell grid.

use smol_str::SmolStr;
use tapestry_dom::{Dom, DomSelection, NodeId};
use tapestry_model::{Block, CellRect, Format, Table, TableCell, TableRow};

use super::context::DomToModelContext;
use super::processors::{dataset, process_children, with_segment_format};
use crate::format::FormatCategory;

/// `tr` elements of a table, looking through row groups.
pub(crate) fn table_rows(dom: &Dom, table: NodeId) -> Vec<NodeId> {
    let mut rows = Vec::new();
    for child in dom.children(table) {
        match dom.tag(*child) {
            Some("tr") => rows.push(*child),
            Some("thead" | "tbody" | "tfoot") => rows.extend(
                dom.children(*child)
                    .iter()
                    .copied()
                    .filter(|row| dom.is_tag(*row, "tr")),
            ),
            _ => {}
        }
    }
    rows
}

pub(crate) fn span(dom: &Dom, cell: NodeId, name: &str) -> usize {
    dom.attribute(cell, name)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, max_span(name))
}

/// Largest span a browser honors for each attribute.
fn max_span(name: &str) -> usize {
    match name {
        "rowspan" => 65534,
        _ => 1000,
    }
}

/// Widths declared by `col` elements, directly or inside `colgroup`.
fn column_widths(dom: &Dom, table: NodeId) -> Vec<SmolStr> {
    let mut widths = Vec::new();
    for child in dom.children(table) {
        let cols: Vec<NodeId> = match dom.tag(*child) {
            Some("col") => vec![*child],
            Some("colgroup") => dom.children(*child).to_vec(),
            _ => continue,
        };
        for col in cols {
            let width = dom
                .style_property(col, "width")
                .or_else(|| dom.attribute(col, "width").map(str::to_owned));
            if let Some(width) = width {
                let repeat = span(dom, col, "span");
                widths.extend(std::iter::repeat_n(SmolStr::new(width.trim()), repeat));
            }
        }
    }
    widths
}

/// `table`: a grid where merged cells leave `span_left`/`span_above`
/// placeholders in every slot they cover. List threads do not run through
/// tables.
pub fn table_processor(group: &mut Vec<Block>, dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) {
    let saved_list = std::mem::take(&mut context.list);
    let mut format = context.parse_new(FormatCategory::Table, dom, element);
    context.parse(FormatCategory::TableBorder, &mut format, dom, element);

    let rows = table_rows(dom, element);
    let mut grid: Vec<Vec<Option<TableCell>>> = vec![Vec::new(); rows.len()];
    let mut table = Table::new(rows.len(), format);
    table.dataset = dataset(dom, element);
    table.cached_element = context.cache(element);

    for (row_index, row) in rows.iter().enumerate() {
        table.rows[row_index] = TableRow {
            cells: Vec::new(),
            format: context.parse_new(FormatCategory::TableRow, dom, *row),
            cached_element: context.cache(*row),
        };
        let cells: Vec<NodeId> = dom
            .children(*row)
            .iter()
            .copied()
            .filter(|cell| matches!(dom.tag(*cell), Some("td" | "th")))
            .collect();
        let mut column = 0;
        for cell_element in cells {
            while grid[row_index].get(column).is_some_and(Option::is_some) {
                column += 1;
            }
            let col_span = span(dom, cell_element, "colspan");
            let row_span = span(dom, cell_element, "rowspan").min(rows.len() - row_index);
            let cell = parse_cell(dom, cell_element, context);
            let placeholder_format = cell.format.clone();
            let is_header = cell.is_header;

            let mut origin = Some(cell);
            for dr in 0..row_span {
                for dc in 0..col_span {
                    let slot = origin.take().unwrap_or_else(|| {
                        TableCell::new(dc > 0, dr > 0, is_header, placeholder_format.clone())
                    });
                    let target = &mut grid[row_index + dr];
                    if target.len() <= column + dc {
                        target.resize_with(column + dc + 1, || None);
                    }
                    target[column + dc] = Some(slot);
                }
            }
            column += col_span;
        }
    }

    let column_count = grid.iter().map(Vec::len).max().unwrap_or(0);
    for (row_index, cells) in grid.into_iter().enumerate() {
        table.rows[row_index].cells = cells
            .into_iter()
            .chain(std::iter::repeat_with(|| None))
            .take(column_count)
            .map(|cell| cell.unwrap_or_else(|| TableCell::new(false, false, false, Format::default())))
            .collect();
    }

    table.widths = column_widths(dom, element);
    if table.widths.is_empty() {
        if let Some(first) = table.rows.first() {
            let widths: Option<Vec<SmolStr>> = first.cells.iter().map(|cell| cell.format.width.clone()).collect();
            table.widths = widths.unwrap_or_default();
        }
    }

    if let Some(DomSelection::Table {
        table: selected,
        first_column,
        first_row,
        last_column,
        last_row,
    }) = context.selection.hint
    {
        if selected == element {
            let rect = CellRect::from_corners((first_row, first_column), (last_row, last_column));
            if rect.last_row < table.rows.len() && rect.last_column < column_count {
                table.select_cells(Some(rect));
            } else {
                tracing::debug!(target: "tapestry::dom_to_model", ?rect, "table selection outside the grid");
            }
        }
    }

    context.list = saved_list;
    group.push(Block::Table(table));
    context.block_closed = true;
}

fn parse_cell(dom: &mut Dom, element: NodeId, context: &mut DomToModelContext) -> TableCell {
    let mut format = context.parse_new(FormatCategory::TableCell, dom, element);
    context.parse(FormatCategory::TableCellBorder, &mut format, dom, element);
    let is_header = dom.is_tag(element, "th");
    let mut cell = TableCell::new(false, false, is_header, format);
    cell.dataset = dataset(dom, element);
    cell.cached_element = context.cache(element);

    let mut segment_format = context.segment_format.clone();
    context.parse(FormatCategory::SegmentOnTableCell, &mut segment_format, dom, element);
    let saved_block = std::mem::take(&mut context.block_format);
    context.block_closed = false;
    with_segment_format(context, segment_format, |context| {
        process_children(&mut cell.blocks, dom, element, context)
    });
    context.block_format = saved_block;
    context.block_closed = true;
    cell
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Table {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, html).unwrap();
        let table = dom.first_child(root).unwrap();
        let mut context = DomToModelContext::with_defaults();
        let mut group = Vec::new();
        table_processor(&mut group, &mut dom, table, &mut context);
        match group.pop() {
            Some(Block::Table(table)) => table,
            other => panic!("expected a table, got {other:?}"),
        }
    }

    fn spans(table: &Table) -> Vec<String> {
        table
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|cell| match (cell.span_left, cell.span_above) {
                        (false, false) => 'o',
                        (true, false) => '<',
                        (false, true) => '^',
                        (true, true) => '+',
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_merged_cells_leave_placeholders() {
        let table = parse(
            "<table><tbody>\
             <tr><td rowspan=\"2\">a</td><td colspan=\"2\">b</td></tr>\
             <tr><td>c</td><td>d</td></tr>\
             </tbody></table>",
        );
        assert_eq!(spans(&table), vec!["oo<".to_string(), "^oo".to_string()]);
        assert!(table.cell(0, 1).unwrap().blocks.len() == 1);
        assert!(table.cell(0, 2).unwrap().blocks.is_empty());
    }

    #[test]
    fn test_rowspan_clamped_and_ragged_rows_filled() {
        let table = parse("<table><tr><td rowspan=\"5\">a</td><td>b</td></tr><tr><td>c</td></tr><tr></tr></table>");
        assert_eq!(table.rows.len(), 3);
        assert_eq!(spans(&table), vec!["oo", "^o", "^o"]);
    }

    #[test]
    fn test_huge_spans_are_bounded() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, r#"<table><tr><td colspan="1000000000" rowspan="99999999">a</td></tr></table>"#)
            .unwrap();
        let cell = dom.first_child(dom.first_child(dom.first_child(dom.first_child(root).unwrap()).unwrap()).unwrap()).unwrap();
        assert_eq!(span(&dom, cell, "colspan"), 1000);
        assert_eq!(span(&dom, cell, "rowspan"), 65534);

        let table = parse(r#"<table><tr><td colspan="1000000000">a</td></tr></table>"#);
        assert_eq!(table.rows[0].cells.len(), 1000);
    }

    #[test]
    fn test_widths_from_first_row() {
        let table = parse(r#"<table><tr><td style="width: 40px">a</td><td style="width: 60px">b</td></tr></table>"#);
        assert_eq!(table.widths, vec![SmolStr::new("40px"), SmolStr::new("60px")]);
    }
}
