//! Tables back into `table > tbody > tr > td` markup.

use tapestry_dom::{Dom, NodeId};
use tapestry_model::{Format, Table};

use super::block::{insert, reuse_cached_element};
use super::context::ModelToDomContext;
use super::segment::set_dataset;
use crate::format::{FormatCategory, implicit_format};

fn set_span(dom: &mut Dom, cell: NodeId, name: &str, span: usize) {
    let result = if span > 1 {
        dom.set_attribute(cell, name, span.to_string())
    } else {
        dom.remove_attribute(cell, name).map(|_| ())
    };
    if let Err(error) = result {
        tracing::debug!(target: "tapestry::model_to_dom", %error, name, "span write failed");
    }
}

/// Rows are rebuilt under one `tbody` each render; cached rows and cells are
/// moved in rather than recreated.
pub fn handle_table(
    dom: &mut Dom,
    table: &mut Table,
    parent: NodeId,
    reference: Option<NodeId>,
    context: &mut ModelToDomContext,
) -> Option<NodeId> {
    if table.is_empty() {
        table.cached_element = None;
        return reference;
    }

    let cached = context
        .cached(dom, table.cached_element)
        .filter(|element| dom.is_tag(*element, "table"));
    let (element, next) = match cached {
        Some(element) => {
            context.stats.reused += 1;
            (element, reuse_cached_element(dom, parent, element, reference))
        }
        None => {
            let element = dom.create_element("table");
            insert(dom, parent, element, reference);
            context.apply(FormatCategory::Table, &table.format, dom, element, &Format::default());
            context.apply(FormatCategory::TableBorder, &table.format, dom, element, &Format::default());
            set_dataset(dom, element, &table.dataset);
            context.node_created(dom, element);
            (element, reference)
        }
    };
    table.cached_element = context.allow_cache_element.then_some(element);

    let previous = dom.take_children(element);
    let tbody = match previous.iter().copied().find(|node| dom.is_tag(*node, "tbody")) {
        Some(tbody) => {
            dom.take_children(tbody);
            tbody
        }
        None => dom.create_element("tbody"),
    };
    insert(dom, element, tbody, None);

    let spans: Vec<Vec<(usize, usize)>> = (0..table.rows.len())
        .map(|row| {
            (0..table.rows[row].cells.len())
                .map(|column| (table.col_span(row, column), table.row_span(row, column)))
                .collect()
        })
        .collect();
    let widths = table.widths.clone();

    for (row_index, row) in table.rows.iter_mut().enumerate() {
        let cached_row = context
            .cached(dom, row.cached_element)
            .filter(|tr| dom.is_tag(*tr, "tr"));
        let tr = match cached_row {
            Some(tr) => {
                dom.take_children(tr);
                context.stats.reused += 1;
                tr
            }
            None => {
                let tr = dom.create_element("tr");
                context.apply(FormatCategory::TableRow, &row.format, dom, tr, &Format::default());
                context.node_created(dom, tr);
                tr
            }
        };
        insert(dom, tbody, tr, None);
        row.cached_element = context.allow_cache_element.then_some(tr);

        for (column, cell) in row.cells.iter_mut().enumerate() {
            if cell.is_placeholder() {
                continue;
            }
            let tag = if cell.is_header { "th" } else { "td" };
            let cached_cell = context
                .cached(dom, cell.cached_element)
                .filter(|td| dom.is_tag(*td, tag));
            let td = match cached_cell {
                Some(td) => {
                    context.stats.reused += 1;
                    td
                }
                None => {
                    let td = dom.create_element(tag);
                    let mut format = cell.format.clone();
                    if row_index == 0 && format.width.is_none() {
                        format.width = widths.get(column).cloned();
                    }
                    context.apply(FormatCategory::TableCell, &format, dom, td, &Format::default());
                    context.apply(FormatCategory::TableCellBorder, &format, dom, td, &Format::default());
                    set_dataset(dom, td, &cell.dataset);
                    context.node_created(dom, td);
                    td
                }
            };
            insert(dom, tr, td, None);
            let (col_span, row_span) = spans[row_index][column];
            set_span(dom, td, "colspan", col_span);
            set_span(dom, td, "rowspan", row_span);
            cell.cached_element = context.allow_cache_element.then_some(td);

            let implicit = if cell.is_header {
                implicit_format("th")
            } else {
                Format::default()
            };
            let saved = std::mem::replace(&mut context.implicit_segment_format, implicit);
            let handler = context.handlers.block_group_children;
            handler(dom, &mut cell.blocks, td, context);
            context.implicit_segment_format = saved;
        }
    }

    if let Some(rect) = table.selected_cells() {
        context.selection.table = Some((element, rect));
    }
    next
}

#[cfg(test)]
mod tests {
    use tapestry_model::{Block, Paragraph, Segment, TableCell, TableRow};

    use super::*;

    fn cell(text: &str) -> TableCell {
        let mut cell = TableCell::new(false, false, false, Format::default());
        cell.blocks.push(Block::Paragraph(
            Paragraph::new(true, Format::default()).with_segments(vec![Segment::text(text, Format::default())]),
        ));
        cell
    }

    #[test]
    fn test_merged_cells_render_spans() {
        let mut table = Table::new(2, Format::default());
        table.rows[0] = TableRow {
            cells: vec![cell("a"), TableCell::new(true, false, false, Format::default())],
            ..Default::default()
        };
        table.rows[1] = TableRow {
            cells: vec![cell("b"), cell("c")],
            ..Default::default()
        };
        let mut dom = Dom::new();
        let parent = dom.create_element("div");
        let mut context = ModelToDomContext::with_defaults();
        handle_table(&mut dom, &mut table, parent, None, &mut context);

        insta::assert_snapshot!(
            dom.inner_html(parent),
            @r#"<table><tbody><tr><td colspan="2">a</td></tr><tr><td>b</td><td>c</td></tr></tbody></table>"#
        );
    }

    #[test]
    fn test_empty_table_renders_nothing() {
        let mut table = Table::new(0, Format::default());
        let mut dom = Dom::new();
        let parent = dom.create_element("div");
        let mut context = ModelToDomContext::with_defaults();
        assert_eq!(handle_table(&mut dom, &mut table, parent, None, &mut context), None);
        assert_eq!(dom.child_count(parent), 0);
    }
}
