//! Model editing APIs driven through document paths, as the command layer
//! uses them.

use tapestry_dom::{Dom, DomPosition, DomRange, DomSelection};
use tapestry_model::api::{
    HorizontalAlignOperation, align_table_cell_horizontally, check_xss, content_model_to_text,
    get_selected_content_for_table, trim_model_for_selection,
};
use tapestry_model::path::mutate_block;
use tapestry_model::selection::{select_range, select_table_cells};
use tapestry_model::{
    Block, BoundaryPoint, CellRect, ContentModelDocument, Format, Paragraph, PathStep, Segment, Table, TableCell,
    TableRow, TextAlign,
};

fn paragraph(text: &str) -> Block {
    Block::Paragraph(Paragraph::new(true, Format::default()).with_segments(vec![Segment::text(text, Format::default())]))
}

/// A 2x3 table whose cells hold `r{row}c{column}` and pretend to be rendered.
fn rendered_table(dom: &mut Dom) -> Table {
    let mut table = Table::new(0, Format::default());
    table.cached_element = Some(dom.create_element("table"));
    for row in 0..2 {
        let mut cells = Vec::new();
        for column in 0..3 {
            let mut cell = TableCell::new(false, false, false, Format::default());
            cell.blocks.push(paragraph(&format!("r{row}c{column}")));
            cell.cached_element = Some(dom.create_element("td"));
            cells.push(cell);
        }
        table.rows.push(TableRow {
            cells,
            cached_element: Some(dom.create_element("tr")),
            ..Default::default()
        });
    }
    table
}

#[test]
fn center_alignment_touches_exactly_the_selected_cells() {
    let mut dom = Dom::new();
    let mut model = ContentModelDocument::with_blocks(vec![paragraph("before"), Block::Table(rendered_table(&mut dom))]);
    let path = vec![PathStep::Block(1)];
    assert!(select_table_cells(&mut model, &path, CellRect::from_corners((1, 2), (0, 1))));

    let table = mutate_block(&mut model, &path).and_then(Block::as_table_mut).unwrap();
    align_table_cell_horizontally(table, HorizontalAlignOperation::AlignCellCenter);

    let table = model.blocks[1].as_table().unwrap();
    assert!(table.cached_element.is_some());
    let centered: Vec<(usize, usize)> = table
        .rows
        .iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.format.text_align == Some(TextAlign::Center))
                .map(move |(c, _)| (r, c))
        })
        .collect();
    assert_eq!(centered, vec![(0, 1), (0, 2), (1, 1), (1, 2)]);
    for (r, c) in centered {
        assert_eq!(table.rows[r].cells[c].cached_element, None);
    }
    assert!(table.rows[0].cells[0].cached_element.is_some());
    assert!(table.rows[1].cells[0].cached_element.is_some());
}

#[test]
fn selected_table_content_comes_out_as_rows() {
    let mut dom = Dom::new();
    let table_node = dom.create_element("table");
    let mut model = ContentModelDocument::with_blocks(vec![Block::Table(rendered_table(&mut dom))]);
    select_table_cells(&mut model, &[PathStep::Block(0)], CellRect::from_corners((0, 1), (1, 1)));

    let selection = DomSelection::Table {
        table: table_node,
        first_column: 1,
        first_row: 0,
        last_column: 1,
        last_row: 1,
    };
    let rows = get_selected_content_for_table(model.clone(), &selection);
    let texts: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().filter_map(Block::as_paragraph).map(Paragraph::text).collect())
        .collect();
    assert_eq!(texts, vec![vec!["r0c1".to_string()], vec!["r1c1".to_string()]]);

    trim_model_for_selection(&mut model, &selection);
    assert_eq!(content_model_to_text(&model, &dom), "r0c1\r\nr1c1");
}

#[test]
fn range_text_spans_paragraphs() {
    let mut dom = Dom::new();
    let mut model = ContentModelDocument::with_blocks(vec![paragraph("first line"), paragraph("second line")]);
    let start = BoundaryPoint::new(vec![PathStep::Block(0)], 0, 6);
    let end = BoundaryPoint::new(vec![PathStep::Block(1)], 0, 6);
    assert!(select_range(&mut model, &start, &end, false));

    let anchor = dom.create_text("x");
    let range = DomSelection::range(DomRange::new(DomPosition::new(anchor, 0), DomPosition::new(anchor, 1)));
    trim_model_for_selection(&mut model, &range);
    assert_eq!(content_model_to_text(&model, &dom), "line\r\nsecond");
}

#[test]
fn script_links_are_dropped() {
    assert_eq!(check_xss("s\nc\nr\ni\np\nt:https://example.com"), "");
    assert_eq!(check_xss("VBScript:msgbox"), "");
    assert_eq!(check_xss("https://example.com/script:.js"), "https://example.com/script:.js");
    assert_eq!(check_xss("mailto:someone@example.com"), "mailto:someone@example.com");
}
