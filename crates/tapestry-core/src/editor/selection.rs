//! Writing a [`DomSelection`] back to the host.
//!
//! Range selections go to the host selection. Image and table selections
//! cannot be expressed that way, so the editor keeps them itself and shows
//! them through CSS rules in [`EditorCore::editor_styles`].

use smol_str::{SmolStr, format_smolstr};
use tapestry_dom::{Dom, DomPosition, DomRange, DomSelection, NodeId};
use tapestry_model::CellRect;

use super::EditorCore;
use crate::cache::EditorEvent;
use crate::dom_to_model::{span, table_rows};
use crate::error::SelectionError;

/// Outline of the selected image or background of selected cells.
pub const DOM_SELECTION_STYLE_KEY: &str = "_DOMSelection";
/// Hides the caret while cells are selected.
pub const HIDE_CURSOR_STYLE_KEY: &str = "_DOMSelectionHideCursor";
/// Hides the native selection highlight while an image is selected.
pub const HIDE_SELECTION_STYLE_KEY: &str = "_DOMSelectionHideSelection";

const IMAGE_ID: &str = "image";
const TABLE_ID: &str = "table";
const ROOT_ID: &str = "contentDiv";

/// A cell element and the grid slots it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub element: NodeId,
    pub row: usize,
    pub column: usize,
    pub row_span: usize,
    pub col_span: usize,
}

/// Cell layout of a table element, merged cells counted once per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    pub row_count: usize,
    pub column_count: usize,
    pub cells: Vec<GridCell>,
}

impl TableGrid {
    pub fn build(dom: &Dom, table: NodeId) -> Self {
        let rows = table_rows(dom, table);
        let mut occupied: Vec<Vec<bool>> = vec![Vec::new(); rows.len()];
        let mut cells = Vec::new();

        for (row_index, row) in rows.iter().enumerate() {
            let mut column = 0;
            let elements = dom
                .children(*row)
                .iter()
                .copied()
                .filter(|cell| matches!(dom.tag(*cell), Some("td" | "th")));
            for element in elements {
                while occupied[row_index].get(column).copied().unwrap_or(false) {
                    column += 1;
                }
                let col_span = span(dom, element, "colspan");
                let row_span = span(dom, element, "rowspan").min(rows.len() - row_index);
                for slots in &mut occupied[row_index..row_index + row_span] {
                    if slots.len() < column + col_span {
                        slots.resize(column + col_span, false);
                    }
                    slots[column..column + col_span].fill(true);
                }
                cells.push(GridCell {
                    element,
                    row: row_index,
                    column,
                    row_span,
                    col_span,
                });
                column += col_span;
            }
        }

        Self {
            row_count: rows.len(),
            column_count: occupied.iter().map(Vec::len).max().unwrap_or(0),
            cells,
        }
    }
}

/// Give `element` an `id` no other node under `root` has, keeping its own
/// when that is already unique.
pub fn ensure_unique_id(dom: &mut Dom, root: NodeId, element: NodeId, prefix: &str) -> SmolStr {
    let uses = |dom: &Dom, id: &str| {
        std::iter::once(root)
            .chain(dom.descendants(root))
            .filter(|node| dom.attribute(*node, "id") == Some(id))
            .count()
    };

    if let Some(existing) = dom.attribute(element, "id").filter(|id| !id.is_empty()) {
        let existing = SmolStr::new(existing);
        if uses(dom, &existing) <= 1 {
            return existing;
        }
    }

    let mut counter = 0usize;
    let id = loop {
        let candidate = format_smolstr!("{prefix}_{counter}");
        if uses(dom, &candidate) == 0 {
            break candidate;
        }
        counter += 1;
    };
    if let Err(error) = dom.set_attribute(element, "id", id.as_str()) {
        tracing::debug!(target: "tapestry::editor", %error, "could not assign id");
    }
    id
}

/// `:nth-child` position among element siblings, 1-based.
fn element_position(dom: &Dom, node: NodeId) -> usize {
    let Some(parent) = dom.parent(node) else {
        return 1;
    };
    dom.children(parent)
        .iter()
        .filter(|sibling| dom.is_element(**sibling))
        .position(|sibling| *sibling == node)
        .map_or(1, |index| index + 1)
}

fn cell_selector(dom: &Dom, table_id: &str, table: NodeId, cell: NodeId) -> Option<String> {
    let row = dom.parent(cell)?;
    let row_parent = dom.parent(row)?;
    let group = if row_parent == table {
        String::new()
    } else {
        format!(">{}", dom.tag(row_parent)?)
    };
    Some(format!(
        "#{table_id}{group}>tr:nth-child({})>{}:nth-child({})",
        element_position(dom, row),
        dom.tag(cell)?,
        element_position(dom, cell),
    ))
}

impl EditorCore {
    /// Select `selection` in the editor, or clear the selection with `None`.
    pub fn set_dom_selection(&mut self, dom: &mut Dom, selection: Option<DomSelection>) -> Result<(), SelectionError> {
        self.is_writing = true;
        let applied = self.apply_dom_selection(dom, selection);
        dom.take_notifications();
        self.is_writing = false;
        applied?;
        self.handle_event(dom, EditorEvent::SelectionChanged);
        Ok(())
    }

    pub(super) fn apply_dom_selection(
        &mut self,
        dom: &mut Dom,
        selection: Option<DomSelection>,
    ) -> Result<(), SelectionError> {
        for key in [DOM_SELECTION_STYLE_KEY, HIDE_CURSOR_STYLE_KEY, HIDE_SELECTION_STYLE_KEY] {
            self.styles.remove(key);
        }
        self.hidden_table_rule = None;
        self.selection_override = None;

        match selection {
            None => {
                dom.clear_selection();
                Ok(())
            }
            Some(DomSelection::Range { range, is_reverted }) => {
                let inside = dom.is_connected_to(range.start.node, self.root)
                    && dom.is_connected_to(range.end.node, self.root);
                if !inside {
                    return Err(SelectionError::DetachedTarget);
                }
                dom.set_selection_range(range, is_reverted);
                Ok(())
            }
            Some(DomSelection::Image { image }) => self.select_image(dom, image),
            Some(DomSelection::Table {
                table,
                first_column,
                first_row,
                last_column,
                last_row,
            }) => self.select_table(
                dom,
                table,
                CellRect::from_corners((first_row, first_column), (last_row, last_column)),
            ),
        }
    }

    fn check_target(&self, dom: &Dom, node: NodeId, tag: &str) -> Result<(), SelectionError> {
        if !dom.is_connected_to(node, self.root) {
            return Err(SelectionError::DetachedTarget);
        }
        match dom.tag(node) {
            Some(found) if found == tag => Ok(()),
            Some(found) => Err(SelectionError::UnexpectedTarget(found.to_string())),
            None => Err(SelectionError::UnexpectedTarget("#text".to_string())),
        }
    }

    fn select_image(&mut self, dom: &mut Dom, image: NodeId) -> Result<(), SelectionError> {
        self.check_target(dom, image, "img")?;
        let id = ensure_unique_id(dom, self.root, image, IMAGE_ID);
        self.styles.insert(
            DOM_SELECTION_STYLE_KEY.into(),
            format!(
                "#{id} {{ outline-style: auto !important; outline-color: {} !important; }}",
                self.options.image_selection_border_color
            ),
        );
        self.styles.insert(
            HIDE_SELECTION_STYLE_KEY.into(),
            "*::selection { background-color: transparent !important; }".to_string(),
        );

        if let (Some(parent), Some(index)) = (dom.parent(image), dom.index_in_parent(image)) {
            let range = DomRange::new(DomPosition::new(parent, index), DomPosition::new(parent, index + 1));
            dom.set_selection_range(range, false);
        }
        self.selection_override = Some(DomSelection::Image { image });
        Ok(())
    }

    fn select_table(&mut self, dom: &mut Dom, table: NodeId, rect: CellRect) -> Result<(), SelectionError> {
        self.check_target(dom, table, "table")?;
        let grid = TableGrid::build(dom, table);
        if rect.last_row >= grid.row_count || rect.last_column >= grid.column_count {
            return Err(SelectionError::OutOfBounds {
                row: rect.last_row,
                column: rect.last_column,
            });
        }

        let table_id = ensure_unique_id(dom, self.root, table, TABLE_ID);
        let root_id = ensure_unique_id(dom, self.root, self.root, ROOT_ID);
        let whole_table = rect.first_row == 0
            && rect.first_column == 0
            && rect.last_row + 1 == grid.row_count
            && rect.last_column + 1 == grid.column_count;

        let selected: Vec<GridCell> = grid
            .cells
            .iter()
            .copied()
            .filter(|cell| rect.contains(cell.row, cell.column))
            .collect();
        let selectors = if whole_table {
            vec![format!("#{table_id}"), format!("#{table_id} *")]
        } else {
            selected
                .iter()
                .filter_map(|cell| cell_selector(dom, &table_id, table, cell.element))
                .collect()
        };

        let color = if self.environment.is_dark_mode {
            &self.options.table_cell_selection_background_color_dark
        } else {
            &self.options.table_cell_selection_background_color
        };
        if !selectors.is_empty() {
            self.styles.insert(
                DOM_SELECTION_STYLE_KEY.into(),
                format!("{} {{ background-color: {color} !important; }}", selectors.join(",")),
            );
        }
        self.styles.insert(
            HIDE_CURSOR_STYLE_KEY.into(),
            format!("#{root_id} {{ caret-color: transparent; }}"),
        );

        if let Some(first) = selected.first() {
            dom.set_selection_range(DomRange::caret(DomPosition::new(first.element, 0)), false);
        }
        self.selection_override = Some(DomSelection::Table {
            table,
            first_column: rect.first_column,
            first_row: rect.first_row,
            last_column: rect.last_column,
            last_row: rect.last_row,
        });
        tracing::trace!(target: "tapestry::editor", ?rect, whole_table, "table selection styled");
        Ok(())
    }

    /// Hide or show the table selection highlight, for features that draw
    /// their own.
    pub fn toggle_table_selection(&mut self, hiding: bool) {
        if !matches!(self.selection_override, Some(DomSelection::Table { .. })) {
            return;
        }
        if hiding {
            if let Some(rule) = self.styles.remove(DOM_SELECTION_STYLE_KEY) {
                self.hidden_table_rule = Some(rule);
            }
        } else if let Some(rule) = self.hidden_table_rule.take() {
            self.styles.insert(DOM_SELECTION_STYLE_KEY.into(), rule);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{EditorOptions, Environment};

    fn editor(html: &str) -> (Dom, EditorCore) {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        dom.set_inner_html(root, html).unwrap();
        (dom, EditorCore::new(root, EditorOptions::default(), Environment::default()))
    }

    fn table_selection(table: NodeId, first: (usize, usize), last: (usize, usize)) -> DomSelection {
        DomSelection::Table {
            table,
            first_row: first.0,
            first_column: first.1,
            last_row: last.0,
            last_column: last.1,
        }
    }

    #[test]
    fn test_grid_counts_merged_slots() {
        let (dom, editor) = editor(
            "<table><tbody><tr><td colspan=\"2\">a</td><td rowspan=\"2\">b</td></tr><tr><td>c</td><td>d</td></tr></tbody></table>",
        );
        let table = dom.first_child(editor.root()).unwrap();
        let grid = TableGrid::build(&dom, table);
        assert_eq!(grid.row_count, 2);
        assert_eq!(grid.column_count, 3);
        let origins: Vec<(usize, usize)> = grid.cells.iter().map(|cell| (cell.row, cell.column)).collect();
        assert_eq!(origins, vec![(0, 0), (0, 2), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_unique_id_keeps_existing() {
        let (mut dom, editor) = editor("<img id=\"pic\"><img id=\"pic\"><img>");
        let images = dom.children(editor.root()).to_vec();
        assert_eq!(ensure_unique_id(&mut dom, editor.root(), images[2], "image"), "image_0");
        assert_eq!(ensure_unique_id(&mut dom, editor.root(), images[0], "image"), "image_1");
        assert_eq!(ensure_unique_id(&mut dom, editor.root(), images[1], "image"), "pic");
    }

    #[test]
    fn test_image_selection_style() {
        let (mut dom, mut editor) = editor("<div>a<img src=\"x.png\">b</div>");
        let paragraph = dom.first_child(editor.root()).unwrap();
        let image = dom.child_at(paragraph, 1).unwrap();
        editor
            .set_dom_selection(&mut dom, Some(DomSelection::Image { image }))
            .unwrap();

        insta::assert_snapshot!(
            editor.editor_style(DOM_SELECTION_STYLE_KEY).unwrap(),
            @"#image_0 { outline-style: auto !important; outline-color: #DB626C !important; }"
        );
        assert!(editor.editor_style(HIDE_SELECTION_STYLE_KEY).is_some());
        assert_eq!(editor.get_dom_selection(&dom), Some(DomSelection::Image { image }));
        let host = dom.selection().unwrap();
        assert_eq!(host.range.start, DomPosition::new(paragraph, 1));
        assert_eq!(host.range.end, DomPosition::new(paragraph, 2));
    }

    #[test]
    fn test_table_selection_selectors() {
        let (mut dom, mut editor) = editor(
            "<table><tbody><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></tbody></table>",
        );
        let table = dom.first_child(editor.root()).unwrap();
        editor
            .set_dom_selection(&mut dom, Some(table_selection(table, (1, 1), (0, 0))))
            .unwrap();
        insta::assert_snapshot!(
            editor.editor_style(DOM_SELECTION_STYLE_KEY).unwrap(),
            @"#table_0,#table_0 * { background-color: #C6C6C6 !important; }"
        );
        insta::assert_snapshot!(
            editor.editor_style(HIDE_CURSOR_STYLE_KEY).unwrap(),
            @"#contentDiv_0 { caret-color: transparent; }"
        );

        editor
            .set_dom_selection(&mut dom, Some(table_selection(table, (0, 1), (1, 1))))
            .unwrap();
        insta::assert_snapshot!(
            editor.editor_style(DOM_SELECTION_STYLE_KEY).unwrap(),
            @"#table_0>tbody>tr:nth-child(1)>td:nth-child(2),#table_0>tbody>tr:nth-child(2)>td:nth-child(2) { background-color: #C6C6C6 !important; }"
        );
    }

    #[test]
    fn test_table_selection_out_of_bounds() {
        let (mut dom, mut editor) = editor("<table><tr><td>a</td></tr></table>");
        let table = dom.first_child(editor.root()).unwrap();
        let error = editor
            .set_dom_selection(&mut dom, Some(table_selection(table, (0, 0), (0, 3))))
            .unwrap_err();
        assert_eq!(error, SelectionError::OutOfBounds { row: 0, column: 3 });
        assert!(editor.editor_styles().is_empty());
    }

    #[test]
    fn test_wrong_target() {
        let (mut dom, mut editor) = editor("<div>a</div>");
        let div = dom.first_child(editor.root()).unwrap();
        assert_eq!(
            editor.set_dom_selection(&mut dom, Some(DomSelection::Image { image: div })),
            Err(SelectionError::UnexpectedTarget("div".to_string()))
        );
    }

    #[test]
    fn test_toggle_table_selection() {
        let (mut dom, mut editor) = editor("<table><tr><td>a</td><td>b</td></tr></table>");
        let table = dom.first_child(editor.root()).unwrap();
        editor
            .set_dom_selection(&mut dom, Some(table_selection(table, (0, 0), (0, 0))))
            .unwrap();
        let rule = editor.editor_style(DOM_SELECTION_STYLE_KEY).map(str::to_owned);
        assert!(rule.is_some());

        editor.toggle_table_selection(true);
        assert_eq!(editor.editor_style(DOM_SELECTION_STYLE_KEY), None);
        editor.toggle_table_selection(false);
        assert_eq!(editor.editor_style(DOM_SELECTION_STYLE_KEY).map(str::to_owned), rule);
    }
}
