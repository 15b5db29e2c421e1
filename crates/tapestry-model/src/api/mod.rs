//! Model-level editing operations.
//!
//! These work on a model the caller already holds. Reading the model from the
//! editor and writing it back is the caller's job.

pub mod image_border;
pub mod link_selection;
pub mod table_align;
pub mod table_content;
pub mod text;
pub mod trim;
pub mod xss;

pub use image_border::{Border, apply_image_border_format, set_image_border};
pub use link_selection::{LinkSelection, adjust_link_selection};
pub use table_align::{
    HorizontalAlignOperation, VerticalAlignOperation, align_table_cell_horizontally,
    align_table_cell_vertically, update_editing_info,
};
pub use table_content::{get_selected_content_for_table, insert_table_content};
pub use text::content_model_to_text;
pub use trim::trim_model_for_selection;
pub use xss::check_xss;
