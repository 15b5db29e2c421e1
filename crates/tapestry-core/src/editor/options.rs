//! Editor configuration.

use serde::{Deserialize, Serialize};

/// Per-editor settings, loadable from JSON.
///
/// Every field falls back to its default when missing, so a partial document
/// such as `{"cacheModel": false}` is a complete configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorOptions {
    /// Keep the model between events and move its selection in place.
    /// When off, every selection change drops the model.
    pub cache_model: bool,

    /// Remember rendered nodes on the model and reuse them on the next render.
    pub allow_cache_element: bool,

    /// Put zero-width delimiters around read-only inline entities.
    pub add_delimiter_for_entity: bool,

    /// Background of selected table cells.
    pub table_cell_selection_background_color: String,
    pub table_cell_selection_background_color_dark: String,

    /// Outline of a selected image.
    pub image_selection_border_color: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            cache_model: true,
            allow_cache_element: true,
            add_delimiter_for_entity: true,
            table_cell_selection_background_color: "#C6C6C6".to_string(),
            table_cell_selection_background_color_dark: "#666666".to_string(),
            image_selection_border_color: "#DB626C".to_string(),
        }
    }
}

impl EditorOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Facts about the host the editor runs in.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Environment {
    pub is_dark_mode: bool,
    pub is_safari: bool,
    pub is_mobile_or_tablet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = EditorOptions::from_json(r#"{"cacheModel": false}"#).unwrap();
        assert!(!options.cache_model);
        assert!(options.allow_cache_element);
        assert_eq!(options.image_selection_border_color, "#DB626C");
    }

    #[test]
    fn test_environment_from_json() {
        let env: Environment = serde_json::from_str(r#"{"isDarkMode": true}"#).unwrap();
        assert!(env.is_dark_mode);
        assert!(!env.is_safari);
    }
}
