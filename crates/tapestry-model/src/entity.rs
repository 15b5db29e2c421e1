//! Opaque embedded content.

use serde::Serialize;
use smol_str::{SmolStr, format_smolstr};
use tapestry_dom::NodeId;

use crate::format::Format;

/// Class marking an entity wrapper.
pub const ENTITY_CLASS: &str = "_Entity";
const ENTITY_TYPE_PREFIX: &str = "_EType_";
const ENTITY_ID_PREFIX: &str = "_EId_";
const ENTITY_READONLY_PREFIX: &str = "_EReadonly_";

/// Identity of an entity, encoded in the wrapper's class list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SmolStr>,
    pub is_readonly: bool,
    /// Wrapper had no `_Entity` class but was treated as one.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_fake_entity: bool,
}

impl EntityInfo {
    /// Parse from class names. `None` when `_Entity` is absent.
    pub fn from_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let mut info = EntityInfo::default();
        let mut is_entity = false;
        for class in classes {
            if class == ENTITY_CLASS {
                is_entity = true;
            } else if let Some(entity_type) = class.strip_prefix(ENTITY_TYPE_PREFIX) {
                info.entity_type = Some(SmolStr::new(entity_type));
            } else if let Some(id) = class.strip_prefix(ENTITY_ID_PREFIX) {
                info.id = Some(SmolStr::new(id));
            } else if let Some(flag) = class.strip_prefix(ENTITY_READONLY_PREFIX) {
                info.is_readonly = flag == "1";
            }
        }
        is_entity.then_some(info)
    }

    /// Class list for the wrapper.
    pub fn to_classes(&self) -> Vec<SmolStr> {
        let mut classes = vec![SmolStr::new_static(ENTITY_CLASS)];
        if let Some(entity_type) = &self.entity_type {
            classes.push(format_smolstr!("{}{}", ENTITY_TYPE_PREFIX, entity_type));
        }
        if let Some(id) = &self.id {
            classes.push(format_smolstr!("{}{}", ENTITY_ID_PREFIX, id));
        }
        classes.push(format_smolstr!(
            "{}{}",
            ENTITY_READONLY_PREFIX,
            if self.is_readonly { 1 } else { 0 }
        ));
        classes
    }
}

/// Read-only embedded content, owned by the host through its wrapper element.
///
/// The wrapper is the live element itself, not a cache: rendering moves it
/// into place instead of recreating it. `is_selected` is used when the entity
/// is a block; segment entities use the segment flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(skip)]
    pub wrapper: NodeId,
    pub info: EntityInfo,
    pub format: Format,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_selected: bool,
}

impl Entity {
    pub fn new(wrapper: NodeId, info: EntityInfo, format: Format) -> Self {
        Self {
            wrapper,
            info,
            format,
            is_selected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes_roundtrip() {
        let info = EntityInfo::from_classes(["_Entity", "_EType_mention", "_EId_m1", "_EReadonly_1"])
            .unwrap();
        assert_eq!(info.entity_type.as_deref(), Some("mention"));
        assert_eq!(info.id.as_deref(), Some("m1"));
        assert!(info.is_readonly);
        assert_eq!(
            info.to_classes(),
            vec!["_Entity", "_EType_mention", "_EId_m1", "_EReadonly_1"]
        );
    }

    #[test]
    fn test_non_entity_classes() {
        assert_eq!(EntityInfo::from_classes(["_EType_x", "foo"]), None);
    }
}
