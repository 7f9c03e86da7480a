//! Class display styles.
//!
//! A [`StyleTable`] maps class ids to a display name, an RGB color and an
//! optional longer description. It is an immutable value handed to the
//! renderer and the report formatter, so callers can swap in their own table.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SignscopeError;

/// Color used for classes that are not in the table.
pub const DEFAULT_COLOR: [u8; 3] = [255, 255, 255];

/// Display style for one class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStyle {
    pub name: String,
    pub color: [u8; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ClassStyle {
    pub fn new(name: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            color,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Lookup from class id to [`ClassStyle`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleTable {
    #[serde(default = "default_color")]
    pub default_color: [u8; 3],
    #[serde(default)]
    pub classes: BTreeMap<u32, ClassStyle>,
}

fn default_color() -> [u8; 3] {
    DEFAULT_COLOR
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl StyleTable {
    /// A table with no entries; every class falls back.
    pub fn empty() -> Self {
        Self {
            default_color: DEFAULT_COLOR,
            classes: BTreeMap::new(),
        }
    }

    /// The traffic-sign classes most often seen in BRSSD predictions.
    ///
    /// Names are estimates from prediction analysis; the dataset's own
    /// `data.yaml` is authoritative when available.
    pub fn traffic_signs() -> Self {
        let entries = [
            (22, "Speed Limit", [255, 0, 0], "Speed limit or regulatory sign"),
            (23, "Warning", [255, 165, 0], "Warning sign"),
            (26, "Priority/Yield", [255, 255, 0], "Priority/give way sign"),
            (28, "Information", [0, 0, 255], "Information sign"),
            (29, "Direction", [255, 0, 255], "Direction sign"),
            (32, "Stop/Parking", [128, 0, 0], "Parking or stop sign"),
            (35, "Pedestrian", [0, 255, 255], "Pedestrian crossing sign"),
            (36, "Caution", [0, 255, 0], "General warning/caution sign"),
        ];

        let classes = entries
            .into_iter()
            .map(|(id, name, color, description)| {
                (id, ClassStyle::new(name, color).with_description(description))
            })
            .collect();

        Self {
            default_color: DEFAULT_COLOR,
            classes,
        }
    }

    /// Load a table from YAML.
    ///
    /// ```yaml
    /// default_color: [255, 255, 255]
    /// classes:
    ///   22: { name: Speed Limit, color: [255, 0, 0] }
    /// ```
    pub fn from_yaml_file(path: &Path) -> Result<Self, SignscopeError> {
        let data = fs::read_to_string(path).map_err(SignscopeError::Io)?;
        serde_yaml::from_str(&data).map_err(|source| SignscopeError::StyleTableParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Insert or replace a class entry.
    pub fn insert(&mut self, class_id: u32, style: ClassStyle) {
        self.classes.insert(class_id, style);
    }

    pub fn get(&self, class_id: u32) -> Option<&ClassStyle> {
        self.classes.get(&class_id)
    }

    /// Display name, or `"Class {id}"` for unknown classes.
    pub fn name(&self, class_id: u32) -> String {
        self.get(class_id)
            .map(|style| style.name.clone())
            .unwrap_or_else(|| format!("Class {class_id}"))
    }

    /// Color, or the table default for unknown classes.
    pub fn color(&self, class_id: u32) -> [u8; 3] {
        self.get(class_id)
            .map(|style| style.color)
            .unwrap_or(self.default_color)
    }

    pub fn description(&self, class_id: u32) -> Option<&str> {
        self.get(class_id)
            .and_then(|style| style.description.as_deref())
    }
}
