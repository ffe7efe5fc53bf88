//! Selection items: the priced inventory a client holds at quote time.
//!
//! Items are produced by the (external) scene generator. The engine never
//! interprets geometry; it only counts items and freezes their specs into the
//! order record.

use serde::{Deserialize, Serialize};

/// One-click preset the editor offers for picking street objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// The road and both sidewalks.
    Road,
    /// The road, both sidewalks, and every tree and building.
    Everything,
}

impl SelectionMode {
    /// Whether the scene object called `name` belongs to this preset.
    ///
    /// Lights, helpers, lane markings and the ground plane belong to none.
    #[must_use]
    pub fn includes(self, name: &str) -> bool {
        let roadway = matches!(name, "Road" | "Sidewalk Left" | "Sidewalk Right");
        match self {
            Self::Road => roadway,
            Self::Everything => roadway || name.contains("Tree") || name.contains("Building"),
        }
    }
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Road => write!(f, "road"),
            Self::Everything => write!(f, "everything"),
        }
    }
}

impl std::str::FromStr for SelectionMode {
    type Err = crate::CreditError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "road" => Ok(Self::Road),
            "everything" | "all" => Ok(Self::Everything),
            other => Err(crate::CreditError::Configuration(format!(
                "unknown selection mode: {other}"
            ))),
        }
    }
}

/// One scene object marked for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionItem {
    /// Scene name, e.g. `"Road"`, `"Sidewalk Left"`, `"Tree 3"`.
    pub name: String,
    /// Object kind as reported by the scene graph (e.g. `"Mesh"`).
    pub kind: String,
    pub position: [f32; 3],
    pub scale: [f32; 3],
    /// Material color as a 6-digit hex string without `#`, when known.
    pub color_hex: Option<String>,
}

impl SelectionItem {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            position: [0.0; 3],
            scale: [1.0; 3],
            color_hex: None,
        }
    }

    #[must_use]
    pub fn at(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn scaled(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }

    #[must_use]
    pub fn colored(mut self, hex: impl Into<String>) -> Self {
        self.color_hex = Some(hex.into());
        self
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl SelectionItem {
    pub fn dummy(name: &str) -> Self {
        Self::new(name, "Mesh").colored("808080")
    }

    /// `n` distinct dummy items named `Building 0..n`.
    pub fn dummies(n: usize) -> Vec<Self> {
        (0..n).map(|i| Self::dummy(&format!("Building {i}"))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let item = SelectionItem::new("Tree 1", "Mesh")
            .at([1.0, 0.0, -2.0])
            .scaled([2.0, 2.0, 2.0])
            .colored("2e8b57");
        assert_eq!(item.position, [1.0, 0.0, -2.0]);
        assert_eq!(item.scale, [2.0, 2.0, 2.0]);
        assert_eq!(item.color_hex.as_deref(), Some("2e8b57"));
    }

    #[test]
    fn road_mode_is_roadway_only() {
        for name in ["Road", "Sidewalk Left", "Sidewalk Right"] {
            assert!(SelectionMode::Road.includes(name));
            assert!(SelectionMode::Everything.includes(name));
        }
        assert!(!SelectionMode::Road.includes("Tree 0"));
        assert!(!SelectionMode::Road.includes("Building 2"));
        assert!(SelectionMode::Everything.includes("Tree Foliage 0"));
        assert!(SelectionMode::Everything.includes("Building 2"));
        assert!(!SelectionMode::Everything.includes("Road Line"));
        assert!(!SelectionMode::Everything.includes("Ground"));
    }

    #[test]
    fn mode_parses_and_serializes_lowercase() {
        assert_eq!("Road".parse::<SelectionMode>().unwrap(), SelectionMode::Road);
        assert_eq!("all".parse::<SelectionMode>().unwrap(), SelectionMode::Everything);
        assert!("trees".parse::<SelectionMode>().is_err());
        assert_eq!(serde_json::to_string(&SelectionMode::Everything).unwrap(), "\"everything\"");
    }

    #[test]
    fn dummies_are_distinct() {
        let items = SelectionItem::dummies(3);
        assert_eq!(items.len(), 3);
        assert_ne!(items[0].name, items[1].name);
    }
}
