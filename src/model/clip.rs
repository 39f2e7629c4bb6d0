use std::collections::BTreeMap;

use crate::foundation::core::Affine;
use crate::geometry::PathSpec;
use crate::model::filter::UnitsMode;

pub(crate) fn identity() -> Affine {
    Affine::IDENTITY
}

/// A parsed clip path.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipDefinition {
    /// Child shapes, each with its own fill rule. Unioned before use.
    pub children: Vec<PathSpec>,
    #[serde(default)]
    pub units: UnitsMode,
    /// Applied to the children before the units mapping.
    #[serde(default = "identity")]
    pub transform: Affine,
    /// Further clip applied to this clip's own region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_ref: Option<String>,
}

impl Default for ClipDefinition {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ClipDefinition {
    pub fn new(children: Vec<PathSpec>) -> Self {
        Self {
            children,
            units: UnitsMode::UserSpaceOnUse,
            transform: Affine::IDENTITY,
            clip_ref: None,
        }
    }

    pub fn with_units(mut self, units: UnitsMode) -> Self {
        self.units = units;
        self
    }

    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_clip_ref(mut self, id: impl Into<String>) -> Self {
        self.clip_ref = Some(id.into());
        self
    }

    /// Total segment count of all children.
    pub fn segment_count(&self) -> usize {
        self.children.iter().map(PathSpec::segment_count).sum()
    }
}

/// Clip definitions by id.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ClipLibrary {
    defs: BTreeMap<String, ClipDefinition>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, def: ClipDefinition) -> Option<ClipDefinition> {
        self.defs.insert(id.into(), def)
    }

    pub fn get(&self, id: &str) -> Option<&ClipDefinition> {
        self.defs.get(id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClipDefinition)> {
        self.defs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, ClipDefinition)> for ClipLibrary {
    fn from_iter<I: IntoIterator<Item = (String, ClipDefinition)>>(iter: I) -> Self {
        Self {
            defs: iter.into_iter().collect(),
        }
    }
}
