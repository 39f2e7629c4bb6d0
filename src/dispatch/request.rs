use std::sync::Arc;

use crate::config::ConvertOptions;
use crate::dispatch::dispatcher::Dispatcher;
use crate::dispatch::result::ElementOutput;
use crate::emf::PatternCache;
use crate::foundation::error::{DmlfxError, DmlfxResult};
use crate::model::{ClipLibrary, Diagnostic, ElementInput, VectorFragment};
use crate::strategy::Strategy;

/// A batch of elements sharing options and a clip library.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConversionRequest {
    pub options: ConvertOptions,
    pub clips: ClipLibrary,
    pub elements: Vec<ElementInput>,
}

impl ConversionRequest {
    /// Parse and validate a request document.
    pub fn from_json_str(s: &str) -> DmlfxResult<Self> {
        let req: Self = serde_json::from_str(s).map_err(|e| DmlfxError::serde(e.to_string()))?;
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> DmlfxResult<()> {
        self.options.validate()?;
        let mut seen = std::collections::BTreeSet::new();
        for e in &self.elements {
            if !seen.insert(e.id.as_str()) {
                return Err(DmlfxError::validation(format!(
                    "duplicate element id '{}'",
                    e.id
                )));
            }
        }
        Ok(())
    }

    /// Convert every element with a fresh dispatcher over `patterns`.
    pub fn run(&self, patterns: Arc<PatternCache>) -> DmlfxResult<Vec<ElementOutput>> {
        let dispatcher = Dispatcher::new(self.options.clone(), patterns)?;
        dispatcher.convert_all(&self.elements, &self.clips)
    }
}

/// Serializable view of one element output, with resources replaced by caller-chosen names.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementReport {
    pub id: String,
    pub removed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<VectorFragment>,
    /// Name per resource slot.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl ElementReport {
    /// Report for `out`; `name` maps a resource slot index to its external name.
    pub fn new(out: &ElementOutput, mut name: impl FnMut(usize) -> String) -> Self {
        let drawn = out.as_drawn();
        Self {
            id: out.id().to_string(),
            removed: out.is_removed(),
            strategy: drawn.map(|r| r.strategy),
            fragment: drawn.map(|r| r.vector_fragment.clone()),
            resources: drawn
                .map(|r| (0..r.embedded_resources.len()).map(&mut name).collect())
                .unwrap_or_default(),
            fingerprint: out.fingerprint().to_string(),
            diagnostics: out.diagnostics().to_vec(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/request.rs"]
mod tests;
