use std::sync::Arc;

use crate::emf::EmfDocument;
use crate::foundation::error::{DmlfxError, DmlfxResult};
use crate::foundation::hash::{Fingerprint, StableHasher};
use crate::model::{Diagnostic, VectorFragment};
use crate::strategy::{Strategy, StrategyDecision};

/// Self-contained output for one element.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionResult {
    pub vector_fragment: VectorFragment,
    /// Indexed by the fragment's resource slots.
    pub embedded_resources: Vec<Arc<EmfDocument>>,
    /// What the output actually is, which can be cheaper than the analysis predicted.
    pub strategy: Strategy,
    /// Analyzer decision per filter node.
    pub decisions: Vec<StrategyDecision>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConversionResult {
    /// Content fingerprint over the fragment, the encoded resources and the diagnostics.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut h = StableHasher::new();
        self.vector_fragment.hash_into(&mut h);
        h.write_u8(self.strategy as u8);
        h.write_u64(self.embedded_resources.len() as u64);
        for r in &self.embedded_resources {
            let f = r.fingerprint();
            h.write_u64(f.hi);
            h.write_u64(f.lo);
        }
        if let Ok(bytes) = serde_json::to_vec(&self.diagnostics) {
            h.write_bytes(&bytes);
        }
        h.finish()
    }

    /// Check the resource invariants: native output references nothing, every other strategy
    /// carries at least one resource, and every slot points at a resource.
    pub fn check(&self) -> DmlfxResult<()> {
        let slots = self.vector_fragment.resource_slots();
        let n = self.embedded_resources.len();
        if let Some(bad) = slots.iter().find(|s| s.0 as usize >= n) {
            return Err(DmlfxError::invariant(format!(
                "element '{}' references resource slot {} of {n}",
                self.vector_fragment.id, bad.0
            )));
        }
        match self.strategy {
            Strategy::NativeVector if n > 0 || !slots.is_empty() => {
                Err(DmlfxError::invariant(format!(
                    "native element '{}' references embedded resources",
                    self.vector_fragment.id
                )))
            }
            Strategy::Hybrid | Strategy::BinaryFallback if n == 0 => {
                Err(DmlfxError::invariant(format!(
                    "{:?} element '{}' carries no embedded resource",
                    self.strategy, self.vector_fragment.id
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Dispatcher output for one element.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementOutput {
    Drawn(ConversionResult),
    /// Nothing of the element survives its clip or filter.
    Removed {
        id: String,
        diagnostics: Vec<Diagnostic>,
    },
}

impl ElementOutput {
    pub fn id(&self) -> &str {
        match self {
            Self::Drawn(r) => &r.vector_fragment.id,
            Self::Removed { id, .. } => id,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Drawn(r) => &r.diagnostics,
            Self::Removed { diagnostics, .. } => diagnostics,
        }
    }

    pub fn as_drawn(&self) -> Option<&ConversionResult> {
        match self {
            Self::Drawn(r) => Some(r),
            Self::Removed { .. } => None,
        }
    }

    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }

    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            Self::Drawn(r) => r.fingerprint(),
            Self::Removed { id, .. } => {
                let mut h = StableHasher::new();
                h.write_str("removed");
                h.write_str(id);
                h.finish()
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/result.rs"]
mod tests;
