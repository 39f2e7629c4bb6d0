/// Convenience result type used across dmlfx.
pub type DmlfxResult<T> = Result<T, DmlfxError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Element-local conversion problems (unsupported primitives, dangling references, budget
/// overruns) are not errors; they travel as diagnostics on the element output. Only malformed
/// requests and internal defects surface here.
#[derive(thiserror::Error, Debug)]
pub enum DmlfxError {
    /// Invalid caller-provided data (options, parameters, request documents).
    #[error("validation error: {0}")]
    Validation(String),

    /// Geometry that cannot be represented at all (non-finite coordinates in a required input).
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Errors while encoding a binary metafile resource.
    #[error("emit error: {0}")]
    Emit(String),

    /// A converter produced output that breaks an engine invariant. Always a bug in dmlfx.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DmlfxError {
    /// Build a [`DmlfxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DmlfxError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`DmlfxError::Emit`] value.
    pub fn emit(msg: impl Into<String>) -> Self {
        Self::Emit(msg.into())
    }

    /// Build a [`DmlfxError::Invariant`] value.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Build a [`DmlfxError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
