//! Error and warning types shared by the loader, the sampler and the
//! primitive builders.
//!
//! Hard failures are returned as `Err`. Soft failures (a texture that could not
//! be fetched, a primitive that had to be replaced) never abort a load; they
//! are collected as [`LoadWarning`]s next to the value in an [`Outcome`].

use crate::loader::LoadState;

/// Terminal failure of a single load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("model '{0}' has no source url")]
    MissingUrl(String),

    #[error("model '{name}' cannot be loaded while {state:?}")]
    InvalidState { name: String, state: LoadState },

    #[error("failed to fetch '{url}': {reason:#}")]
    Fetch { url: String, reason: anyhow::Error },

    #[error("failed to decode '{url}': {reason:#}")]
    Decode { url: String, reason: anyhow::Error },

    #[error("load of model '{0}' was cancelled")]
    Cancelled(String),
}

/// Something went wrong but a fallback was substituted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadWarning {
    #[error("texture '{url}' unavailable, using a flat colour instead: {reason}")]
    TextureFallback { url: String, reason: String },

    #[error("mesh '{name}' could not be built, using the default primitive instead: {reason}")]
    PrimitiveFallback { name: String, reason: String },

    #[error("primitive {index} of mesh '{mesh}' was skipped: {reason}")]
    SkippedPrimitive {
        mesh: String,
        index: usize,
        reason: String,
    },

    #[error("point cloud for mesh '{mesh}' was skipped: {reason}")]
    SkippedPointCloud { mesh: String, reason: String },
}

/// Surface sampling cannot produce points.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleError {
    #[error("mesh has no triangles with a positive area")]
    EmptySurface,
}

/// Invalid parameters for a generated primitive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("{what} must be positive and finite, got {value}")]
    NonPositive { what: &'static str, value: f32 },

    #[error("{what} needs at least {min} segments, got {value}")]
    TooFewSegments {
        what: &'static str,
        min: u32,
        value: u32,
    },
}

/// A value produced with zero or more fallbacks.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<LoadWarning>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<LoadWarning>) -> Self {
        Self { value, warnings }
    }

    /// `true` if no fallback was needed.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// Moves the warnings into `sink` and returns the bare value.
    pub fn collect_into(self, sink: &mut Vec<LoadWarning>) -> T {
        sink.extend(self.warnings);
        self.value
    }
}
