//! Error kinds of the view pipeline.
//!
//! None of these is fatal: callers skip the affected item or request and keep
//! the last good state.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    /// The matrix cannot be inverted (zero scale on some axis).
    #[error("singular transform (determinant {determinant:e})")]
    SingularTransform { determinant: f64 },

    /// Non-finite or inverted bounds were requested.
    #[error("invalid range [{min}, {max}]: {reason}")]
    InvalidRange {
        min: f64,
        max: f64,
        reason: &'static str,
    },

    /// The paint target is not drawable; the pass is deferred to the next frame.
    #[error("paint surface unavailable")]
    SurfaceUnavailable,

    /// A primitive mapped to NaN/Infinity and was dropped.
    #[error("non-finite primitive dropped ({dropped} vertices)")]
    NonFinitePrimitive { dropped: usize },
}

pub type Result<T> = std::result::Result<T, ViewError>;
