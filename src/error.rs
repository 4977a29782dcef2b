//! Typed errors for the encoder's own fallible internals.
//!
//! Everything outside texture embedding is infallible by construction:
//! invalid input is filtered before it reaches node-building code (§7), so
//! only the embed-image path needs a `Result`.

use thiserror::Error;

/// Why an embedded texture's PNG bytes could not be produced. Every variant
/// is handled the same way by the caller: log a warning and omit the
/// texture (§7).
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode texture image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("texture has zero width or height")]
    EmptyImage,
}
