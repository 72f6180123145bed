//! Reference codec plugins.
//!
//! Wire-format image codecs (PNG, JPEG, JP2, ...) are external collaborators
//! per the specification; `colorist-core` itself ships only the trivial
//! uncompressed [`ppm`] container, which needs no external crate and exists
//! to exercise the [`crate::registry::FormatRegistry`] end-to-end.

pub mod ppm;
