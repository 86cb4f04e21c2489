//! Pipeline stages for one passport image.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested without the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ preprocess ──▶ gemini ──▶ parse ──▶ normalize
//! (filter)   (resize/jpeg)  (HTTP)    (JSON/regex) (9 fields)
//! ```
//!
//! 1. [`input`]      — keep files whose guessed MIME type is `image/*`
//! 2. [`preprocess`] — decode, downscale and JPEG re-encode; runs in
//!    `spawn_blocking` because decoding is CPU-bound
//! 3. [`gemini`]     — the `generateContent` call and error remapping; the
//!    only stage with network I/O
//! 4. [`parse`]      — recover a JSON object from free-form model text
//! 5. [`normalize`]  — coerce the object into [`crate::record::PassportData`]

pub mod gemini;
pub mod input;
pub mod normalize;
pub mod parse;
pub mod preprocess;
