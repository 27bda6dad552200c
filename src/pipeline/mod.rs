//! Pipeline stages for archiving one wiki page.
//!
//! Each submodule implements one step and is testable on its own; the
//! orchestration lives in [`crate::archive`].
//!
//! ## Data Flow
//!
//! ```text
//! title ──▶ job ──▶ source ──▶ images ──▶ convert ──▶ normalize
//!          (paths)  (raw+page) (+encode)  (pandoc)    (html fixup)
//! ```
//!
//! 1. [`filename`] : title → filesystem-safe basename
//! 2. [`job`]      : basename → directory and artefact paths; skip check
//! 3. [`source`]   : rendered page and raw markup through the session; the
//!    raw markup is written to disk
//! 4. [`images`]   : every raster image the page references, saved next to
//!    it; [`encode`] makes the bytes match the file extension
//! 5. [`convert`]  : external converter run with an output-exists check
//! 6. [`normalize`]: skeleton repair, stylesheet and heading injection,
//!    caption removal
//!
//! [`input`] resolves the list of titles before any of this starts.

pub mod convert;
pub mod encode;
pub mod filename;
pub mod images;
pub mod input;
pub mod job;
pub mod normalize;
pub mod source;
