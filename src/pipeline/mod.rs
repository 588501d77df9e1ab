//! Pipeline stages for turning booth photos into a company record.
//!
//! Each submodule implements exactly one step, so each can be tested on
//! its own and replaced without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ extract ──▶ (notes) ──▶ persist
//! (decode,      (VLM,        (scan.rs)   (record row, then
//!  rotate,       always                   upload + link each
//!  resize, JPEG) returns)                 photo in order)
//! ```
//!
//! 1. [`normalize`]: decode, apply EXIF orientation, bound to 1600 px,
//!    re-encode as JPEG; runs on the blocking pool, one task per image
//! 2. [`extract`]: one inference call with every photo; degrades to a
//!    fallback record instead of failing
//! 3. [`persist`]: insert the company, then upload and link each photo,
//!    skipping photos whose upload fails

pub mod extract;
pub mod normalize;
pub mod persist;
