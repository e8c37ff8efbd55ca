//! CV document assembly: typed CV records in, renderer-agnostic document
//! description out.
//!
//! Layers, leaf to root: `format` → `sections` (+ `responsibilities`,
//! `photo`) → `composer`. Rendering and file emission happen client-side.

pub mod blocks;
pub mod composer;
pub mod format;
pub mod photo;
pub mod responsibilities;
pub mod sections;

use thiserror::Error;

pub use blocks::DocumentDescription;
pub use composer::{generate_export, ExportOptions, GeneratedDocument};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("CV has no profile; a document cannot be composed without one")]
    MissingProfile,
}
