// src/normalize/mod.rs
pub mod diagnostics;
pub mod normalizer;
pub mod shape;

// Re-export key normalization types for convenience
pub use diagnostics::Diagnostics;
pub use normalizer::{
    normalize_batch,
    normalize_document,
    normalize_parts,
    normalize_sections,
    Normalizer,
    Record,
};
pub use shape::{is_present, Shape};
