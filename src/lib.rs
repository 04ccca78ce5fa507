// src/lib.rs
//! Canonicalization of SEC 10-K filing JSON.
//!
//! Filing documents arrive with `parts` and `sections` either as keyed
//! objects or as arrays, depending on which extractor produced them. The
//! [`normalize`] module rewrites them into one shape (ordered arrays, every
//! part named, every section identified); the remaining modules load and save
//! those documents and run the follow-up rewrites over them.
pub mod batch;
pub mod classify;
pub mod config;
pub mod merge;
pub mod normalize;
pub mod rewrite;
pub mod storage;
pub mod utils;

pub use normalize::{normalize_batch, normalize_document, normalize_parts, normalize_sections, Diagnostics, Normalizer};
pub use utils::AppError;
