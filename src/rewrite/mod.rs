// src/rewrite/mod.rs
//! In-place rewrites applied to canonical filing JSON after normalization.
pub mod category;
pub mod fields;
pub mod part_names;

// Re-export key rewrite passes for convenience
pub use category::{categorize_file_names, simplify_category_name};
pub use fields::{promote_item_name, strip_fields, DEFAULT_STRIP_FIELDS};
pub use part_names::{infer_part_label, relabel_parts, RelabelMode, RelabelStats};
