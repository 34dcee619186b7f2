//! Path Resolution
//!
//! All filesystem path arithmetic for the engine: filename sanitization,
//! output-pattern expansion, include-target resolution and the containment
//! check that keeps include targets inside the owning document's root.

pub mod resolver;

pub use resolver::{
    generate_include_path, humanize_filename, is_contained, normalize_path, resolve_include_path,
    resolve_output_path, sanitize_name, PatternContext,
};
