//! Deterministic JSON serialization for the workspace file.
//!
//! Keeps the file stable between writes:
//! - object keys in `BTreeMap` order
//! - 2-space indentation
//! - trailing newline

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable_bytes};
