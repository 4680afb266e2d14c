//! Shared utilities: JSON manipulation helpers and ID allocation.

mod id_generator;
mod json_ext;

pub use id_generator::IdGenerator;
pub use json_ext::{deep_merge, get_by_path, JsonValueExt, MergeStrategy};
