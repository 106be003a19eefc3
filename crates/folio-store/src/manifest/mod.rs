//! Schema manifests
//!
//! A YAML description of an ordered table list, validated and resolved into
//! a `Schema` for a chosen driver.

pub mod format_v0;
pub mod parser;

pub use format_v0::{ManifestColumn, ManifestKind, ManifestPlain, ManifestTable, ManifestV0};
pub use parser::{load_schema, parse_manifest_file, parse_manifest_str};
