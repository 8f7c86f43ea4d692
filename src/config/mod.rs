//! Runtime configuration of an import run.
//!
//! Loading happens in three steps:
//! 1. **Parse** - the document (JSON, YAML, or XML) becomes a generic tree
//! 2. **Merge** - inline params, then the params file, are overlaid on the tree
//! 3. **Materialize** - the merged tree is bound to [`Configuration`]
//!
//! The loaded configuration is read-only afterwards and answers resolution
//! queries such as [`Configuration::database`] and [`Configuration::plugins`].
//!
//! ## Params precedence
//! - The params file wins over inline params
//! - Inline params win over the document
//! - A params file that does not exist is skipped

mod boolean;
mod de;
mod loader;
mod merge;
mod resolve;
mod tree;
mod types;

pub use boolean::{BOOLEAN_MAPPING, map_boolean};
pub use de::Keyed;
pub use loader::ConfigLoader;
pub use merge::{merge_params, merge_params_all};
pub use resolve::BoundCache;
pub use tree::{parse_tree, prune_nulls, to_tree};
pub use types::*;
