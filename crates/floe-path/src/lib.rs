//! Floe Path
//!
//! Data selection and reshaping for workflow states:
//!
//! - [`Path`] reads a value out of the state input (`$...`) or the execution
//!   context (`$$...`) using a JSONPath subset.
//! - [`ReferencePath`] is the writable subset of [`Path`], used by
//!   `ResultPath` to place a result inside the state input.
//! - [`PayloadTemplate`] rewrites `Parameters`, `ResultSelector` and
//!   `Credentials` documents, resolving `"key.$": "<path>"` entries.
//!
//! # Supported JSONPath subset
//!
//! ```text
//! $                 root
//! .name  ['name']   child member
//! [0]  [-1]         array index (negative counts from the end)
//! .*  [*]           wildcard
//! ..name  ..*       recursive descent
//! ['a','b']  [0,2]  union
//! [1:3]  [::2]      slice
//! [?(@.price < 10 && @.tags)]   filter
//! ```

mod error;
mod parser;
mod path;
mod payload_template;
mod query;
mod reference_path;

pub use error::PathError;
pub use path::Path;
pub use payload_template::PayloadTemplate;
pub use reference_path::ReferencePath;
