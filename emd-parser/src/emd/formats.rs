//! Output formats
//!
//! - [`writer`]: emd text, the format the parser reads.
//! - [`value_text`]: text forms of individual values, shared by the writer
//!   and snapshots.
//! - [`snapshot`]: a serde-serializable copy of a graph, with JSON helpers.

pub mod snapshot;
pub mod value_text;
pub mod writer;

pub use snapshot::{snapshot_object, ObjectSnapshot};
pub use writer::{write_to_string, WriteCondition, Writer, WriterOptions};
