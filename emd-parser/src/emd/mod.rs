//! Core modules of the emd object framework.

pub mod error;
pub mod field;
pub mod field_type;
pub mod formats;
pub mod instances;
pub mod loader;
pub mod math;
pub mod object;
pub mod parsing;
pub mod registry;
pub mod scanning;
pub mod spec;
pub mod testing;
pub mod value;

pub use error::{EmdError, Result};
pub use field::{Field, FieldData};
pub use field_type::{EnumValue, FieldType, Flags};
pub use object::{Change, Object, ObjectBase, ObjectPtr};
pub use parsing::{Parser, ParserOptions};
pub use registry::Registry;
pub use spec::{FieldSpec, SpecBuilder};
pub use value::{Value, ValueFormat, ValueType};
