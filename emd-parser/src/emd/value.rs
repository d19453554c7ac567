//! Scannable value kinds
//!
//! A [`Value`] is one primitive slot. Fields holding vectors, colors or lists
//! store several of them in order; object-valued fields keep their own
//! storage (see [`FieldData`](super::field::FieldData)).

use std::fmt;

/// The kind of data a field stores, which also decides how its text is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool,
    Integer,
    UInteger,
    Float,
    String,
    Object,
    ObjectList,
}

impl ValueType {
    pub fn is_object(self) -> bool {
        matches!(self, ValueType::Object | ValueType::ObjectList)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::UInteger => "unsigned integer",
            ValueType::Float => "float",
            ValueType::String => "string",
            ValueType::Object => "object",
            ValueType::ObjectList => "object list",
        };
        f.write_str(name)
    }
}

/// How the text of a primitive field is interpreted beyond its [`ValueType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Whitespace-separated primitives.
    Plain,
    /// Four floats, or a quoted `"#RRGGBB[AA]"` string.
    Color,
    /// A quoted name from the list.
    Enum(&'static [&'static str]),
    /// Quoted names from the list joined by `|`.
    Flags(&'static [&'static str]),
}

/// One stored primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i32),
    UInteger(u32),
    Float(f32),
    String(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Integer(_) => ValueType::Integer,
            Value::UInteger(_) => ValueType::UInteger,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
        }
    }

    /// The zero value of a primitive kind; `None` for object kinds.
    pub fn zero(value_type: ValueType) -> Option<Value> {
        match value_type {
            ValueType::Bool => Some(Value::Bool(false)),
            ValueType::Integer => Some(Value::Integer(0)),
            ValueType::UInteger => Some(Value::UInteger(0)),
            ValueType::Float => Some(Value::Float(0.0)),
            ValueType::String => Some(Value::String(String::new())),
            ValueType::Object | ValueType::ObjectList => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::UInteger(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}
