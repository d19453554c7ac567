//! Static field declarations
//!
//! Each object type describes its fields once, usually in a `Lazy` static,
//! and every instance binds a [`Field`](super::field::Field) to each entry:
//!
//! ```ignore
//! static SPECS: Lazy<Vec<FieldSpec>> = Lazy::new(|| {
//!     SpecBuilder::new()
//!         .add::<i32>("count")
//!         .add::<Vec3>("center")
//!         .add_object_list::<Light>("lights")
//!         .build()
//! });
//! ```

use super::field_type::FieldType;
use super::object::Object;
use super::value::{Value, ValueFormat, ValueType};
use std::any::TypeId;

/// Identifies the object type an object-valued field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectKind {
    pub type_id: TypeId,
    pub name: &'static str,
}

impl ObjectKind {
    pub fn of<T: Object>() -> Self {
        let full = std::any::type_name::<T>();
        ObjectKind {
            type_id: TypeId::of::<T>(),
            name: full.rsplit("::").next().unwrap_or(full),
        }
    }
}

/// Immutable description of one field: how it is named, stored, read and
/// written.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub value_type: ValueType,
    /// Primitives per value (3 for a `Vec3`); always 1 for object kinds.
    pub count: usize,
    /// Bracketed list of any number of values.
    pub is_list: bool,
    pub format: ValueFormat,
    pub default: Vec<Value>,
    pub object_kind: Option<ObjectKind>,
    pub hidden: bool,
}

impl FieldSpec {
    /// Whether a single access must go through `get_values`.
    pub fn is_multi_valued(&self) -> bool {
        self.is_list || self.count > 1
    }
}

/// Collects [`FieldSpec`]s in declaration order.
#[derive(Debug, Default)]
pub struct SpecBuilder {
    specs: Vec<FieldSpec>,
}

impl SpecBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A field holding one `T`.
    pub fn add<T: FieldType>(mut self, name: &'static str) -> Self {
        self.specs.push(FieldSpec {
            name,
            value_type: T::VALUE_TYPE,
            count: T::COUNT,
            is_list: false,
            format: T::format(),
            default: T::default().to_values(),
            object_kind: None,
            hidden: false,
        });
        self
    }

    /// A field holding a bracketed list of `T`.
    pub fn add_list<T: FieldType>(mut self, name: &'static str) -> Self {
        self.specs.push(FieldSpec {
            name,
            value_type: T::VALUE_TYPE,
            count: T::COUNT,
            is_list: true,
            format: T::format(),
            default: Vec::new(),
            object_kind: None,
            hidden: false,
        });
        self
    }

    /// A field holding one shared object of type `T` (or one that is-a `T`).
    pub fn add_object<T: Object>(self, name: &'static str) -> Self {
        self.push_object::<T>(name, ValueType::Object)
    }

    pub fn add_object_list<T: Object>(self, name: &'static str) -> Self {
        self.push_object::<T>(name, ValueType::ObjectList)
    }

    fn push_object<T: Object>(mut self, name: &'static str, value_type: ValueType) -> Self {
        self.specs.push(FieldSpec {
            name,
            value_type,
            count: 1,
            is_list: false,
            format: ValueFormat::Plain,
            default: Vec::new(),
            object_kind: Some(ObjectKind::of::<T>()),
            hidden: false,
        });
        self
    }

    /// Sets the default of the most recently added field.
    pub fn with_default<T: FieldType>(mut self, value: T) -> Self {
        if let Some(spec) = self.specs.last_mut() {
            if spec.value_type == T::VALUE_TYPE && spec.count == T::COUNT {
                spec.default = value.to_values();
            } else {
                log::warn!("ignoring default of wrong type for field '{}'", spec.name);
            }
        }
        self
    }

    /// Marks the most recently added field as never written.
    pub fn hidden(mut self) -> Self {
        if let Some(spec) = self.specs.last_mut() {
            spec.hidden = true;
        }
        self
    }

    pub fn build(self) -> Vec<FieldSpec> {
        self.specs
    }
}
