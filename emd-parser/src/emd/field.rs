//! Runtime field storage
//!
//! A [`Field`] is bound to one static [`FieldSpec`] and owns the value(s) for
//! one object instance. Primitive kinds keep a flat list of [`Value`]s
//! (`count` per entry); object kinds hold shared [`ObjectPtr`]s so the same
//! object can sit in several fields.
//!
//! Typed reads and writes go through [`FieldType`]. Asking for a type that
//! does not match the declaration is an error, not a conversion.

use super::error::{EmdError, Result};
use super::field_type::{normalize_flag_text, FieldType};
use super::object::ObjectPtr;
use super::spec::FieldSpec;
use super::value::{Value, ValueFormat, ValueType};

/// What a field currently holds.
#[derive(Debug, Clone)]
pub enum FieldData {
    Values(Vec<Value>),
    Object(Option<ObjectPtr>),
    ObjectList(Vec<ObjectPtr>),
}

impl FieldData {
    /// Initial contents for a freshly bound field.
    pub fn for_spec(spec: &FieldSpec) -> Self {
        match spec.value_type {
            ValueType::Object => FieldData::Object(None),
            ValueType::ObjectList => FieldData::ObjectList(Vec::new()),
            _ => FieldData::Values(spec.default.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    spec: &'static FieldSpec,
    data: FieldData,
    was_set: bool,
    hidden: bool,
}

impl Field {
    pub fn new(spec: &'static FieldSpec) -> Self {
        Field {
            spec,
            data: FieldData::for_spec(spec),
            was_set: false,
            hidden: spec.hidden,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn spec(&self) -> &'static FieldSpec {
        self.spec
    }

    pub fn data(&self) -> &FieldData {
        &self.data
    }

    /// True once a value was parsed into or assigned to the field.
    pub fn was_set(&self) -> bool {
        self.was_set
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Raw primitives; empty for object kinds.
    pub fn values(&self) -> &[Value] {
        match &self.data {
            FieldData::Values(values) => values,
            _ => &[],
        }
    }

    /// Replaces the contents without any checks. The parser has already
    /// validated what it scanned.
    pub(crate) fn store(&mut self, data: FieldData) {
        self.data = data;
        self.was_set = true;
    }

    pub(crate) fn copy_state_from(&mut self, other: &Field, data: FieldData) {
        self.data = data;
        self.was_set = other.was_set;
        self.hidden = other.hidden;
    }

    fn error(&self, message: impl Into<String>) -> EmdError {
        EmdError::field(self.spec.name, message)
    }

    fn check_kind<T: FieldType>(&self) -> Result<()> {
        if T::VALUE_TYPE != self.spec.value_type {
            return Err(self.error(format!(
                "stores {} values and cannot be accessed as {}",
                self.spec.value_type,
                std::any::type_name::<T>()
            )));
        }
        Ok(())
    }

    fn check_single<T: FieldType>(&self) -> Result<()> {
        self.check_kind::<T>()?;
        if self.spec.is_list {
            return Err(self.error("is a list; use get_values/set_values"));
        }
        if T::COUNT != self.spec.count {
            return Err(self.error(format!(
                "holds {} values, not {}",
                self.spec.count,
                T::COUNT
            )));
        }
        Ok(())
    }

    /// Values per element for multi-valued access.
    fn element_count<T: FieldType>(&self) -> Result<usize> {
        self.check_kind::<T>()?;
        let per = if self.spec.is_list {
            self.spec.count
        } else if self.spec.count > 1 {
            1
        } else {
            return Err(self.error("is single-valued; use get_value/set_value"));
        };
        if T::COUNT != per {
            return Err(self.error(format!(
                "has {} values per element, not {}",
                per,
                T::COUNT
            )));
        }
        Ok(per)
    }

    fn check_format(&self, values: &[Value]) -> Result<()> {
        let names = match self.spec.format {
            ValueFormat::Enum(names) | ValueFormat::Flags(names) => names,
            _ => return Ok(()),
        };
        for value in values {
            let text = value.as_str().unwrap_or_default();
            let ok = match self.spec.format {
                ValueFormat::Flags(_) => normalize_flag_text(names, text).is_some(),
                _ => names.contains(&text),
            };
            if !ok {
                return Err(self.error(format!("'{}' is not a valid name", text)));
            }
        }
        Ok(())
    }

    pub fn get_value<T: FieldType>(&self) -> Result<T> {
        self.check_single::<T>()?;
        T::from_values(self.values()).ok_or_else(|| self.error("stored value is malformed"))
    }

    pub fn get_values<T: FieldType>(&self) -> Result<Vec<T>> {
        let per = self.element_count::<T>()?;
        self.values()
            .chunks(per)
            .map(|chunk| T::from_values(chunk).ok_or_else(|| self.error("stored value is malformed")))
            .collect()
    }

    pub fn set_value<T: FieldType>(&mut self, value: T) -> Result<()> {
        self.check_single::<T>()?;
        let values = value.to_values();
        self.check_format(&values)?;
        self.store(FieldData::Values(values));
        Ok(())
    }

    /// Sets a list, or the components of a fixed multi-valued field.
    pub fn set_values<T: FieldType>(&mut self, values: &[T]) -> Result<()> {
        self.element_count::<T>()?;
        if !self.spec.is_list && values.len() != self.spec.count {
            return Err(self.error(format!(
                "expects {} values, got {}",
                self.spec.count,
                values.len()
            )));
        }
        let flat: Vec<Value> = values.iter().flat_map(|v| v.to_values()).collect();
        self.check_format(&flat)?;
        self.store(FieldData::Values(flat));
        Ok(())
    }

    /// Replaces one element of a list field.
    pub fn replace_value<T: FieldType>(&mut self, index: usize, value: T) -> Result<()> {
        if !self.spec.is_list {
            return Err(self.error("is not a list"));
        }
        let per = self.element_count::<T>()?;
        let len = self.values().len() / per;
        if index >= len {
            return Err(self.error(format!("index {} out of range for {} elements", index, len)));
        }
        let replacement = value.to_values();
        self.check_format(&replacement)?;
        if let FieldData::Values(values) = &mut self.data {
            values[index * per..(index + 1) * per].clone_from_slice(&replacement);
        }
        self.was_set = true;
        Ok(())
    }

    /// Number of list elements (or 1 for anything else that holds a value).
    pub fn len(&self) -> usize {
        match &self.data {
            FieldData::Values(values) if self.spec.is_list => values.len() / self.spec.count.max(1),
            FieldData::Values(_) => 1,
            FieldData::Object(obj) => usize::from(obj.is_some()),
            FieldData::ObjectList(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `obj` is an acceptable value for this object-valued field.
    pub fn accepts(&self, obj: &ObjectPtr) -> bool {
        self.spec
            .object_kind
            .is_some_and(|kind| obj.borrow().is_a(kind.type_id))
    }

    fn check_object(&self, obj: &ObjectPtr) -> Result<()> {
        if self.accepts(obj) {
            return Ok(());
        }
        let expected = self.spec.object_kind.map_or("object", |k| k.name);
        Err(self.error(format!(
            "Incorrect object type '{}', expected '{}'",
            obj.type_name(),
            expected
        )))
    }

    pub fn object(&self) -> Result<Option<ObjectPtr>> {
        match &self.data {
            FieldData::Object(obj) => Ok(obj.clone()),
            _ => Err(self.error("is not an object field")),
        }
    }

    pub fn set_object(&mut self, obj: Option<ObjectPtr>) -> Result<()> {
        if self.spec.value_type != ValueType::Object {
            return Err(self.error("is not an object field"));
        }
        if let Some(obj) = &obj {
            self.check_object(obj)?;
        }
        self.store(FieldData::Object(obj));
        Ok(())
    }

    pub fn objects(&self) -> Result<&[ObjectPtr]> {
        match &self.data {
            FieldData::ObjectList(list) => Ok(list),
            _ => Err(self.error("is not an object list field")),
        }
    }

    fn objects_mut(&mut self) -> Result<&mut Vec<ObjectPtr>> {
        match &mut self.data {
            FieldData::ObjectList(list) => {
                self.was_set = true;
                Ok(list)
            }
            _ => Err(EmdError::field(self.spec.name, "is not an object list field")),
        }
    }

    pub fn set_objects(&mut self, objs: Vec<ObjectPtr>) -> Result<()> {
        if self.spec.value_type != ValueType::ObjectList {
            return Err(self.error("is not an object list field"));
        }
        for obj in &objs {
            self.check_object(obj)?;
        }
        self.store(FieldData::ObjectList(objs));
        Ok(())
    }

    pub fn add_object(&mut self, obj: ObjectPtr) -> Result<()> {
        self.objects()?;
        self.check_object(&obj)?;
        self.objects_mut()?.push(obj);
        Ok(())
    }

    pub fn insert_object(&mut self, index: usize, obj: ObjectPtr) -> Result<()> {
        let len = self.objects()?.len();
        if index > len {
            return Err(self.error(format!("insert index {} beyond {} objects", index, len)));
        }
        self.check_object(&obj)?;
        self.objects_mut()?.insert(index, obj);
        Ok(())
    }

    pub fn remove_object(&mut self, index: usize) -> Result<ObjectPtr> {
        let len = self.objects()?.len();
        if index >= len {
            return Err(self.error(format!("index {} out of range for {} objects", index, len)));
        }
        Ok(self.objects_mut()?.remove(index))
    }

    pub fn replace_object(&mut self, index: usize, obj: ObjectPtr) -> Result<()> {
        let len = self.objects()?.len();
        if index >= len {
            return Err(self.error(format!("index {} out of range for {} objects", index, len)));
        }
        self.check_object(&obj)?;
        self.objects_mut()?[index] = obj;
        Ok(())
    }

    pub fn clear_objects(&mut self) -> Result<()> {
        self.objects_mut()?.clear();
        Ok(())
    }
}
