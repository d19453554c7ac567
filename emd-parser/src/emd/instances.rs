//! Instance pooling
//!
//! An [`InstanceStore`] holds one original object per concrete type and hands
//! out deep clones of it, reusing released instances before cloning new ones.

use super::error::{EmdError, Result};
use super::object::{Object, ObjectPtr};
use std::any::TypeId;
use std::collections::HashMap;

#[derive(Debug)]
struct Original {
    object: ObjectPtr,
    count: usize,
}

#[derive(Debug, Default)]
pub struct InstanceStore {
    originals: HashMap<TypeId, Original>,
    available: HashMap<TypeId, Vec<ObjectPtr>>,
}

impl InstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all originals and available instances.
    pub fn reset(&mut self) {
        self.originals.clear();
        self.available.clear();
    }

    /// Stores the object that instances of `T` are cloned from. It must be a
    /// `T`; it is never handed out itself.
    pub fn add_original<T: Object>(&mut self, original: ObjectPtr) -> Result<()> {
        if !original.is::<T>() {
            return Err(EmdError::Object(format!(
                "Original of type '{}' does not match the requested type",
                original.type_name()
            )));
        }
        self.originals.insert(
            TypeId::of::<T>(),
            Original {
                object: original,
                count: 0,
            },
        );
        Ok(())
    }

    pub fn has_original<T: Object>(&self) -> bool {
        self.originals.contains_key(&TypeId::of::<T>())
    }

    /// A released instance of `T` if there is one, otherwise a new deep clone
    /// of the original named `<TypeName>_<n>`.
    pub fn acquire<T: Object>(&mut self) -> Result<ObjectPtr> {
        let key = TypeId::of::<T>();
        if let Some(instance) = self.available.get_mut(&key).and_then(Vec::pop) {
            return Ok(instance);
        }
        let original = self.originals.get_mut(&key).ok_or_else(|| {
            EmdError::Object(format!(
                "No original for instances of '{}'",
                std::any::type_name::<T>()
            ))
        })?;
        let name = format!("{}_{}", original.object.type_name(), original.count);
        original.count += 1;
        original.object.clone_typed::<T>(true, &name)
    }

    /// Makes `instance` available to a later `acquire`.
    pub fn release<T: Object>(&mut self, instance: ObjectPtr) {
        self.available
            .entry(TypeId::of::<T>())
            .or_default()
            .push(instance);
    }

    pub fn available_count<T: Object>(&self) -> usize {
        self.available.get(&TypeId::of::<T>()).map_or(0, Vec::len)
    }
}
