//! Object type registry
//!
//! Maps type names, as they appear in input text, to creation functions. A
//! registry is an ordinary value handed to the [`Parser`](super::parsing::Parser),
//! so tests and applications each build the set of types they need.

use super::error::{EmdError, Result};
use super::object::{complete_creation, instantiate, CreationFunc, Object, ObjectPtr};
use std::any::TypeId;
use std::collections::HashMap;

fn create<T: Object + Default>() -> ObjectPtr {
    ObjectPtr::new(T::default())
}

/// Registry of object types that can be created by name.
#[derive(Debug, Default)]
pub struct Registry {
    creators: HashMap<String, CreationFunc>,
    type_names: HashMap<TypeId, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `type_name`. Registering a name twice is an error.
    pub fn add_type<T: Object + Default>(&mut self, type_name: &str) -> Result<()> {
        if self.creators.contains_key(type_name) {
            return Err(EmdError::Registry(format!(
                "Object type registered more than once: '{}'",
                type_name
            )));
        }
        log::debug!("registering object type '{}'", type_name);
        self.creators.insert(type_name.to_string(), create::<T>);
        self.type_names
            .insert(TypeId::of::<T>(), type_name.to_string());
        Ok(())
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        self.creators.contains_key(type_name)
    }

    /// The name `T` was registered under.
    pub fn type_name_of<T: Object>(&self) -> Option<&str> {
        self.type_names.get(&TypeId::of::<T>()).map(String::as_str)
    }

    /// Creates a complete object of the named type.
    pub fn create_object_of_type(&self, type_name: &str, name: &str) -> Result<ObjectPtr> {
        let obj = self.create_for_parsing(type_name, name)?;
        complete_creation(&obj);
        Ok(obj)
    }

    /// Creates a complete object of type `T`.
    pub fn create_object<T: Object>(&self, name: &str) -> Result<ObjectPtr> {
        let type_name = self.type_name_of::<T>().ok_or_else(|| {
            EmdError::Registry(format!(
                "Unknown object with typeid '{}'",
                std::any::type_name::<T>()
            ))
        })?;
        self.create_object_of_type(type_name, name)
    }

    /// Creates an object whose fields are still to be filled in; the caller
    /// runs `creation_done` once they are.
    pub(crate) fn create_for_parsing(&self, type_name: &str, name: &str) -> Result<ObjectPtr> {
        let creator = self.creators.get(type_name).ok_or_else(|| {
            EmdError::Registry(format!("Unknown object type '{}'", type_name))
        })?;
        Ok(instantiate(*creator, type_name, name))
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.creators.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn type_count(&self) -> usize {
        self.creators.len()
    }

    pub fn clear(&mut self) {
        self.creators.clear();
        self.type_names.clear();
    }
}
