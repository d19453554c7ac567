//! Object snapshots: a plain, serializable copy of an object graph
//!
//! Snapshots exist for diagnostics and for asserting on whole graphs in tests
//! without walking fields by hand. Field values are stored in their emd text
//! form, so a snapshot compares equal exactly when the written text of the
//! fields would.

use super::value_text::format_field;
use crate::emd::field::FieldData;
use crate::emd::object::ObjectPtr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub type_name: String,
    pub name: String,
    pub is_clone: bool,
    /// Set primitive fields, by name, in emd text form.
    pub fields: BTreeMap<String, String>,
    /// Set object fields, by name. A single object is a one-element list.
    pub children: BTreeMap<String, Vec<ObjectSnapshot>>,
}

impl ObjectSnapshot {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn child(&self, name: &str, index: usize) -> Option<&ObjectSnapshot> {
        self.children.get(name).and_then(|list| list.get(index))
    }
}

/// Snapshots `obj` and everything it reaches. Shared objects are copied at
/// every place they appear. Hidden fields are included.
pub fn snapshot_object(obj: &ObjectPtr) -> ObjectSnapshot {
    let o = obj.borrow();
    let base = o.base();
    let mut fields = BTreeMap::new();
    let mut children = BTreeMap::new();

    for field in base.fields().iter().filter(|f| f.was_set()) {
        match field.data() {
            FieldData::Values(_) => {
                if let Some(text) = format_field(field) {
                    fields.insert(field.name().to_string(), text);
                }
            }
            FieldData::Object(child) => {
                let list = child.iter().map(snapshot_object).collect();
                children.insert(field.name().to_string(), list);
            }
            FieldData::ObjectList(list) => {
                let list = list.iter().map(snapshot_object).collect();
                children.insert(field.name().to_string(), list);
            }
        }
    }

    ObjectSnapshot {
        type_name: base.type_name().to_string(),
        name: base.name().to_string(),
        is_clone: base.is_clone(),
        fields,
        children,
    }
}

pub fn to_json(snapshot: &ObjectSnapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(snapshot)
}

pub fn from_json(json: &str) -> serde_json::Result<ObjectSnapshot> {
    serde_json::from_str(json)
}
