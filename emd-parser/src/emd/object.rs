//! Objects: the nodes of a parsed graph
//!
//! Concrete object types are plain structs that embed an [`ObjectBase`] and
//! implement [`Object`]. The base owns the instance's [`Field`]s, its type and
//! instance names and its lifecycle flags; the trait supplies the hooks the
//! parser consults (scoping, naming, validation, post-creation linking).
//!
//! ```ignore
//! #[derive(Default)]
//! struct Light { base: ObjectBase }
//!
//! impl Object for Light {
//!     fn base(&self) -> &ObjectBase { &self.base }
//!     fn base_mut(&mut self) -> &mut ObjectBase { &mut self.base }
//!     fn add_fields(&mut self) { self.base.add_fields(&LIGHT_SPECS) }
//! }
//! ```
//!
//! Objects are shared through [`ObjectPtr`]. A `USE` in the input, or the
//! same object assigned to two fields, yields two handles to one object.
//! Graphs are acyclic: an object can only reference objects that existed
//! before it.

use super::error::{EmdError, Result};
use super::field::{Field, FieldData};
use super::field_type::FieldType;
use super::spec::FieldSpec;
use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Gives trait objects access to their concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Kinds of change an object reports to its observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Appearance,
    Geometry,
    Graph,
    Transform,
}

/// Builds a new, field-bound instance of a registered type.
pub type CreationFunc = fn() -> ObjectPtr;

pub type Observer = Rc<dyn Fn(Change, &dyn Object)>;

/// A node of the object graph.
pub trait Object: AsAny + 'static {
    fn base(&self) -> &ObjectBase;
    fn base_mut(&mut self) -> &mut ObjectBase;

    /// Binds this type's fields. Types that extend another type's fields
    /// add those first.
    fn add_fields(&mut self) {}

    /// True if this object can stand in for type `type_id`, which is the
    /// case for its own type and any type whose fields it extends.
    fn is_a(&self, type_id: TypeId) -> bool {
        self.as_any().type_id() == type_id
    }

    /// Scoped objects bound the visibility of names declared inside them
    /// and may carry `CONSTANTS` and `TEMPLATES`.
    fn is_scoped(&self) -> bool {
        true
    }

    fn is_name_required(&self) -> bool {
        false
    }

    /// Checked after fields are populated. On failure, describe the
    /// problem in `details`.
    fn is_valid(&self, _details: &mut String) -> bool {
        true
    }

    /// Runs once all fields are set, for linking and derived state.
    fn creation_done(&mut self) {}

    /// Deep clones copy sub-objects only if they return true here;
    /// otherwise the sub-object is shared with the clone.
    fn should_deep_clone(&self) -> bool {
        true
    }

    /// Returns false if the change was suppressed.
    fn process_change(&self, change: Change, source: &dyn Object) -> bool {
        self.base().process_change(change, source)
    }
}

/// State common to every object.
#[derive(Default)]
pub struct ObjectBase {
    type_name: String,
    name: String,
    fields: Vec<Field>,
    is_template: bool,
    is_clone: bool,
    is_creation_done: bool,
    creator: Option<CreationFunc>,
    observers: Vec<(String, Observer)>,
    notifications_disabled: bool,
}

impl fmt::Debug for ObjectBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBase")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("is_template", &self.is_template)
            .field("is_clone", &self.is_clone)
            .finish()
    }
}

impl ObjectBase {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn is_template(&self) -> bool {
        self.is_template
    }

    pub(crate) fn set_is_template(&mut self, is_template: bool) {
        self.is_template = is_template;
    }

    pub fn is_clone(&self) -> bool {
        self.is_clone
    }

    pub fn is_creation_done(&self) -> bool {
        self.is_creation_done
    }

    pub(crate) fn set_identity(&mut self, type_name: &str, name: &str, creator: CreationFunc) {
        self.type_name = type_name.to_string();
        self.name = name.to_string();
        self.creator = Some(creator);
    }

    pub fn add_fields(&mut self, specs: &'static [FieldSpec]) {
        for spec in specs {
            self.add_field(spec);
        }
    }

    /// Binds one field. A second field with the same name is ignored.
    pub fn add_field(&mut self, spec: &'static FieldSpec) {
        if self.find_field(spec.name).is_some() {
            log::warn!(
                "field '{}' added twice to object of type '{}'",
                spec.name,
                self.type_name
            );
            return;
        }
        self.fields.push(Field::new(spec));
    }

    /// Fields in the order they were added.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn find_field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    fn unknown_field(&self, name: &str) -> EmdError {
        EmdError::field(
            name,
            format!("Unknown field in object of type '{}'", self.type_name),
        )
    }

    pub fn field(&self, name: &str) -> Result<&Field> {
        self.find_field(name).ok_or_else(|| self.unknown_field(name))
    }

    pub fn field_mut(&mut self, name: &str) -> Result<&mut Field> {
        match self.fields.iter().position(|f| f.name() == name) {
            Some(index) => Ok(&mut self.fields[index]),
            None => Err(self.unknown_field(name)),
        }
    }

    /// Shorthand for `field(name)?.get_value()`.
    pub fn get<T: FieldType>(&self, name: &str) -> Result<T> {
        self.field(name)?.get_value()
    }

    /// Shorthand for `field_mut(name)?.set_value(value)`.
    pub fn set<T: FieldType>(&mut self, name: &str, value: T) -> Result<()> {
        self.field_mut(name)?.set_value(value)
    }

    pub fn was_any_field_set(&self) -> bool {
        self.fields.iter().any(Field::was_set)
    }

    /// Registers `observer` under `key`, replacing any previous one.
    pub fn add_observer(&mut self, key: &str, observer: Observer) {
        self.remove_observer(key);
        self.observers.push((key.to_string(), observer));
    }

    pub fn remove_observer(&mut self, key: &str) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(k, _)| k != key);
        self.observers.len() != before
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.notifications_disabled = !enabled;
    }

    pub fn notifications_enabled(&self) -> bool {
        !self.notifications_disabled
    }

    /// Forwards `change` to every observer unless notification is disabled.
    pub fn process_change(&self, change: Change, source: &dyn Object) -> bool {
        if self.notifications_disabled {
            return false;
        }
        for (_, observer) in &self.observers {
            observer(change, source);
        }
        true
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Shared handle to an object.
#[derive(Clone)]
pub struct ObjectPtr(Rc<RefCell<dyn Object>>);

impl ObjectPtr {
    /// Wraps `object` and binds its fields. The type name defaults to the
    /// Rust type name; the registry replaces it with the registered one.
    pub fn new<T: Object>(object: T) -> Self {
        let ptr = ObjectPtr(Rc::new(RefCell::new(object)));
        {
            let mut obj = ptr.borrow_mut();
            if obj.base().type_name.is_empty() {
                obj.base_mut().type_name = short_type_name::<T>().to_string();
            }
            obj.add_fields();
        }
        ptr
    }

    pub fn borrow(&self) -> Ref<'_, dyn Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, dyn Object> {
        self.0.borrow_mut()
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &ObjectPtr) -> bool {
        self.addr() == other.addr()
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn is<T: Object>(&self) -> bool {
        let obj = self.borrow();
        (*obj).as_any().is::<T>()
    }

    pub fn downcast_ref<T: Object>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.0.borrow(), |o| o.as_any().downcast_ref::<T>()).ok()
    }

    pub fn downcast_mut<T: Object>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.0.borrow_mut(), |o| o.as_any_mut().downcast_mut::<T>()).ok()
    }

    pub fn type_name(&self) -> String {
        self.borrow().base().type_name().to_string()
    }

    pub fn name(&self) -> String {
        self.borrow().base().name().to_string()
    }

    /// Copies this object. A shallow clone shares sub-objects with the
    /// original; a deep clone copies them too, once per distinct sub-object,
    /// so sharing inside the copied subgraph is kept. The clone is named
    /// `name`, marked as a clone, and has `creation_done` run on it.
    pub fn clone_object(&self, is_deep: bool, name: &str) -> Result<ObjectPtr> {
        let mut ctx = CloneContext::default();
        let clone = clone_into(self, is_deep, name, &mut ctx)?;
        complete_creation(&clone);
        Ok(clone)
    }

    /// A deep clone whose `creation_done` is left for the caller, which
    /// still has fields to apply.
    pub(crate) fn clone_for_parsing(&self, name: &str) -> Result<ObjectPtr> {
        let mut ctx = CloneContext::default();
        clone_into(self, true, name, &mut ctx)
    }

    /// Like [`clone_object`](Self::clone_object), but fails unless the
    /// object is a `T`.
    pub fn clone_typed<T: Object>(&self, is_deep: bool, name: &str) -> Result<ObjectPtr> {
        if !self.is::<T>() {
            return Err(EmdError::Object(format!(
                "Cannot clone object of type '{}' as '{}'",
                self.type_name(),
                short_type_name::<T>()
            )));
        }
        self.clone_object(is_deep, name)
    }

    /// Overwrites this object's fields with those of `from`, which must have
    /// the same type. Set state travels with the data. Name, clone flag and
    /// observers stay as they are.
    pub fn copy_contents_from(&self, from: &ObjectPtr, is_deep: bool) -> Result<()> {
        if self.ptr_eq(from) {
            return Ok(());
        }
        let (src_type, dst_type) = (from.type_name(), self.type_name());
        if src_type != dst_type {
            return Err(EmdError::Object(format!(
                "Cannot copy contents of object of type '{}' into object of type '{}'",
                src_type, dst_type
            )));
        }
        let fields = from.borrow().base().fields.clone();
        let mut ctx = CloneContext::default();
        let copied = copy_field_data(&fields, is_deep, &mut ctx)?;
        store_fields(self.borrow_mut().base_mut(), &fields, copied);
        log::trace!("copied contents of {:?} into {:?} (deep: {})", from, self, is_deep);
        Ok(())
    }

    /// Reports `change` with this object as the source.
    pub fn notify(&self, change: Change) -> bool {
        let obj = self.borrow();
        obj.process_change(change, &*obj)
    }
}

impl fmt::Debug for ObjectPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(obj) => write!(
                f,
                "{} \"{}\" @{:#x}",
                obj.base().type_name(),
                obj.base().name(),
                self.addr()
            ),
            Err(_) => write!(f, "<borrowed> @{:#x}", self.addr()),
        }
    }
}

/// Gives a new instance from `creator` its registered identity.
pub(crate) fn instantiate(creator: CreationFunc, type_name: &str, name: &str) -> ObjectPtr {
    let obj = creator();
    obj.borrow_mut()
        .base_mut()
        .set_identity(type_name, name, creator);
    obj
}

/// Runs the `creation_done` hook and records that it ran.
pub(crate) fn complete_creation(obj: &ObjectPtr) {
    let mut o = obj.borrow_mut();
    o.creation_done();
    o.base_mut().is_creation_done = true;
}

/// Originals already copied during one deep clone, keyed by address.
#[derive(Default)]
struct CloneContext {
    clones: HashMap<usize, ObjectPtr>,
}

fn clone_into(
    src: &ObjectPtr,
    is_deep: bool,
    name: &str,
    ctx: &mut CloneContext,
) -> Result<ObjectPtr> {
    let (creator, type_name, fields) = {
        let obj = src.borrow();
        let base = obj.base();
        let creator = base.creator.ok_or_else(|| {
            EmdError::Object(format!(
                "Object of type '{}' was not created through a registry and cannot be cloned",
                base.type_name
            ))
        })?;
        (creator, base.type_name.clone(), base.fields.clone())
    };

    let copied = copy_field_data(&fields, is_deep, ctx)?;
    let clone = instantiate(creator, &type_name, name);
    {
        let mut obj = clone.borrow_mut();
        let base = obj.base_mut();
        base.is_clone = true;
        store_fields(base, &fields, copied);
    }
    log::trace!("cloned {:?} into {:?} (deep: {})", src, clone, is_deep);
    Ok(clone)
}

/// The data of each of `fields`, with sub-objects copied when `is_deep`.
fn copy_field_data(
    fields: &[Field],
    is_deep: bool,
    ctx: &mut CloneContext,
) -> Result<Vec<FieldData>> {
    fields
        .iter()
        .map(|field| {
            Ok(match field.data() {
                FieldData::Object(Some(child)) if is_deep => {
                    FieldData::Object(Some(deep_clone_child(child, ctx)?))
                }
                FieldData::ObjectList(list) if is_deep => FieldData::ObjectList(
                    list.iter()
                        .map(|child| deep_clone_child(child, ctx))
                        .collect::<Result<_>>()?,
                ),
                other => other.clone(),
            })
        })
        .collect()
}

fn store_fields(base: &mut ObjectBase, fields: &[Field], copied: Vec<FieldData>) {
    for (field, data) in fields.iter().zip(copied) {
        if let Some(dst) = base.find_field_mut(field.name()) {
            dst.copy_state_from(field, data);
        }
    }
}

fn deep_clone_child(child: &ObjectPtr, ctx: &mut CloneContext) -> Result<ObjectPtr> {
    if !child.borrow().should_deep_clone() {
        return Ok(child.clone());
    }
    if let Some(existing) = ctx.clones.get(&child.addr()) {
        return Ok(existing.clone());
    }
    let name = child.name();
    let copy = clone_into(child, true, &name, ctx)?;
    complete_creation(&copy);
    ctx.clones.insert(child.addr(), copy.clone());
    Ok(copy)
}
