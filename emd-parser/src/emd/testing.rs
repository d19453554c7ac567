//! Fixture object types
//!
//! A small family of object types exercising every field kind, shared by the
//! unit tests and the integration tests under `tests/`:
//!
//! - [`Simple`]: one field of every primitive kind, plus two lists.
//! - [`Derived`]: `Simple`'s fields plus an object, an object list and a
//!   hidden field. A `Derived` is-a `Simple`.
//! - [`Other`]: no fields; used to provoke object type errors.
//! - [`Full`]: every vector, matrix and geometric value type.
//! - [`Unscoped`], [`NameRequired`], [`Range`]: exercise the parser hooks.

use super::error::Result;
use super::field_type::Flags;
use super::math::{
    Anglef, CircleArc, Color, IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Plane, Rotationf, UVec2,
    UVec3, UVec4, Vec2, Vec3, Vec4,
};
use super::object::{Object, ObjectBase};
use super::registry::Registry;
use super::spec::{FieldSpec, SpecBuilder};
use once_cell::sync::Lazy;
use std::any::TypeId;

crate::field_enum! {
    pub enum SimpleEnum { E1 => "kE1", E2 => "kE2", E3 => "kE3" }
}

crate::field_enum! {
    pub enum FlagEnum { F1 => "kF1", F2 => "kF2", F3 => "kF3" }
}

/// Input setting every field of a [`Simple`] named `TestObj`.
pub const FULL_SIMPLE_INPUT: &str = "# Full-line comment
Simple \"TestObj\" {
  bool_val:  true,
  int_val:   -13, # In-line comment
  uint_val:  67,
  float_val: 3.4,
  str_val:   \"A quoted string\",
  enum_val:  \"kE2\",
  flag_val:  \"kF3| kF1\",
  vec3f_val: 2 3 4.5,
  color_val: .2 .3 .4 1,
  angle_val: 90,
  rot_val:   0 1 0 180,
  ints_val:  [6, 5, -2],
  strs_val:  [\"A\", \"B\"],
}
";

static SIMPLE_SPECS: Lazy<Vec<FieldSpec>> = Lazy::new(|| {
    SpecBuilder::new()
        .add::<bool>("bool_val")
        .add::<i32>("int_val")
        .add::<u32>("uint_val")
        .add::<f32>("float_val")
        .add::<String>("str_val")
        .add::<SimpleEnum>("enum_val")
        .add::<Flags<FlagEnum>>("flag_val")
        .add::<Vec3>("vec3f_val")
        .add::<Color>("color_val")
        .add::<Anglef>("angle_val")
        .add::<Rotationf>("rot_val")
        .add_list::<i32>("ints_val")
        .add_list::<String>("strs_val")
        .build()
});

static DERIVED_SPECS: Lazy<Vec<FieldSpec>> = Lazy::new(|| {
    SpecBuilder::new()
        .add_object::<Simple>("simple")
        .add_object_list::<Simple>("simple_list")
        .add::<i32>("hidden_int")
        .with_default(12)
        .hidden()
        .build()
});

static FULL_SPECS: Lazy<Vec<FieldSpec>> = Lazy::new(|| {
    SpecBuilder::new()
        .add::<bool>("b")
        .add::<i32>("i")
        .add::<u32>("u")
        .add::<u32>("z")
        .add::<f32>("f")
        .add::<String>("s")
        .add::<SimpleEnum>("e")
        .add::<Flags<FlagEnum>>("g")
        .add::<Vec2>("v2f")
        .add::<Vec3>("v3f")
        .add::<Vec4>("v4f")
        .add::<IVec2>("v2i")
        .add::<IVec3>("v3i")
        .add::<IVec4>("v4i")
        .add::<UVec2>("v2ui")
        .add::<UVec3>("v3ui")
        .add::<UVec4>("v4ui")
        .add::<Vec2>("p2f")
        .add::<Vec3>("p3f")
        .add::<IVec2>("p2i")
        .add::<Color>("c")
        .add::<Anglef>("a")
        .add::<Rotationf>("r")
        .add::<Mat2>("m2")
        .add::<Mat3>("m3")
        .add::<Mat4>("m4")
        .add::<Plane>("pl")
        .add::<CircleArc>("ca")
        .build()
});

static UNSCOPED_SPECS: Lazy<Vec<FieldSpec>> = Lazy::new(|| {
    SpecBuilder::new()
        .add_object::<Simple>("simple")
        .add_object_list::<Simple>("simple_list")
        .build()
});

static RANGE_SPECS: Lazy<Vec<FieldSpec>> =
    Lazy::new(|| SpecBuilder::new().add::<i32>("min").add::<i32>("max").build());

/// Every primitive field kind.
#[derive(Debug, Default)]
pub struct Simple {
    base: ObjectBase,
    /// How many times `creation_done` ran.
    pub creation_count: u32,
}

impl Object for Simple {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn add_fields(&mut self) {
        self.base.add_fields(&SIMPLE_SPECS);
    }

    fn creation_done(&mut self) {
        self.creation_count += 1;
    }
}

/// [`Simple`] extended with object-valued fields.
#[derive(Debug, Default)]
pub struct Derived {
    base: ObjectBase,
}

impl Object for Derived {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn add_fields(&mut self) {
        self.base.add_fields(&SIMPLE_SPECS);
        self.base.add_fields(&DERIVED_SPECS);
    }

    fn is_a(&self, type_id: TypeId) -> bool {
        type_id == TypeId::of::<Derived>() || type_id == TypeId::of::<Simple>()
    }
}

#[derive(Debug, Default)]
pub struct Other {
    base: ObjectBase,
}

impl Object for Other {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

/// Every vector, matrix and geometric value type.
#[derive(Debug, Default)]
pub struct Full {
    base: ObjectBase,
}

impl Object for Full {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn add_fields(&mut self) {
        self.base.add_fields(&FULL_SPECS);
    }
}

/// Does not open a scope of its own.
#[derive(Debug, Default)]
pub struct Unscoped {
    base: ObjectBase,
}

impl Object for Unscoped {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn add_fields(&mut self) {
        self.base.add_fields(&UNSCOPED_SPECS);
    }

    fn is_scoped(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct NameRequired {
    base: ObjectBase,
}

impl Object for NameRequired {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn is_name_required(&self) -> bool {
        true
    }
}

/// Valid only while `min <= max`.
#[derive(Debug, Default)]
pub struct Range {
    base: ObjectBase,
}

impl Object for Range {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn add_fields(&mut self) {
        self.base.add_fields(&RANGE_SPECS);
    }

    fn is_valid(&self, details: &mut String) -> bool {
        let min = self.base.get::<i32>("min").unwrap_or_default();
        let max = self.base.get::<i32>("max").unwrap_or_default();
        if min > max {
            *details = format!("min {} exceeds max {}", min, max);
            return false;
        }
        true
    }
}

/// Registers every fixture type under its struct name.
pub fn register_test_types(registry: &mut Registry) -> Result<()> {
    registry.add_type::<Simple>("Simple")?;
    registry.add_type::<Derived>("Derived")?;
    registry.add_type::<Other>("Other")?;
    registry.add_type::<Full>("Full")?;
    registry.add_type::<Unscoped>("Unscoped")?;
    registry.add_type::<NameRequired>("NameRequired")?;
    registry.add_type::<Range>("Range")?;
    Ok(())
}
