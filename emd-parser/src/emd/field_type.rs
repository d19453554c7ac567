//! Typed access to field storage
//!
//! [`FieldType`] binds a Rust type to the [`ValueType`] and arity it occupies
//! in a field, and converts between the type and the stored [`Value`]s. It is
//! what [`SpecBuilder`](super::spec::SpecBuilder) uses to declare a field and
//! what [`Field::get_value`](super::field::Field::get_value) uses to read one
//! back, so a field declared as `Vec3` is three floats on both paths.
//!
//! Enumerations are stored as their quoted names. Declare them with
//! [`field_enum!`](crate::field_enum) and use [`Flags`] for bit sets of them.

use super::math::{
    Anglef, CircleArc, Color, IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Plane, Rotationf, UVec2,
    UVec3, UVec4, Vec2, Vec3, Vec4,
};
use super::value::{Value, ValueFormat, ValueType};
use std::fmt;
use std::marker::PhantomData;

/// A Rust type that can live in a field.
pub trait FieldType: Sized + Clone + Default {
    /// Kind of every stored primitive.
    const VALUE_TYPE: ValueType;
    /// Number of primitives one value occupies.
    const COUNT: usize;

    fn format() -> ValueFormat {
        ValueFormat::Plain
    }

    fn to_values(&self) -> Vec<Value>;

    /// Rebuilds the value; `None` if the slice has the wrong kind or length.
    fn from_values(values: &[Value]) -> Option<Self>;
}

macro_rules! impl_scalar_field_type {
    ($ty:ty, $vt:expr, $variant:ident, $as:ident) => {
        impl FieldType for $ty {
            const VALUE_TYPE: ValueType = $vt;
            const COUNT: usize = 1;

            fn to_values(&self) -> Vec<Value> {
                vec![Value::$variant(*self)]
            }

            fn from_values(values: &[Value]) -> Option<Self> {
                match values {
                    [v] => v.$as(),
                    _ => None,
                }
            }
        }
    };
}

impl_scalar_field_type!(bool, ValueType::Bool, Bool, as_bool);
impl_scalar_field_type!(i32, ValueType::Integer, Integer, as_i32);
impl_scalar_field_type!(u32, ValueType::UInteger, UInteger, as_u32);
impl_scalar_field_type!(f32, ValueType::Float, Float, as_f32);

impl FieldType for String {
    const VALUE_TYPE: ValueType = ValueType::String;
    const COUNT: usize = 1;

    fn to_values(&self) -> Vec<Value> {
        vec![Value::String(self.clone())]
    }

    fn from_values(values: &[Value]) -> Option<Self> {
        match values {
            [v] => v.as_str().map(str::to_string),
            _ => None,
        }
    }
}

fn collect_array<T, const N: usize>(
    values: &[Value],
    get: impl Fn(&Value) -> Option<T>,
) -> Option<[T; N]> {
    let elems = values.iter().map(get).collect::<Option<Vec<T>>>()?;
    elems.try_into().ok()
}

macro_rules! impl_vector_field_type {
    ($ty:ty, $vt:expr, $n:expr, $variant:ident, $as:ident) => {
        impl FieldType for $ty {
            const VALUE_TYPE: ValueType = $vt;
            const COUNT: usize = $n;

            fn to_values(&self) -> Vec<Value> {
                self.to_array().iter().map(|v| Value::$variant(*v)).collect()
            }

            fn from_values(values: &[Value]) -> Option<Self> {
                collect_array::<_, $n>(values, Value::$as).map(<$ty>::from_array)
            }
        }
    };
}

impl_vector_field_type!(Vec2, ValueType::Float, 2, Float, as_f32);
impl_vector_field_type!(Vec3, ValueType::Float, 3, Float, as_f32);
impl_vector_field_type!(Vec4, ValueType::Float, 4, Float, as_f32);
impl_vector_field_type!(IVec2, ValueType::Integer, 2, Integer, as_i32);
impl_vector_field_type!(IVec3, ValueType::Integer, 3, Integer, as_i32);
impl_vector_field_type!(IVec4, ValueType::Integer, 4, Integer, as_i32);
impl_vector_field_type!(UVec2, ValueType::UInteger, 2, UInteger, as_u32);
impl_vector_field_type!(UVec3, ValueType::UInteger, 3, UInteger, as_u32);
impl_vector_field_type!(UVec4, ValueType::UInteger, 4, UInteger, as_u32);

// Matrices are written row by row; glam stores columns.
macro_rules! impl_matrix_field_type {
    ($ty:ty, $n:expr) => {
        impl FieldType for $ty {
            const VALUE_TYPE: ValueType = ValueType::Float;
            const COUNT: usize = $n;

            fn to_values(&self) -> Vec<Value> {
                self.transpose()
                    .to_cols_array()
                    .iter()
                    .map(|v| Value::Float(*v))
                    .collect()
            }

            fn from_values(values: &[Value]) -> Option<Self> {
                collect_array::<_, $n>(values, Value::as_f32)
                    .map(|rows| <$ty>::from_cols_array(&rows).transpose())
            }
        }
    };
}

impl_matrix_field_type!(Mat2, 4);
impl_matrix_field_type!(Mat3, 9);
impl_matrix_field_type!(Mat4, 16);

fn floats(values: &[f32]) -> Vec<Value> {
    values.iter().map(|v| Value::Float(*v)).collect()
}

impl FieldType for Color {
    const VALUE_TYPE: ValueType = ValueType::Float;
    const COUNT: usize = 4;

    fn format() -> ValueFormat {
        ValueFormat::Color
    }

    fn to_values(&self) -> Vec<Value> {
        floats(&self.to_array())
    }

    fn from_values(values: &[Value]) -> Option<Self> {
        collect_array::<_, 4>(values, Value::as_f32).map(|[r, g, b, a]| Color::new(r, g, b, a))
    }
}

impl FieldType for Anglef {
    const VALUE_TYPE: ValueType = ValueType::Float;
    const COUNT: usize = 1;

    fn to_values(&self) -> Vec<Value> {
        floats(&[self.degrees()])
    }

    fn from_values(values: &[Value]) -> Option<Self> {
        f32::from_values(values).map(Anglef::from_degrees)
    }
}

impl FieldType for Rotationf {
    const VALUE_TYPE: ValueType = ValueType::Float;
    const COUNT: usize = 4;

    fn to_values(&self) -> Vec<Value> {
        floats(&[self.axis.x, self.axis.y, self.axis.z, self.angle.degrees()])
    }

    fn from_values(values: &[Value]) -> Option<Self> {
        collect_array::<_, 4>(values, Value::as_f32).map(|[x, y, z, deg]| {
            Rotationf::from_axis_angle(Vec3::new(x, y, z), Anglef::from_degrees(deg))
        })
    }
}

impl FieldType for Plane {
    const VALUE_TYPE: ValueType = ValueType::Float;
    const COUNT: usize = 4;

    fn to_values(&self) -> Vec<Value> {
        floats(&[self.normal.x, self.normal.y, self.normal.z, self.distance])
    }

    fn from_values(values: &[Value]) -> Option<Self> {
        collect_array::<_, 4>(values, Value::as_f32)
            .map(|[x, y, z, d]| Plane::new(Vec3::new(x, y, z), d))
    }
}

impl FieldType for CircleArc {
    const VALUE_TYPE: ValueType = ValueType::Float;
    const COUNT: usize = 2;

    fn to_values(&self) -> Vec<Value> {
        floats(&[self.start_angle.degrees(), self.arc_angle.degrees()])
    }

    fn from_values(values: &[Value]) -> Option<Self> {
        collect_array::<_, 2>(values, Value::as_f32).map(|[start, arc]| {
            CircleArc::new(Anglef::from_degrees(start), Anglef::from_degrees(arc))
        })
    }
}

/// An enumeration whose values are written as their names.
pub trait EnumValue: Copy + Eq + fmt::Debug + 'static {
    const NAMES: &'static [&'static str];
    const VALUES: &'static [Self];

    fn index(self) -> usize {
        Self::VALUES.iter().position(|v| *v == self).unwrap_or(0)
    }

    fn name(self) -> &'static str {
        Self::NAMES.get(self.index()).copied().unwrap_or("")
    }

    fn from_name(name: &str) -> Option<Self> {
        let index = Self::NAMES.iter().position(|n| *n == name)?;
        Self::VALUES.get(index).copied()
    }
}

pub fn enum_to_values<E: EnumValue>(value: E) -> Vec<Value> {
    vec![Value::String(value.name().to_string())]
}

pub fn enum_from_values<E: EnumValue>(values: &[Value]) -> Option<E> {
    match values {
        [Value::String(s)] => E::from_name(s),
        _ => None,
    }
}

/// Validates `a|b|c` against `names`, returning the set in declaration
/// order. Whitespace around each name is ignored; blank text is the empty set.
pub fn normalize_flag_text(names: &[&str], text: &str) -> Option<String> {
    let mut present = vec![false; names.len()];
    if !text.trim().is_empty() {
        for part in text.split('|') {
            let index = names.iter().position(|n| *n == part.trim())?;
            present[index] = true;
        }
    }
    let set: Vec<&str> = names
        .iter()
        .zip(present)
        .filter_map(|(name, on)| on.then_some(*name))
        .collect();
    Some(set.join("|"))
}

/// Declares an enumeration usable as a field type.
///
/// ```ignore
/// field_enum! {
///     pub enum Shading { Flat => "kFlat", Smooth => "kSmooth" }
/// }
/// ```
///
/// The first variant is the default.
#[macro_export]
macro_rules! field_enum {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::emd::field_type::EnumValue for $name {
            const NAMES: &'static [&'static str] = &[$($text),+];
            const VALUES: &'static [Self] = &[$($name::$variant),+];
        }

        impl Default for $name {
            fn default() -> Self {
                <Self as $crate::emd::field_type::EnumValue>::VALUES[0]
            }
        }

        impl $crate::emd::field_type::FieldType for $name {
            const VALUE_TYPE: $crate::emd::value::ValueType = $crate::emd::value::ValueType::String;
            const COUNT: usize = 1;

            fn format() -> $crate::emd::value::ValueFormat {
                $crate::emd::value::ValueFormat::Enum(
                    <Self as $crate::emd::field_type::EnumValue>::NAMES,
                )
            }

            fn to_values(&self) -> Vec<$crate::emd::value::Value> {
                $crate::emd::field_type::enum_to_values(*self)
            }

            fn from_values(values: &[$crate::emd::value::Value]) -> Option<Self> {
                $crate::emd::field_type::enum_from_values(values)
            }
        }
    };
}

/// A set of enum values, written as `"a|b"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags<E: EnumValue> {
    bits: u64,
    marker: PhantomData<E>,
}

impl<E: EnumValue> Flags<E> {
    pub fn new() -> Self {
        Flags {
            bits: 0,
            marker: PhantomData,
        }
    }

    pub fn from_members(values: &[E]) -> Self {
        let mut flags = Self::new();
        for v in values {
            flags.set(*v);
        }
        flags
    }

    pub fn set(&mut self, value: E) {
        self.bits |= 1 << value.index();
    }

    pub fn reset(&mut self, value: E) {
        self.bits &= !(1 << value.index());
    }

    pub fn has(&self, value: E) -> bool {
        self.bits & (1 << value.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Members in declaration order.
    pub fn members(&self) -> Vec<E> {
        E::VALUES.iter().copied().filter(|v| self.has(*v)).collect()
    }

    pub fn to_text(&self) -> String {
        self.members()
            .iter()
            .map(|v| v.name())
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn from_text(text: &str) -> Option<Self> {
        let normalized = normalize_flag_text(E::NAMES, text)?;
        let mut flags = Self::new();
        for name in normalized.split('|').filter(|n| !n.is_empty()) {
            flags.set(E::from_name(name)?);
        }
        Some(flags)
    }
}

impl<E: EnumValue> Default for Flags<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EnumValue> FieldType for Flags<E> {
    const VALUE_TYPE: ValueType = ValueType::String;
    const COUNT: usize = 1;

    fn format() -> ValueFormat {
        ValueFormat::Flags(E::NAMES)
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::String(self.to_text())]
    }

    fn from_values(values: &[Value]) -> Option<Self> {
        match values {
            [Value::String(s)] => Flags::from_text(s),
            _ => None,
        }
    }
}
