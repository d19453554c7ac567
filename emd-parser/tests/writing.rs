//! Writing object graphs back to text.

use emd_parser::emd::formats::{snapshot_object, write_to_string, Writer, WriterOptions};
use emd_parser::emd::math::{
    Anglef, CircleArc, Color, IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, Plane, Rotationf, UVec2,
    UVec3, UVec4, Vec2, Vec3, Vec4,
};
use emd_parser::emd::testing::{register_test_types, Derived, FlagEnum, Full, Simple, SimpleEnum};
use emd_parser::emd::{Flags, Object, ObjectPtr, Parser, Registry};

fn registry() -> Registry {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut registry = Registry::new();
    register_test_types(&mut registry).unwrap();
    registry
}

fn write(obj: &ObjectPtr) -> String {
    write_to_string(obj, WriterOptions::default()).unwrap()
}

#[test]
fn test_write_derived() {
    let registry = registry();
    let dp = registry.create_object::<Derived>("").unwrap();
    let sp0 = registry.create_object::<Simple>("").unwrap();
    let sp1 = registry.create_object::<Simple>("").unwrap();
    let sp2 = registry.create_object::<Simple>("").unwrap();

    sp0.borrow_mut().base_mut().set("int_val", 15).unwrap();
    sp1.borrow_mut().base_mut().set("float_val", 2.5f32).unwrap();
    sp2.borrow_mut()
        .base_mut()
        .set("str_val", "Ha!".to_string())
        .unwrap();

    {
        let mut o = dp.borrow_mut();
        let base = o.base_mut();
        base.set("bool_val", true).unwrap();
        base.set("int_val", -13).unwrap();
        base.set("uint_val", 123u32).unwrap();
        base.set("float_val", 6.5f32).unwrap();
        base.set("str_val", "A string".to_string()).unwrap();
        base.set("enum_val", SimpleEnum::E2).unwrap();
        base.set("flag_val", Flags::from_members(&[FlagEnum::F2])).unwrap();
        base.set("vec3f_val", Vec3::new(3.0, 4.0, 5.0)).unwrap();
        base.set("color_val", Color::new(0.2, 1.0, 0.5, 1.0)).unwrap();
        base.set("angle_val", Anglef::from_degrees(110.0)).unwrap();
        base.set(
            "rot_val",
            Rotationf::from_axis_angle(Vec3::X, Anglef::from_degrees(30.0)),
        )
        .unwrap();
        base.field_mut("ints_val").unwrap().set_values(&[3, -2]).unwrap();
        base.field_mut("strs_val")
            .unwrap()
            .set_values(&["Hello".to_string(), "There".to_string()])
            .unwrap();
        base.field_mut("simple").unwrap().set_object(Some(sp0)).unwrap();
        base.field_mut("simple_list")
            .unwrap()
            .set_objects(vec![sp1, sp2])
            .unwrap();
        base.set("hidden_int", 6).unwrap();
    }

    let expected = "Derived {
  bool_val: True,
  int_val: -13,
  uint_val: 123,
  float_val: 6.5,
  str_val: \"A string\",
  enum_val: \"kE2\",
  flag_val: \"kF2\",
  vec3f_val: 3 4 5,
  color_val: 0.2 1 0.5 1,
  angle_val: 110,
  rot_val: 1 0 0 30,
  ints_val: [3, -2],
  strs_val: [\"Hello\", \"There\"],
  simple: Simple {
    int_val: 15,
  },
  simple_list: [
    Simple {
      float_val: 2.5,
    },
    Simple {
      str_val: \"Ha!\",
    },
  ],
}
";
    assert_eq!(write(&dp), expected);
}

#[test]
fn test_write_full() {
    let registry = registry();
    let fp = registry.create_object::<Full>("").unwrap();
    {
        let mut o = fp.borrow_mut();
        let base = o.base_mut();
        base.set("b", true).unwrap();
        base.set("i", -13).unwrap();
        base.set("u", 123u32).unwrap();
        base.set("z", 567u32).unwrap();
        base.set("f", 6.5f32).unwrap();
        base.set("s", "A string".to_string()).unwrap();
        base.set("e", SimpleEnum::E2).unwrap();
        base.set("g", Flags::from_members(&[FlagEnum::F3, FlagEnum::F2]))
            .unwrap();
        base.set("v2f", Vec2::new(-3.5, 4.0)).unwrap();
        base.set("v3f", Vec3::new(-3.5, 4.0, 5.0)).unwrap();
        base.set("v4f", Vec4::new(-3.5, 4.0, 5.0, 6.0)).unwrap();
        base.set("v2i", IVec2::new(-3, 4)).unwrap();
        base.set("v3i", IVec3::new(-3, 4, 5)).unwrap();
        base.set("v4i", IVec4::new(-3, 4, 5, 6)).unwrap();
        base.set("v2ui", UVec2::new(3, 4)).unwrap();
        base.set("v3ui", UVec3::new(3, 4, 5)).unwrap();
        base.set("v4ui", UVec4::new(3, 4, 5, 6)).unwrap();
        base.set("p2f", Vec2::new(-3.5, 4.0)).unwrap();
        base.set("p3f", Vec3::new(-3.5, 4.0, 5.0)).unwrap();
        base.set("p2i", IVec2::new(-3, 4)).unwrap();
        base.set("c", Color::new(0.2, 1.0, 0.5, 1.0)).unwrap();
        base.set("a", Anglef::from_degrees(-40.0)).unwrap();
        base.set(
            "r",
            Rotationf::from_axis_angle(Vec3::X, Anglef::from_degrees(30.0)),
        )
        .unwrap();
        // Matrices are given row by row.
        base.set(
            "m2",
            Mat2::from_cols_array(&[1.0, 2.0, 3.0, 4.0]).transpose(),
        )
        .unwrap();
        base.set(
            "m3",
            Mat3::from_cols_array(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]).transpose(),
        )
        .unwrap();
        let m4: Vec<f32> = (1..=16).map(|v| v as f32).collect();
        base.set("m4", Mat4::from_cols_slice(&m4).transpose()).unwrap();
        base.set("pl", Plane::new(Vec3::Y, -4.5)).unwrap();
        base.set(
            "ca",
            CircleArc::new(Anglef::from_degrees(15.0), Anglef::from_degrees(-250.0)),
        )
        .unwrap();
    }

    let expected = "Full {
  b: True,
  i: -13,
  u: 123,
  z: 567,
  f: 6.5,
  s: \"A string\",
  e: \"kE2\",
  g: \"kF2|kF3\",
  v2f: -3.5 4,
  v3f: -3.5 4 5,
  v4f: -3.5 4 5 6,
  v2i: -3 4,
  v3i: -3 4 5,
  v4i: -3 4 5 6,
  v2ui: 3 4,
  v3ui: 3 4 5,
  v4ui: 3 4 5 6,
  p2f: -3.5 4,
  p3f: -3.5 4 5,
  p2i: -3 4,
  c: 0.2 1 0.5 1,
  a: -40,
  r: 1 0 0 30,
  m2: 1 2 3 4,
  m3: 1 2 3 4 5 6 7 8 9,
  m4: 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16,
  pl: 0 1 0 -4.5,
  ca: 15 -250,
}
";
    assert_eq!(write(&fp), expected);
}

#[test]
fn test_full_values_read_back() {
    let registry = registry();
    let input = "Full {
  m2: 1 2 3 4,
  v3ui: 0x10 010 3,
  pl: 0 1 0 -4.5,
}";
    let obj = Parser::new(&registry).parse_from_string(input).unwrap();
    let o = obj.borrow();
    let m2 = o.base().get::<Mat2>("m2").unwrap();
    // First row is 1 2.
    assert_eq!(m2.row(0), Vec2::new(1.0, 2.0));
    assert_eq!(m2.row(1), Vec2::new(3.0, 4.0));
    assert_eq!(o.base().get::<UVec3>("v3ui").unwrap(), UVec3::new(16, 8, 3));
    assert_eq!(o.base().get::<Plane>("pl").unwrap(), Plane::new(Vec3::Y, -4.5));
}

#[test]
fn test_shared_objects_round_trip() {
    let registry = registry();
    let input = "Derived \"Root\" {
  CONSTANTS: [ N: \"4\" ],
  TEMPLATES: [ Simple \"T\" { float_val: 1.5 } ],
  int_val: $N,
  simple: Simple \"S1\" { strs_val: [\"a b\", \"q\\\"uote\"] },
  simple_list: [
    USE \"S1\",
    CLONE \"T\" \"C1\" { int_val: 2 },
    Simple {},
  ],
}";
    let parsed = Parser::new(&registry).parse_from_string(input).unwrap();
    let text = write(&parsed);
    insta::assert_snapshot!(text, @r###"
    Derived "Root" {
      int_val: 4,
      simple: Simple "S1" {
        strs_val: ["a b", "q\"uote"],
      },
      simple_list: [
        USE "S1",
        Simple "C1" {
          int_val: 2,
          float_val: 1.5,
        },
        Simple {
        },
      ],
    }
    "###);

    let reparsed = Parser::new(&registry).parse_from_string(&text).unwrap();
    assert_eq!(write(&reparsed), text);
    let first = snapshot_object(&parsed);
    let second = snapshot_object(&reparsed);
    assert_eq!(first.fields, second.fields);
    assert_eq!(first.child("simple", 0), second.child("simple", 0));
    assert!(first.child("simple_list", 1).unwrap().is_clone);
    // Once written, a clone is an ordinary object.
    let c1 = second.child("simple_list", 1).unwrap();
    assert!(!c1.is_clone);
    assert_eq!(c1.field("float_val"), Some("1.5"));

    let list = reparsed
        .borrow()
        .base()
        .field("simple_list")
        .unwrap()
        .objects()
        .unwrap()
        .to_vec();
    let simple = reparsed
        .borrow()
        .base()
        .field("simple")
        .unwrap()
        .object()
        .unwrap()
        .unwrap();
    assert!(simple.ptr_eq(&list[0]));
}

#[test]
fn test_write_condition_and_options() {
    let registry = registry();
    let input = "Derived { simple_list: [Simple \"A\" {}, Simple \"B\" { int_val: 1 }] }";
    let obj = Parser::new(&registry).parse_from_string(input).unwrap();

    let mut writer = Writer::with_options(
        Vec::new(),
        WriterOptions {
            indent: 4,
            write_addresses: false,
        },
    );
    writer.set_write_condition(|obj: &dyn Object, is_pre: bool| !is_pre || obj.base().name() != "A");
    writer.write_object(&obj).unwrap();
    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(
        text,
        "Derived {\n    simple_list: [\n        Simple \"B\" {\n            int_val: 1,\n        },\n    ],\n}\n"
    );
}

#[test]
fn test_hidden_fields_are_not_written() {
    let registry = registry();
    let obj = Parser::new(&registry)
        .parse_from_string("Derived { hidden_int: 3, int_val: 1 }")
        .unwrap();
    let text = write(&obj);
    assert_eq!(text, "Derived {\n  int_val: 1,\n}\n");
    assert_eq!(snapshot_object(&obj).field("hidden_int"), Some("3"));
}

#[test]
fn test_address_comments_are_skipped_on_read() {
    let registry = registry();
    let obj = Parser::new(&registry)
        .parse_from_string("Derived \"D\" { simple: Simple \"S\" { int_val: 2 } }")
        .unwrap();
    let options = WriterOptions {
        write_addresses: true,
        ..WriterOptions::default()
    };
    let text = write_to_string(&obj, options).unwrap();
    assert!(text.contains("  # 0x"));

    let reparsed = Parser::new(&registry).parse_from_string(&text).unwrap();
    assert_eq!(write(&reparsed), write(&obj));
}

#[test]
fn test_write_condition_brackets_each_subtree() {
    let registry = registry();
    let input = "Derived {
  simple_list: [
    Derived \"A\" { simple: Simple \"C\" {} },
    Simple \"B\" {},
  ],
}";
    let obj = Parser::new(&registry).parse_from_string(input).unwrap();

    let mut calls = Vec::new();
    let mut writer = Writer::new(Vec::new());
    writer.set_write_condition(|obj: &dyn Object, is_pre: bool| {
        let sign = if is_pre { "+" } else { "-" };
        calls.push(format!("{}{}", obj.base().name(), sign));
        true
    });
    writer.write_object(&obj).unwrap();
    drop(writer);
    assert_eq!(calls, ["+", "A+", "C+", "C-", "A-", "B+", "B-", "-"]);
}

#[test]
fn test_skipping_every_list_element_writes_empty_list() {
    let registry = registry();
    let input = "Derived { simple_list: [Simple \"A\" {}, Simple \"B\" {}] }";
    let obj = Parser::new(&registry).parse_from_string(input).unwrap();

    let mut writer = Writer::new(Vec::new());
    writer.set_write_condition(|obj: &dyn Object, is_pre: bool| !is_pre || obj.base().name().is_empty());
    writer.write_object(&obj).unwrap();
    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(text, "Derived {\n  simple_list: [],\n}\n");
}

#[test]
fn test_names_written_in_a_nested_scope_are_not_used_outside_it() {
    let registry = registry();
    let root = registry.create_object::<Derived>("").unwrap();
    let inner = registry.create_object::<Derived>("D").unwrap();
    let shared = registry.create_object::<Simple>("S").unwrap();
    inner
        .borrow_mut()
        .base_mut()
        .field_mut("simple")
        .unwrap()
        .set_object(Some(shared.clone()))
        .unwrap();
    {
        let mut r = root.borrow_mut();
        let base = r.base_mut();
        base.field_mut("simple").unwrap().set_object(Some(inner)).unwrap();
        base.field_mut("simple_list")
            .unwrap()
            .set_objects(vec![shared])
            .unwrap();
    }

    let text = write(&root);
    assert_eq!(
        text,
        "Derived {
  simple: Derived \"D\" {
    simple: Simple \"S\" {
    },
  },
  simple_list: [
    Simple \"S\" {
    },
  ],
}
"
    );
    let reparsed = Parser::new(&registry).parse_from_string(&text).unwrap();
    assert_eq!(write(&reparsed), text);
}

#[test]
fn test_names_in_the_same_scope_stay_shared() {
    let registry = registry();
    let input = "Derived {
  simple: Derived \"D\" {
    simple: Simple \"S\" {},
    simple_list: [USE \"S\"],
  },
  simple_list: [USE \"D\"],
}";
    let parsed = Parser::new(&registry).parse_from_string(input).unwrap();
    let text = write(&parsed);
    assert!(text.contains("simple_list: [\n      USE \"S\",\n    ],"));
    assert!(text.contains("simple_list: [\n    USE \"D\",\n  ],"));
    let reparsed = Parser::new(&registry).parse_from_string(&text).unwrap();
    assert_eq!(write(&reparsed), text);
}
