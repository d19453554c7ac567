//! Parse failures and the messages they carry.

use emd_parser::emd::testing::{register_test_types, Simple};
use emd_parser::emd::{EmdError, Parser, ParserOptions, Registry};
use rstest::rstest;
use std::io::Write;

fn registry() -> Registry {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut registry = Registry::new();
    register_test_types(&mut registry).unwrap();
    registry
}

fn parse_error(registry: &Registry, input: &str) -> EmdError {
    match Parser::new(registry).parse_from_string(input) {
        Ok(obj) => panic!("expected {:?} to fail, got {:?}", input, obj),
        Err(err) => err,
    }
}

#[rstest]
#[case(" ", "Invalid empty name for object type")]
#[case(" 01BadName {}", "Invalid name")]
#[case("Simplex", "Unknown object type")]
#[case("Simple =", "Expected '{'")]
#[case("Simple { bool_val: z }", "Invalid bool value")]
#[case("Simple { bool_val: tralse }", "Invalid bool value")]
#[case("Simple { bool_val: \"glorp\" }", "Invalid bool value")]
#[case("Simple { int_val: 9 x }", "Expected ',' or '}'")]
#[case("Simple { int_val: b }", "Invalid integer value")]
#[case("Simple { int_val: 123b }", "Invalid integer value")]
#[case("Simple { int_val: 0xa1 }", "Invalid integer value")]
#[case("Simple { uint_val: -12 }", "Invalid unsigned integer value")]
#[case("Simple { uint_val: +4 }", "Invalid unsigned integer value")]
#[case("Simple { uint_val: 0xqb }", "Invalid unsigned integer value")]
#[case("Simple { uint_val: 0x12345667875675 }", "Invalid unsigned integer value")]
#[case("Simple { str_val: \"", "Found EOF inside quoted string")]
#[case("Simple { vec3f_val: 12 abc 4 }", "Invalid float value")]
#[case("Simple { color_val: \"#badcolor\" }", "Invalid color format")]
#[case("Simple { enum_val: \"glorp\" }", "Invalid value for enum")]
#[case("Simple { flag_val: \"glorp\" }", "Invalid value for flag enum")]
#[case("Simple { flag_val: \"kF1|x\" }", "Invalid value for flag enum")]
#[case("Simple", "EOF")]
#[case("Simple { bad_field: 13 }", "Unknown field")]
#[case("<\"include/with/eof\"", "Expected '>', got EOF")]
#[case("<\"\">", "Invalid empty path")]
#[case("Derived { simple: Other {} }", "Incorrect object type")]
#[case("Derived { simple_list: [Other {}] }", "Incorrect object type")]
#[case("Derived { ints_val: [1 2] }", "Expected ',' or ']'")]
#[case("Simple {} Simple {}", "Extra input after object")]
#[case("NameRequired {}", "Object of type 'NameRequired' must have a name")]
#[case("Simple { int_val: $NOPE }", "Missing constant with name 'NOPE'")]
#[case("Simple { simple: USE }", "Unknown field")]
#[case("Derived { simple: USE }", "Missing Object name for USE")]
#[case("Derived { simple: CLONE }", "Missing Template or Object name for CLONE")]
#[case("CLONE \"NoSuchObj\"", "Missing Template or Object with name 'NoSuchObj'")]
#[case("Derived { simple: CLONE \"T\" {} }", "Missing Template or Object with name 'T' for CLONE")]
#[case("Derived { TEMPLATES: [Simple {}] }", "Template object of type 'Simple' must have a name")]
#[case("Derived { int_val: 12, CONSTANTS: [ FOO: \"123\" ] }", "CONSTANTS appears after fields")]
#[case("Derived { TEMPLATES: [], CONSTANTS: [] }", "CONSTANTS appears after TEMPLATES")]
#[case("Derived { int_val: 12, TEMPLATES: [ Simple \"TempName\" {} ] }", "TEMPLATES appears after fields")]
#[case("Unscoped { CONSTANTS: [] }", "CONSTANTS appears in unscoped object of type 'Unscoped'")]
#[case("Unscoped { TEMPLATES: [] }", "TEMPLATES appears in unscoped object of type 'Unscoped'")]
#[case("Range { min: 3, max: 2 }", "Invalid Range data")]
#[case(
    "Derived { TEMPLATES: [Simple \"T\" {}], simple: CLONE \"T\" { CONSTANTS: [] } }",
    "CONSTANTS appears in CLONE of type 'Simple'"
)]
#[case(
    "Derived { TEMPLATES: [Simple \"T\" {}], simple: CLONE \"T\" { TEMPLATES: [] } }",
    "TEMPLATES appears in CLONE of type 'Simple'"
)]
fn test_syntax_errors(#[case] input: &str, #[case] expected: &str) {
    let registry = registry();
    let err = parse_error(&registry, input);
    assert!(
        err.to_string().contains(expected),
        "error for {:?} was {:?}, expected it to contain {:?}",
        input,
        err.to_string(),
        expected
    );
}

#[test]
fn test_errors_report_location() {
    let registry = registry();
    let err = parse_error(&registry, "Simple {\n  int_val: 1,\n  bad_field: 2,\n}");
    match err {
        EmdError::Parse {
            location,
            line,
            message,
        } => {
            assert_eq!(location, "<input string>");
            assert_eq!(line, 3);
            assert_eq!(message, "Unknown field 'bad_field' in object of type 'Simple'");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_bad_file() {
    let registry = registry();
    let err = Parser::new(&registry)
        .parse_file("/no/such/file/exists")
        .unwrap_err();
    assert!(err.to_string().contains("Failed to open file"));
}

#[test]
fn test_object_type_conflict() {
    let mut registry = registry();
    let err = registry.add_type::<Simple>("Simple").unwrap_err();
    assert!(err
        .to_string()
        .contains("Object type registered more than once: 'Simple'"));
}

#[test]
fn test_bad_reference() {
    let registry = registry();
    let input = "Derived {
  simple_list: [
      Simple \"Child1\" {},
      USE \"Child2\",
  ],
}
";
    let err = parse_error(&registry, input);
    assert!(err.to_string().contains("Missing object with name 'Child2' for USE"));
}

#[test]
fn test_use_does_not_cross_sibling_scopes() {
    let registry = registry();
    let input = "Derived {
  simple_list: [
    Derived { simple: Simple \"Inner\" {} },
    Derived { simple: USE \"Inner\" },
  ],
}";
    let err = parse_error(&registry, input);
    assert!(err.to_string().contains("Missing object with name 'Inner'"));
}

#[test]
fn test_error_in_included_file_names_that_file() {
    let registry = registry();
    let mut included = tempfile::NamedTempFile::new().unwrap();
    write!(included, "Simple {{\n  bad_field: 12\n}}").unwrap();
    let input = format!(
        "Derived {{ simple: <\"{}\"> }}",
        included.path().display()
    );

    let err = parse_error(&registry, &input);
    assert!(err.to_string().contains("Unknown field"));
    match err {
        EmdError::Parse { location, line, .. } => {
            assert_eq!(location, included.path().display().to_string());
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_missing_included_file() {
    let registry = registry();
    let err = parse_error(&registry, "Derived { simple: <\"/no/such/include.emd\"> }");
    assert!(err.to_string().contains("Failed to open file"));
}

#[test]
fn test_include_depth_limit() {
    let registry = registry();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("self.emd");
    std::fs::write(&path, "<\"self.emd\">").unwrap();

    let options = ParserOptions {
        max_include_depth: 4,
        ..ParserOptions::default()
    };
    let err = Parser::with_options(&registry, options)
        .parse_file(&path)
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("Include depth limit exceeded including 'self.emd'"));
}

#[test]
fn test_recursive_constant() {
    let registry = registry();
    let err = parse_error(
        &registry,
        "Simple { CONSTANTS: [ A: \"$B\", B: \"$A\" ], int_val: $A }",
    );
    assert!(err.to_string().contains("Constant expansion depth limit exceeded"));
}
