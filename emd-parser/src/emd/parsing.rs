//! Parser: emd text to object graphs
//!
//! Recursive descent over the [`Scanner`]. Each object is created through the
//! [`Registry`] by type name, its fields are filled in from the text, it is
//! validated, and only then does it run `creation_done`.
//!
//! # Grammar
//!
//! ```text
//! object    := TYPE [ "name" ] '{' [ constants ] [ templates ] fields '}'
//!            | 'USE' "name"
//!            | 'CLONE' "source" [ "name" ] '{' fields '}'
//!            | '<' "path" '>'
//! constants := 'CONSTANTS' ':' '[' ( NAME ':' "value" ',' )* ']' ','
//! templates := 'TEMPLATES' ':' '[' object ( ',' object )* ','? ']' ','
//! fields    := ( NAME ':' value ',' )*
//! ```
//!
//! # Scopes
//!
//! Every object whose `is_scoped()` is true opens a scope. A named object is
//! recorded in the nearest scope enclosing it, and `USE`/`CLONE` search from
//! the innermost scope outward, so names declared inside a sibling are not
//! visible. Constants and templates follow the same rules.

use super::error::{EmdError, Result};
use super::field::FieldData;
use super::field_type::normalize_flag_text;
use super::object::{complete_creation, ObjectPtr};
use super::registry::Registry;
use super::scanning::{Scanner, Token};
use super::spec::FieldSpec;
use super::value::{Value, ValueFormat, ValueType};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Limits applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// How deeply `<"path">` includes may nest.
    pub max_include_depth: usize,
    /// How deeply constant references may expand into other constants.
    pub max_constant_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            max_include_depth: 32,
            max_constant_depth: 64,
        }
    }
}

/// One file included by another. `including` is empty when the include
/// appeared in string input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub including: PathBuf,
    pub included: PathBuf,
}

/// What a parsed object is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Instance,
    Template,
}

/// Per-object parse state.
#[derive(Debug, Default)]
struct Frame {
    type_name: String,
    is_scoped: bool,
    names: HashMap<String, ObjectPtr>,
    templates: HashMap<String, ObjectPtr>,
    saw_templates: bool,
    saw_fields: bool,
}

pub struct Parser<'r> {
    registry: &'r Registry,
    options: ParserOptions,
    scanner: Scanner,
    frames: Vec<Frame>,
    dependencies: Vec<Dependency>,
    include_depth: usize,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, ParserOptions::default())
    }

    pub fn with_options(registry: &'r Registry, options: ParserOptions) -> Self {
        Parser {
            registry,
            options,
            scanner: Scanner::new(options.max_constant_depth),
            frames: Vec::new(),
            dependencies: Vec::new(),
            include_depth: 0,
        }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Files included by the last parse, in the order they were read.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn reset(&mut self) {
        self.scanner = Scanner::new(self.options.max_constant_depth);
        self.frames.clear();
        self.dependencies.clear();
        self.include_depth = 0;
    }

    /// Parses the single object described by the file at `path`.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<ObjectPtr> {
        let path = path.as_ref();
        self.reset();
        let source = read_source(path)?;
        log::debug!("parsing file {}", path.display());
        self.scanner.push_file(path, &source);
        self.parse_document()
    }

    /// Parses the single object described by `input`. Relative includes
    /// resolve against the working directory.
    pub fn parse_from_string(&mut self, input: &str) -> Result<ObjectPtr> {
        self.reset();
        log::debug!("parsing {} bytes of string input", input.len());
        self.scanner.push_text(input);
        self.parse_document()
    }

    fn parse_document(&mut self) -> Result<ObjectPtr> {
        // Document scope, holding names declared directly under an unscoped root.
        self.frames.push(Frame {
            is_scoped: true,
            ..Frame::default()
        });
        let obj = self.parse_object(Role::Instance)?;
        self.frames.clear();
        self.scanner.finish_input()?;
        log::debug!("parsed {:?}", obj);
        Ok(obj)
    }

    fn error(&self, message: impl Into<String>) -> EmdError {
        self.scanner.error(message)
    }

    fn parse_object(&mut self, role: Role) -> Result<ObjectPtr> {
        if self.scanner.peek_is(&Token::OpenAngle)? {
            return self.parse_included_file(role);
        }
        if self.scanner.peek_is_word("USE")? {
            return self.parse_use();
        }
        if self.scanner.peek_is_word("CLONE")? {
            return self.parse_clone(role);
        }

        let type_name = self.scanner.scan_name("object type")?;
        let name = if self.peek_is_quoted_string()? {
            self.scanner.scan_quoted_string()?
        } else {
            String::new()
        };
        let obj = self
            .registry
            .create_for_parsing(&type_name, &name)
            .map_err(|e| self.error(e.message()))?;

        if obj.borrow().is_name_required() && name.is_empty() {
            return Err(self.error(format!(
                "Object of type '{}' must have a name",
                type_name
            )));
        }
        if role == Role::Template {
            obj.borrow_mut().base_mut().set_is_template(true);
        }

        self.parse_object_body(&obj)?;
        self.finish_object(&obj, role)?;
        Ok(obj)
    }

    fn peek_is_quoted_string(&mut self) -> Result<bool> {
        Ok(self
            .scanner
            .peek()?
            .is_some_and(|l| matches!(l.token, Some(Token::QuotedString(_)))))
    }

    /// `'{' [constants] [templates] fields '}'`, with a frame pushed for the
    /// duration.
    fn parse_object_body(&mut self, obj: &ObjectPtr) -> Result<()> {
        let is_scoped = obj.borrow().is_scoped();
        self.frames.push(Frame {
            type_name: obj.type_name(),
            is_scoped,
            ..Frame::default()
        });
        if is_scoped {
            self.scanner.push_constant_scope();
        }

        let result = self.parse_fields(obj);

        if is_scoped {
            self.scanner.pop_constant_scope();
        }
        self.frames.pop();
        result
    }

    fn parse_fields(&mut self, obj: &ObjectPtr) -> Result<()> {
        let is_clone = obj.borrow().base().is_clone();
        self.scanner.scan_expected_char('{')?;
        loop {
            if self.scanner.peek_is(&Token::CloseBrace)? {
                break;
            }
            let field_name = self.scanner.scan_name("field")?;
            self.scanner.scan_expected_char(':')?;
            match field_name.as_str() {
                "CONSTANTS" | "TEMPLATES" if is_clone => {
                    return Err(self.error(format!(
                        "{} appears in CLONE of type '{}'",
                        field_name,
                        obj.type_name()
                    )));
                }
                "CONSTANTS" => self.parse_constants()?,
                "TEMPLATES" => self.parse_templates()?,
                _ => self.parse_field(obj, &field_name)?,
            }

            if self.scanner.peek_is(&Token::Comma)? {
                self.scanner.scan_expected_char(',')?;
            } else if !self.scanner.peek_is(&Token::CloseBrace)? {
                let found = self.describe_next()?;
                return Err(self.error(format!("Expected ',' or '}}', got {}", found)));
            }
        }
        self.scanner.scan_expected_char('}')
    }

    fn describe_next(&mut self) -> Result<String> {
        Ok(match self.scanner.peek()? {
            Some(lexeme) => format!("'{}'", lexeme.text),
            None => "EOF".to_string(),
        })
    }

    fn frame_mut(&mut self) -> Result<&mut Frame> {
        match self.frames.last_mut() {
            Some(frame) => Ok(frame),
            None => Err(EmdError::Object("Field parsed outside of an object".to_string())),
        }
    }

    fn parse_constants(&mut self) -> Result<()> {
        let frame = self.frame_mut()?;
        let problem = if !frame.is_scoped {
            Some(format!(
                "CONSTANTS appears in unscoped object of type '{}'",
                frame.type_name
            ))
        } else if frame.saw_fields {
            Some("CONSTANTS appears after fields".to_string())
        } else if frame.saw_templates {
            Some("CONSTANTS appears after TEMPLATES".to_string())
        } else {
            None
        };
        if let Some(problem) = problem {
            return Err(self.error(problem));
        }

        self.scanner.scan_expected_char('[')?;
        loop {
            if self.scanner.peek_is(&Token::CloseBracket)? {
                break;
            }
            let name = self.scanner.scan_name("constant")?;
            self.scanner.scan_expected_char(':')?;
            let value = self.scanner.scan_quoted_string()?;
            log::trace!("defining constant '{}'", name);
            self.scanner.add_constant(&name, &value);
            if !self.scan_list_separator()? {
                break;
            }
        }
        self.scanner.scan_expected_char(']')
    }

    fn parse_templates(&mut self) -> Result<()> {
        let frame = self.frame_mut()?;
        let problem = if !frame.is_scoped {
            Some(format!(
                "TEMPLATES appears in unscoped object of type '{}'",
                frame.type_name
            ))
        } else if frame.saw_fields {
            Some("TEMPLATES appears after fields".to_string())
        } else {
            frame.saw_templates = true;
            None
        };
        if let Some(problem) = problem {
            return Err(self.error(problem));
        }

        self.scanner.scan_expected_char('[')?;
        loop {
            if self.scanner.peek_is(&Token::CloseBracket)? {
                break;
            }
            let template = self.parse_object(Role::Template)?;
            let name = template.name();
            if name.is_empty() {
                return Err(self.error(format!(
                    "Template object of type '{}' must have a name",
                    template.type_name()
                )));
            }
            self.frame_mut()?.templates.insert(name, template);
            if !self.scan_list_separator()? {
                break;
            }
        }
        self.scanner.scan_expected_char(']')
    }

    /// After a list element: consumes a `,` and returns true, or returns
    /// false if `]` is next.
    fn scan_list_separator(&mut self) -> Result<bool> {
        if self.scanner.peek_is(&Token::Comma)? {
            self.scanner.scan_expected_char(',')?;
            return Ok(true);
        }
        if self.scanner.peek_is(&Token::CloseBracket)? {
            return Ok(false);
        }
        let found = self.describe_next()?;
        Err(self.error(format!("Expected ',' or ']', got {}", found)))
    }

    fn parse_field(&mut self, obj: &ObjectPtr, field_name: &str) -> Result<()> {
        self.frame_mut()?.saw_fields = true;
        let spec = obj
            .borrow()
            .base()
            .find_field(field_name)
            .map(|field| field.spec());
        let spec = spec.ok_or_else(|| {
            self.error(format!(
                "Unknown field '{}' in object of type '{}'",
                field_name,
                obj.type_name()
            ))
        })?;

        let data = self.parse_field_data(spec)?;
        obj.borrow_mut()
            .base_mut()
            .field_mut(field_name)?
            .store(data);
        Ok(())
    }

    fn parse_field_data(&mut self, spec: &'static FieldSpec) -> Result<FieldData> {
        match spec.value_type {
            ValueType::Object => {
                let obj = self.parse_object(Role::Instance)?;
                self.check_object_type(spec, &obj)?;
                Ok(FieldData::Object(Some(obj)))
            }
            ValueType::ObjectList => {
                let mut objects = Vec::new();
                self.scanner.scan_expected_char('[')?;
                loop {
                    if self.scanner.peek_is(&Token::CloseBracket)? {
                        break;
                    }
                    let obj = self.parse_object(Role::Instance)?;
                    self.check_object_type(spec, &obj)?;
                    objects.push(obj);
                    if !self.scan_list_separator()? {
                        break;
                    }
                }
                self.scanner.scan_expected_char(']')?;
                Ok(FieldData::ObjectList(objects))
            }
            _ if spec.is_list => {
                let mut values = Vec::new();
                self.scanner.scan_expected_char('[')?;
                loop {
                    if self.scanner.peek_is(&Token::CloseBracket)? {
                        break;
                    }
                    values.extend(self.parse_element(spec)?);
                    if !self.scan_list_separator()? {
                        break;
                    }
                }
                self.scanner.scan_expected_char(']')?;
                Ok(FieldData::Values(values))
            }
            _ => Ok(FieldData::Values(self.parse_element(spec)?)),
        }
    }

    /// The values of one element: `count` primitives, a color, or a name.
    fn parse_element(&mut self, spec: &FieldSpec) -> Result<Vec<Value>> {
        match spec.format {
            ValueFormat::Color => {
                let color = self.scanner.scan_color()?;
                Ok(color
                    .to_array()
                    .into_iter()
                    .map(Value::Float)
                    .collect())
            }
            ValueFormat::Enum(names) => {
                let text = self.scanner.scan_quoted_string()?;
                if !names.contains(&text.as_str()) {
                    return Err(self.error(format!("Invalid value for enum '{}'", text)));
                }
                Ok(vec![Value::String(text)])
            }
            ValueFormat::Flags(names) => {
                let text = self.scanner.scan_quoted_string()?;
                match normalize_flag_text(names, &text) {
                    Some(normalized) => Ok(vec![Value::String(normalized)]),
                    None => Err(self.error(format!("Invalid value for flag enum '{}'", text))),
                }
            }
            ValueFormat::Plain => (0..spec.count)
                .map(|_| self.scan_primitive(spec.value_type))
                .collect(),
        }
    }

    fn scan_primitive(&mut self, value_type: ValueType) -> Result<Value> {
        match value_type {
            ValueType::Bool => self.scanner.scan_bool().map(Value::Bool),
            ValueType::Integer => self.scanner.scan_integer().map(Value::Integer),
            ValueType::UInteger => self.scanner.scan_uinteger().map(Value::UInteger),
            ValueType::Float => self.scanner.scan_float().map(Value::Float),
            ValueType::String => self.scanner.scan_quoted_string().map(Value::String),
            ValueType::Object | ValueType::ObjectList => {
                Err(self.error(format!("Cannot scan {} as a primitive", value_type)))
            }
        }
    }

    fn check_object_type(&self, spec: &FieldSpec, obj: &ObjectPtr) -> Result<()> {
        let accepted = spec
            .object_kind
            .is_some_and(|kind| obj.borrow().is_a(kind.type_id));
        if accepted {
            return Ok(());
        }
        Err(self.error(format!(
            "Incorrect object type '{}' for field '{}'",
            obj.type_name(),
            spec.name
        )))
    }

    /// Validates, completes and records a newly parsed object.
    fn finish_object(&mut self, obj: &ObjectPtr, role: Role) -> Result<()> {
        let mut details = String::new();
        if !obj.borrow().is_valid(&mut details) {
            return Err(self.error(format!(
                "Invalid {} data: {}",
                obj.type_name(),
                details
            )));
        }
        complete_creation(obj);

        let name = obj.name();
        if role == Role::Instance && !name.is_empty() {
            if let Some(frame) = self.frames.iter_mut().rev().find(|f| f.is_scoped) {
                if let Some(previous) = frame.names.insert(name.clone(), obj.clone()) {
                    log::warn!(
                        "object name '{}' declared again in one scope; {:?} replaces {:?}",
                        name,
                        obj,
                        previous
                    );
                }
            }
        }
        Ok(())
    }

    fn find_named(&self, name: &str) -> Option<ObjectPtr> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.names.get(name))
            .cloned()
    }

    fn find_template(&self, name: &str) -> Option<ObjectPtr> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.templates.get(name))
            .cloned()
    }

    fn parse_use(&mut self) -> Result<ObjectPtr> {
        self.scanner.next()?;
        if !self.peek_is_quoted_string()? {
            return Err(self.error("Missing Object name for USE"));
        }
        let name = self.scanner.scan_quoted_string()?;
        self.find_named(&name)
            .ok_or_else(|| self.error(format!("Missing object with name '{}' for USE", name)))
    }

    fn parse_clone(&mut self, role: Role) -> Result<ObjectPtr> {
        self.scanner.next()?;
        if !self.peek_is_quoted_string()? {
            return Err(self.error("Missing Template or Object name for CLONE"));
        }
        let source_name = self.scanner.scan_quoted_string()?;
        let source = self
            .find_template(&source_name)
            .or_else(|| self.find_named(&source_name))
            .ok_or_else(|| {
                self.error(format!(
                    "Missing Template or Object with name '{}' for CLONE",
                    source_name
                ))
            })?;

        let name = if self.peek_is_quoted_string()? {
            self.scanner.scan_quoted_string()?
        } else {
            String::new()
        };
        let obj = source
            .clone_for_parsing(&name)
            .map_err(|e| self.error(e.message()))?;
        if role == Role::Template {
            obj.borrow_mut().base_mut().set_is_template(true);
        }
        log::trace!("cloning '{}' as '{}'", source_name, name);

        self.parse_object_body(&obj)?;
        self.finish_object(&obj, role)?;
        Ok(obj)
    }

    fn parse_included_file(&mut self, role: Role) -> Result<ObjectPtr> {
        self.scanner.scan_expected_char('<')?;
        let path = self.scanner.scan_quoted_string()?;
        self.scanner.scan_expected_char('>')?;
        if path.is_empty() {
            return Err(self.error("Invalid empty path for included file"));
        }
        if self.include_depth >= self.options.max_include_depth {
            return Err(self.error(format!(
                "Include depth limit exceeded including '{}'",
                path
            )));
        }

        let including = self
            .scanner
            .current_path()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let included = match including.parent() {
            Some(dir) if Path::new(&path).is_relative() => dir.join(&path),
            _ => PathBuf::from(&path),
        };
        let source = read_source(&included).map_err(|e| self.error(e.message()))?;
        log::trace!("including {}", included.display());
        self.dependencies.push(Dependency {
            including,
            included: included.clone(),
        });

        self.scanner.push_file(&included, &source);
        self.include_depth += 1;
        let result = self.parse_object(role);
        self.include_depth -= 1;
        let obj = result?;
        self.scanner.finish_input()?;
        Ok(obj)
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| EmdError::Parse {
        location: path.display().to_string(),
        line: 0,
        message: format!("Failed to open file: {}", err),
    })
}
