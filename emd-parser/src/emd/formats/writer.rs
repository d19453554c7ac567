//! Writer: object graphs back to emd text
//!
//! Output re-parses to an equivalent graph. A named object is written in full
//! the first time it is reached and as `USE "name"` after that, so sharing
//! survives the round trip. Names follow the parser's scoping: one written
//! inside a scoped object is only visible within it, so a later reference
//! outside that object gets a full copy instead of a `USE` the parser would
//! reject. Unnamed objects have no way to be referenced and are written in
//! full wherever they appear.
//!
//! Only fields that were set and are not hidden are written, in the order the
//! object added them:
//!
//! ```text
//! Derived "Root" {
//!   int_val: -13,
//!   simple: Simple "S1" {
//!     int_val: 15,
//!   },
//!   simple_list: [
//!     USE "S1",
//!   ],
//! }
//! ```

use super::value_text::{format_field, quote};
use crate::emd::error::{EmdError, Result};
use crate::emd::field::{Field, FieldData};
use crate::emd::object::{Object, ObjectPtr};
use std::collections::HashSet;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Append a `# 0x...` comment with each object's address to its header.
    pub write_addresses: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            indent: 2,
            write_addresses: false,
        }
    }
}

/// Called with `true` before an object is written, where returning false
/// leaves the object out, and with `false` once it has been written.
pub type WriteCondition<'a> = Box<dyn FnMut(&dyn Object, bool) -> bool + 'a>;

pub struct Writer<'a, W: Write> {
    out: W,
    options: WriterOptions,
    depth: usize,
    /// Addresses of named objects written so far, one set per open scope.
    written_named: Vec<HashSet<usize>>,
    /// Objects whose text is currently being written.
    open: HashSet<usize>,
    condition: Option<WriteCondition<'a>>,
}

impl<'a, W: Write> Writer<'a, W> {
    pub fn new(out: W) -> Self {
        Self::with_options(out, WriterOptions::default())
    }

    pub fn with_options(out: W, options: WriterOptions) -> Self {
        Writer {
            out,
            options,
            depth: 0,
            written_named: vec![HashSet::new()],
            open: HashSet::new(),
            condition: None,
        }
    }

    pub fn set_write_condition(&mut self, condition: impl FnMut(&dyn Object, bool) -> bool + 'a) {
        self.condition = Some(Box::new(condition));
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes `obj` and everything it reaches, followed by a newline.
    /// Which named objects were already written is forgotten first.
    pub fn write_object(&mut self, obj: &ObjectPtr) -> Result<()> {
        self.written_named = vec![HashSet::new()];
        self.open.clear();
        self.depth = 0;
        if !self.begin(obj) {
            return Ok(());
        }
        self.write_object_text(obj)?;
        writeln!(self.out)?;
        self.end(obj);
        log::debug!("wrote {:?}", obj);
        Ok(())
    }

    fn begin(&mut self, obj: &ObjectPtr) -> bool {
        match self.condition.as_mut() {
            Some(condition) => condition(&*obj.borrow(), true),
            None => true,
        }
    }

    fn end(&mut self, obj: &ObjectPtr) {
        if let Some(condition) = self.condition.as_mut() {
            condition(&*obj.borrow(), false);
        }
    }

    fn indent(&self) -> String {
        " ".repeat(self.options.indent * self.depth)
    }

    fn is_visible(&self, obj: &ObjectPtr) -> bool {
        self.written_named
            .iter()
            .any(|written| written.contains(&obj.addr()))
    }

    /// The object itself, from the header to the closing brace, with no
    /// leading indentation or trailing newline.
    fn write_object_text(&mut self, obj: &ObjectPtr) -> Result<()> {
        let o = obj.borrow();
        let base = o.base();
        let name = base.name();

        if !name.is_empty() && self.is_visible(obj) {
            write!(self.out, "USE {}", quote(name))?;
            return Ok(());
        }
        if !self.open.insert(obj.addr()) {
            return Err(EmdError::Object(format!(
                "Cannot write {:?}: it contains itself",
                obj
            )));
        }

        write!(self.out, "{}", base.type_name())?;
        if !name.is_empty() {
            write!(self.out, " {}", quote(name))?;
        }
        write!(self.out, " {{")?;
        if self.options.write_addresses {
            write!(self.out, "  # {:#x}", obj.addr())?;
        }
        writeln!(self.out)?;

        let is_scoped = o.is_scoped();
        if is_scoped {
            self.written_named.push(HashSet::new());
        }
        self.depth += 1;
        let result = base
            .fields()
            .iter()
            .filter(|field| field.was_set() && !field.is_hidden())
            .try_for_each(|field| self.write_field(field));
        self.depth -= 1;
        if is_scoped {
            self.written_named.pop();
        }
        self.open.remove(&obj.addr());
        result?;
        write!(self.out, "{}}}", self.indent())?;

        // Like the parser, a name becomes usable once its object is complete.
        if !name.is_empty() {
            if let Some(written) = self.written_named.last_mut() {
                written.insert(obj.addr());
            }
        }
        Ok(())
    }

    fn write_field(&mut self, field: &Field) -> Result<()> {
        let indent = self.indent();
        match field.data() {
            FieldData::Values(_) => {
                let text = format_field(field).unwrap_or_default();
                writeln!(self.out, "{}{}: {},", indent, field.name(), text)?;
            }
            FieldData::Object(None) => {}
            FieldData::Object(Some(child)) => {
                if self.begin(child) {
                    write!(self.out, "{}{}: ", indent, field.name())?;
                    self.write_object_text(child)?;
                    writeln!(self.out, ",")?;
                    self.end(child);
                }
            }
            FieldData::ObjectList(list) => {
                let mut any_kept = false;
                self.depth += 1;
                for child in list {
                    if !self.begin(child) {
                        continue;
                    }
                    if !any_kept {
                        writeln!(self.out, "{}{}: [", indent, field.name())?;
                        any_kept = true;
                    }
                    write!(self.out, "{}", self.indent())?;
                    self.write_object_text(child)?;
                    writeln!(self.out, ",")?;
                    self.end(child);
                }
                self.depth -= 1;
                if any_kept {
                    writeln!(self.out, "{}],", indent)?;
                } else {
                    writeln!(self.out, "{}{}: [],", indent, field.name())?;
                }
            }
        }
        Ok(())
    }
}

/// Writes `obj` to a string.
pub fn write_to_string(obj: &ObjectPtr, options: WriterOptions) -> Result<String> {
    let mut writer = Writer::with_options(Vec::new(), options);
    writer.write_object(obj)?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}
