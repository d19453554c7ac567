//! Scanner: typed reads over a stack of token inputs
//!
//! The parser pushes one input per document or included file. Constant
//! references (`$NAME`) push the constant's text as a further input that is
//! dropped as soon as it is used up, so a constant can stand for any run of
//! tokens, including references to other constants.
//!
//! Errors are reported against the innermost file (or string) input, never
//! against constant text.

use super::token::{tokenize, Lexeme, Token};
use crate::emd::error::{EmdError, Result};
use crate::emd::math::Color;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Location label for input that did not come from a file.
pub const STRING_INPUT_LABEL: &str = "<input string>";

#[derive(Debug)]
enum Origin {
    File(PathBuf),
    Text,
    Constant(String),
}

#[derive(Debug)]
struct Input {
    origin: Origin,
    lexemes: Vec<Lexeme>,
    pos: usize,
}

impl Input {
    fn new(origin: Origin, source: &str) -> Self {
        Input {
            origin,
            lexemes: tokenize(source),
            pos: 0,
        }
    }

    fn is_constant(&self) -> bool {
        matches!(self.origin, Origin::Constant(_))
    }

    fn is_exhausted(&self) -> bool {
        self.pos >= self.lexemes.len()
    }

    /// Line of the most recently consumed token.
    fn line(&self) -> usize {
        self.lexemes
            .get(self.pos.saturating_sub(1))
            .map_or(1, |l| l.line)
    }
}

#[derive(Debug)]
pub struct Scanner {
    inputs: Vec<Input>,
    constants: Vec<HashMap<String, String>>,
    max_constant_depth: usize,
}

impl Scanner {
    pub fn new(max_constant_depth: usize) -> Self {
        Scanner {
            inputs: Vec::new(),
            constants: Vec::new(),
            max_constant_depth,
        }
    }

    pub fn push_file(&mut self, path: &Path, source: &str) {
        self.inputs
            .push(Input::new(Origin::File(path.to_path_buf()), source));
    }

    pub fn push_text(&mut self, source: &str) {
        self.inputs.push(Input::new(Origin::Text, source));
    }

    /// Drops the innermost file or string input, along with any constant
    /// text still pending on top of it.
    pub fn pop_input(&mut self) {
        while let Some(input) = self.inputs.pop() {
            if !input.is_constant() {
                break;
            }
        }
    }

    /// Ends the innermost file or string input, which must be used up.
    pub fn finish_input(&mut self) -> Result<()> {
        if let Some(lexeme) = self.peek()? {
            return Err(self.error(format!("Extra input after object: '{}'", lexeme.text)));
        }
        self.pop_input();
        Ok(())
    }

    /// Path of the innermost file input, if any.
    pub fn current_path(&self) -> Option<&Path> {
        self.inputs.iter().rev().find_map(|input| match &input.origin {
            Origin::File(path) => Some(path.as_path()),
            _ => None,
        })
    }

    pub fn push_constant_scope(&mut self) {
        self.constants.push(HashMap::new());
    }

    pub fn pop_constant_scope(&mut self) {
        self.constants.pop();
    }

    /// Defines a constant in the innermost scope.
    pub fn add_constant(&mut self, name: &str, value: &str) {
        if self.constants.is_empty() {
            self.push_constant_scope();
        }
        if let Some(scope) = self.constants.last_mut() {
            scope.insert(name.to_string(), value.to_string());
        }
    }

    fn constant(&self, name: &str) -> Option<&str> {
        self.constants
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .map(String::as_str)
    }

    /// A parse error at the current position.
    pub fn error(&self, message: impl Into<String>) -> EmdError {
        let (location, line) = self
            .inputs
            .iter()
            .rev()
            .find_map(|input| match &input.origin {
                Origin::File(path) => Some((path.display().to_string(), input.line())),
                Origin::Text => Some((STRING_INPUT_LABEL.to_string(), input.line())),
                Origin::Constant(_) => None,
            })
            .unwrap_or_else(|| (STRING_INPUT_LABEL.to_string(), 0));
        EmdError::Parse {
            location,
            line,
            message: message.into(),
        }
    }

    /// Drops used-up constant text and expands constant references until a
    /// real token (or the end of the current input) is next.
    fn expand(&mut self) -> Result<()> {
        loop {
            let Some(top) = self.inputs.last_mut() else {
                return Ok(());
            };
            if top.is_exhausted() {
                if top.is_constant() {
                    self.inputs.pop();
                    continue;
                }
                return Ok(());
            }
            let name = match &top.lexemes[top.pos].token {
                Some(Token::Constant(name)) => name.clone(),
                _ => return Ok(()),
            };
            top.pos += 1;

            let depth = self.inputs.iter().filter(|i| i.is_constant()).count();
            if depth >= self.max_constant_depth {
                return Err(self.error(format!(
                    "Constant expansion depth limit exceeded at '${}'",
                    name
                )));
            }
            let value = self
                .constant(&name)
                .map(str::to_string)
                .ok_or_else(|| self.error(format!("Missing constant with name '{}'", name)))?;
            log::trace!("expanding constant '{}' to '{}'", name, value);
            self.inputs
                .push(Input::new(Origin::Constant(name), &value));
        }
    }

    /// The next token, without consuming it. `None` at the end of the
    /// current input.
    pub fn peek(&mut self) -> Result<Option<Lexeme>> {
        self.expand()?;
        Ok(self
            .inputs
            .last()
            .and_then(|input| input.lexemes.get(input.pos))
            .cloned())
    }

    pub fn peek_is(&mut self, token: &Token) -> Result<bool> {
        Ok(self.peek()?.is_some_and(|l| l.is(token)))
    }

    pub fn peek_is_word(&mut self, word: &str) -> Result<bool> {
        Ok(self
            .peek()?
            .and_then(|l| l.token)
            .is_some_and(|t| t.is_word(word)))
    }

    pub fn next(&mut self) -> Result<Option<Lexeme>> {
        self.expand()?;
        let Some(input) = self.inputs.last_mut() else {
            return Ok(None);
        };
        let lexeme = input.lexemes.get(input.pos).cloned();
        if lexeme.is_some() {
            input.pos += 1;
        }
        Ok(lexeme)
    }

    fn describe(lexeme: Option<&Lexeme>) -> String {
        match lexeme {
            Some(l) => format!("'{}'", l.text),
            None => "EOF".to_string(),
        }
    }

    /// Consumes the given punctuation character.
    pub fn scan_expected_char(&mut self, expected: char) -> Result<()> {
        let lexeme = self.next()?;
        let found = lexeme.as_ref().and_then(|l| l.token.as_ref()).and_then(Token::punct);
        if found == Some(expected) {
            return Ok(());
        }
        Err(self.error(format!(
            "Expected '{}', got {}",
            expected,
            Self::describe(lexeme.as_ref())
        )))
    }

    /// Reads the next word as text.
    fn scan_word(&mut self) -> Result<Option<String>> {
        Ok(match self.next()? {
            Some(Lexeme {
                token: Some(Token::Word(word)),
                ..
            }) => Some(word),
            Some(other) => Some(other.text),
            None => None,
        })
    }

    /// Reads an identifier: a letter or underscore followed by letters,
    /// digits and underscores. `what` names the thing for error messages.
    pub fn scan_name(&mut self, what: &str) -> Result<String> {
        let word = match self.next()? {
            Some(Lexeme {
                token: Some(Token::Word(word)),
                ..
            }) => word,
            _ => return Err(self.error(format!("Invalid empty name for {}", what))),
        };
        let valid_start = word
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let valid_rest = word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_start || !valid_rest {
            return Err(self.error(format!("Invalid name '{}' for {}", word, what)));
        }
        Ok(word)
    }

    /// Case-insensitive `t`, `true`, `f` or `false`.
    pub fn scan_bool(&mut self) -> Result<bool> {
        let word = self.scan_word()?.unwrap_or_default();
        match word.to_ascii_lowercase().as_str() {
            "t" | "true" => Ok(true),
            "f" | "false" => Ok(false),
            _ => Err(self.error(format!("Invalid bool value '{}'", word))),
        }
    }

    /// A signed base-10 integer.
    pub fn scan_integer(&mut self) -> Result<i32> {
        let word = self.scan_word()?.unwrap_or_default();
        word.parse::<i32>()
            .map_err(|_| self.error(format!("Invalid integer value '{}'", word)))
    }

    /// An unsigned integer: octal with a leading `0`, hex with `0x`/`0X`,
    /// otherwise decimal. Signs are not allowed.
    pub fn scan_uinteger(&mut self) -> Result<u32> {
        let word = self.scan_word()?.unwrap_or_default();
        parse_uinteger(&word)
            .ok_or_else(|| self.error(format!("Invalid unsigned integer value '{}'", word)))
    }

    pub fn scan_float(&mut self) -> Result<f32> {
        let word = self.scan_word()?.unwrap_or_default();
        word.parse::<f32>()
            .map_err(|_| self.error(format!("Invalid float value '{}'", word)))
    }

    pub fn scan_quoted_string(&mut self) -> Result<String> {
        let lexeme = self.next()?;
        match lexeme.as_ref().and_then(|l| l.token.as_ref()) {
            Some(Token::QuotedString(s)) => Ok(s.clone()),
            Some(Token::UnterminatedString) => Err(self.error("Found EOF inside quoted string")),
            _ => Err(self.error(format!(
                "Expected '\"', got {}",
                Self::describe(lexeme.as_ref())
            ))),
        }
    }

    /// Either a quoted `"#RRGGBB"`/`"#RRGGBBAA"` string or four floats.
    pub fn scan_color(&mut self) -> Result<Color> {
        let quoted = self
            .peek()?
            .is_some_and(|l| matches!(l.token, Some(Token::QuotedString(_))));
        if quoted {
            let text = self.scan_quoted_string()?;
            return Color::from_hex_string(&text)
                .ok_or_else(|| self.error(format!("Invalid color format: '{}'", text)));
        }
        let mut components = [0.0; 4];
        for component in &mut components {
            *component = self.scan_float()?;
        }
        Ok(Color::from_components(components))
    }
}

fn parse_uinteger(word: &str) -> Option<u32> {
    let (digits, radix) = if let Some(hex) = word
        .strip_prefix("0x")
        .or_else(|| word.strip_prefix("0X"))
    {
        (hex, 16)
    } else if word.len() > 1 && word.starts_with('0') {
        (&word[1..], 8)
    } else {
        (word, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scanner(text: &str) -> Scanner {
        let mut scanner = Scanner::new(64);
        scanner.push_text(text);
        scanner
    }

    #[test]
    fn test_scan_bool_variants() {
        let mut s = scanner("F f False fAlSe T t TruE True");
        for expected in [false, false, false, false, true, true, true, true] {
            assert_eq!(s.scan_bool().unwrap(), expected);
        }
        let err = scanner("tralse").scan_bool().unwrap_err();
        assert!(err.to_string().contains("Invalid bool value"));
    }

    #[test]
    fn test_scan_integers() {
        let mut s = scanner("10 -20 +30");
        assert_eq!(s.scan_integer().unwrap(), 10);
        assert_eq!(s.scan_integer().unwrap(), -20);
        assert_eq!(s.scan_integer().unwrap(), 30);
        for bad in ["b", "123b", "0xa1"] {
            let err = scanner(bad).scan_integer().unwrap_err();
            assert!(err.to_string().contains("Invalid integer value"), "{}", bad);
        }
    }

    #[test]
    fn test_scan_uintegers() {
        let mut s = scanner("10 076 0xa5b 0XA5B 0");
        assert_eq!(s.scan_uinteger().unwrap(), 10);
        assert_eq!(s.scan_uinteger().unwrap(), 62);
        assert_eq!(s.scan_uinteger().unwrap(), 2651);
        assert_eq!(s.scan_uinteger().unwrap(), 2651);
        assert_eq!(s.scan_uinteger().unwrap(), 0);
        for bad in ["-12", "+4", "0xqb", "0x12345667875675", "08", "0x"] {
            let err = scanner(bad).scan_uinteger().unwrap_err();
            assert!(
                err.to_string().contains("Invalid unsigned integer value"),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_scan_floats() {
        let mut s = scanner(".2 -3.5 4 1e2");
        assert_eq!(s.scan_float().unwrap(), 0.2);
        assert_eq!(s.scan_float().unwrap(), -3.5);
        assert_eq!(s.scan_float().unwrap(), 4.0);
        assert_eq!(s.scan_float().unwrap(), 100.0);
        let err = scanner("abc").scan_float().unwrap_err();
        assert!(err.to_string().contains("Invalid float value"));
    }

    #[test]
    fn test_scan_quoted_string() {
        assert_eq!(
            scanner(r#""A \"Q\"""#).scan_quoted_string().unwrap(),
            "A \"Q\""
        );
        let err = scanner("\"abc").scan_quoted_string().unwrap_err();
        assert!(err.to_string().contains("Found EOF inside quoted string"));
    }

    #[test]
    fn test_scan_color() {
        assert_eq!(scanner("\"#ffffff\"").scan_color().unwrap(), Color::WHITE);
        assert_eq!(
            scanner("255 0 0 255").scan_color().unwrap(),
            Color::new(1.0, 0.0, 0.0, 1.0)
        );
        assert_eq!(
            scanner("0 1 .5 1").scan_color().unwrap(),
            Color::new(0.0, 1.0, 0.5, 1.0)
        );
        let err = scanner("\"#badcolor\"").scan_color().unwrap_err();
        assert!(err.to_string().contains("Invalid color format"));
    }

    #[test]
    fn test_scan_name() {
        assert_eq!(scanner("_Foo1").scan_name("object type").unwrap(), "_Foo1");
        let err = scanner("01BadName").scan_name("object type").unwrap_err();
        assert!(err.to_string().contains("Invalid name '01BadName'"));
        let err = scanner(" ").scan_name("object type").unwrap_err();
        assert!(err
            .to_string()
            .contains("Invalid empty name for object type"));
    }

    #[test]
    fn test_expected_char_reports_eof() {
        let mut s = scanner("<");
        s.scan_expected_char('<').unwrap();
        let err = s.scan_expected_char('>').unwrap_err();
        assert!(err.to_string().contains("Expected '>', got EOF"));
        let err = scanner("=").scan_expected_char('{').unwrap_err();
        assert!(err.to_string().contains("Expected '{', got '='"));
    }

    #[test]
    fn test_constants_expand_recursively() {
        let mut s = scanner("$BAR");
        s.push_constant_scope();
        s.add_constant("FOO", "123");
        s.add_constant("BAR", "2.5 $FOO 5.0");
        assert_eq!(s.scan_float().unwrap(), 2.5);
        assert_eq!(s.scan_float().unwrap(), 123.0);
        assert_eq!(s.scan_float().unwrap(), 5.0);
        assert!(s.peek().unwrap().is_none());
    }

    #[test]
    fn test_missing_constant() {
        let err = scanner("$NOPE").scan_integer().unwrap_err();
        assert!(err.to_string().contains("Missing constant with name 'NOPE'"));
    }

    #[test]
    fn test_self_referential_constant_hits_limit() {
        let mut s = scanner("$LOOP");
        s.add_constant("LOOP", "$LOOP");
        let err = s.peek().unwrap_err();
        assert!(err.to_string().contains("depth limit"));
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut s = scanner("$X $X");
        s.push_constant_scope();
        s.add_constant("X", "1");
        s.push_constant_scope();
        s.add_constant("X", "2");
        assert_eq!(s.scan_integer().unwrap(), 2);
        s.pop_constant_scope();
        assert_eq!(s.scan_integer().unwrap(), 1);
    }

    #[test]
    fn test_error_location_uses_file_and_line() {
        let mut s = Scanner::new(64);
        s.push_file(Path::new("scene.emd"), "a\nb\n  zz");
        s.next().unwrap();
        s.next().unwrap();
        let err = s.scan_bool().unwrap_err();
        assert_eq!(err.to_string(), "scene.emd:3: Invalid bool value 'zz'");
        assert_eq!(s.current_path(), Some(Path::new("scene.emd")));
    }

    #[test]
    fn test_finish_input_rejects_trailing_tokens() {
        let mut s = scanner("a b");
        s.next().unwrap();
        let err = s.finish_input().unwrap_err();
        assert!(err.to_string().contains("Extra input after object"));
    }

    proptest! {
        #[test]
        fn prop_integer_text_round_trips(n in any::<i32>()) {
            prop_assert_eq!(scanner(&n.to_string()).scan_integer().unwrap(), n);
        }

        #[test]
        fn prop_hex_uinteger_round_trips(n in any::<u32>()) {
            prop_assert_eq!(scanner(&format!("{:#x}", n)).scan_uinteger().unwrap(), n);
        }

        #[test]
        fn prop_float_display_round_trips(f in -1.0e6f32..1.0e6f32) {
            prop_assert_eq!(scanner(&f.to_string()).scan_float().unwrap(), f);
        }
    }
}
