//! Token definitions for emd text
//!
//! Whitespace and `#` comments are skipped by the lexer itself. Everything
//! numeric, boolean or name-like comes out as a [`Token::Word`]; the scanner
//! decides how to read a word from what the field expects.
use logos::Logos;

#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(skip r"([ \t\r\n\f]+|#[^\n]*)")]
pub enum Token {
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token("<")]
    OpenAngle,
    #[token(">")]
    CloseAngle,

    /// `$NAME`, carrying the name without the sigil.
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Constant(String),

    /// A complete quoted string, unescaped.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    QuotedString(String),

    /// A quote that runs into the end of input.
    #[regex(r#""([^"\\]|\\.)*\\?"#)]
    UnterminatedString,

    /// Names, keywords and numbers.
    #[regex(r"[A-Za-z0-9_+\-.]+", |lex| lex.slice().to_string())]
    Word(String),
}

impl Token {
    /// The character of a punctuation token.
    pub fn punct(&self) -> Option<char> {
        match self {
            Token::OpenBrace => Some('{'),
            Token::CloseBrace => Some('}'),
            Token::OpenBracket => Some('['),
            Token::CloseBracket => Some(']'),
            Token::Colon => Some(':'),
            Token::Comma => Some(','),
            Token::OpenAngle => Some('<'),
            Token::CloseAngle => Some('>'),
            _ => None,
        }
    }

    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, Token::Word(w) if w == word)
    }
}

/// Strips the quotes and resolves backslash escapes. An escaped character
/// with no special meaning stands for itself.
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\u{0b}'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// One scanned token with its source text and 1-based line. `token` is
/// `None` for text the lexer does not recognize.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Option<Token>,
    pub text: String,
    pub line: usize,
}

impl Lexeme {
    pub fn is(&self, token: &Token) -> bool {
        self.token.as_ref() == Some(token)
    }
}

/// Tokenizes a whole input, tagging each token with its line.
pub fn tokenize(source: &str) -> Vec<Lexeme> {
    let mut lexer = Token::lexer(source);
    let mut lexemes = Vec::new();
    let mut line = 1;
    let mut counted = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[counted..span.start].matches('\n').count();
        counted = span.start;
        lexemes.push(Lexeme {
            token: result.ok(),
            text: lexer.slice().to_string(),
            line,
        });
    }

    lexemes
}
