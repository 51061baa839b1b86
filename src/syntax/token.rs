//! The Sable token source.
//!
//! A hand-written lexer producing positioned tokens. String literals are not
//! lexed as single tokens: interpolation (`${ ... }`) switches the lexer back
//! into expression mode, so a mode stack tracks whether the current position
//! is inside normal code, a plain `"..."` string, or an indented `''...''`
//! string. A `}` closes an interpolation only when all braces opened inside
//! it are balanced.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

use crate::ast::Span;
use crate::errors::{ErrorReporting, SableError, SourceContext};

/// All token kinds consumed by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    /// A resolved literal piece of a plain string.
    StrLit(String),
    /// A raw (not yet indentation-stripped) piece of an indented string.
    IndStrLit(String),
    PathLit(String),
    UriLit(String),

    // Keywords.
    If,
    Then,
    Else,
    Assert,
    With,
    Let,
    In,
    Rec,
    Inherit,

    // Operators and punctuation.
    Eq,       // ==
    NEq,      // !=
    AndAnd,   // &&
    OrOr,     // ||
    Impl,     // ->
    Update,   // //
    Concat,   // ++
    Ellipsis, // ...
    Assign,   // =
    Not,      // !
    Plus,     // +
    Question, // ?
    Tilde,    // ~
    At,       // @
    Colon,    // :
    Semicolon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // String delimiters and interpolation boundaries.
    QuoteOpen,     // "
    QuoteClose,    // "
    IndQuoteOpen,  // ''
    IndQuoteClose, // ''
    InterpOpen,    // ${
    InterpClose,   // }

    Eof,
}

impl TokenKind {
    /// A short human-readable description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{}`", name),
            TokenKind::Int(n) => format!("integer `{}`", n),
            TokenKind::StrLit(_) | TokenKind::IndStrLit(_) => "string fragment".into(),
            TokenKind::PathLit(p) => format!("path `{}`", p),
            TokenKind::UriLit(u) => format!("URI `{}`", u),
            TokenKind::If => "`if`".into(),
            TokenKind::Then => "`then`".into(),
            TokenKind::Else => "`else`".into(),
            TokenKind::Assert => "`assert`".into(),
            TokenKind::With => "`with`".into(),
            TokenKind::Let => "`let`".into(),
            TokenKind::In => "`in`".into(),
            TokenKind::Rec => "`rec`".into(),
            TokenKind::Inherit => "`inherit`".into(),
            TokenKind::Eq => "`==`".into(),
            TokenKind::NEq => "`!=`".into(),
            TokenKind::AndAnd => "`&&`".into(),
            TokenKind::OrOr => "`||`".into(),
            TokenKind::Impl => "`->`".into(),
            TokenKind::Update => "`//`".into(),
            TokenKind::Concat => "`++`".into(),
            TokenKind::Ellipsis => "`...`".into(),
            TokenKind::Assign => "`=`".into(),
            TokenKind::Not => "`!`".into(),
            TokenKind::Plus => "`+`".into(),
            TokenKind::Question => "`?`".into(),
            TokenKind::Tilde => "`~`".into(),
            TokenKind::At => "`@`".into(),
            TokenKind::Colon => "`:`".into(),
            TokenKind::Semicolon => "`;`".into(),
            TokenKind::Comma => "`,`".into(),
            TokenKind::Dot => "`.`".into(),
            TokenKind::LParen => "`(`".into(),
            TokenKind::RParen => "`)`".into(),
            TokenKind::LBrace => "`{`".into(),
            TokenKind::RBrace => "`}`".into(),
            TokenKind::LBracket => "`[`".into(),
            TokenKind::RBracket => "`]`".into(),
            TokenKind::QuoteOpen | TokenKind::QuoteClose => "`\"`".into(),
            TokenKind::IndQuoteOpen | TokenKind::IndQuoteClose => "`''`".into(),
            TokenKind::InterpOpen => "`${`".into(),
            TokenKind::InterpClose => "`}`".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// A positioned token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("if", TokenKind::If),
        ("then", TokenKind::Then),
        ("else", TokenKind::Else),
        ("assert", TokenKind::Assert),
        ("with", TokenKind::With),
        ("let", TokenKind::Let),
        ("in", TokenKind::In),
        ("rec", TokenKind::Rec),
        ("inherit", TokenKind::Inherit),
    ])
});

/// Lexer modes. `Normal` tracks the brace depth opened since the enclosing
/// interpolation (or since the start of input for the bottom entry).
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Normal { braces: usize },
    Str,
    IndStr,
}

/// Tokenizes a whole source text, or fails on the first lexical error.
pub fn tokenize(source: &str, ctx: &SourceContext) -> Result<Vec<Token>, SableError> {
    let mut lexer = Lexer {
        src: source,
        pos: 0,
        modes: vec![Mode::Normal { braces: 0 }],
        tokens: Vec::new(),
        ctx,
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    modes: Vec<Mode>,
    tokens: Vec<Token>,
    ctx: &'a SourceContext,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<(), SableError> {
        while self.pos < self.src.len() {
            match *self.modes.last().unwrap_or(&Mode::Normal { braces: 0 }) {
                Mode::Normal { .. } => self.lex_normal()?,
                Mode::Str => self.lex_str()?,
                Mode::IndStr => self.lex_ind_str()?,
            }
        }
        if self.modes.len() > 1 || !matches!(self.modes.last(), Some(Mode::Normal { .. })) {
            return Err(self
                .ctx
                .unterminated("string", (self.src.len()..self.src.len()).into()));
        }
        self.push(TokenKind::Eof, self.src.len(), self.src.len());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Normal (expression) mode
    // ------------------------------------------------------------------

    fn lex_normal(&mut self) -> Result<(), SableError> {
        let rest = &self.src[self.pos..];
        let ch = match rest.chars().next() {
            Some(c) => c,
            None => return Ok(()),
        };

        if ch.is_ascii_whitespace() {
            self.pos += ch.len_utf8();
            return Ok(());
        }
        if rest.starts_with('#') {
            let len = rest.find('\n').unwrap_or(rest.len());
            self.pos += len;
            return Ok(());
        }
        if rest.starts_with("/*") {
            match rest.find("*/") {
                Some(end) => self.pos += end + 2,
                None => {
                    return Err(self
                        .ctx
                        .unterminated("comment", (self.pos..self.pos + 2).into()))
                }
            }
            return Ok(());
        }

        if rest.starts_with('"') {
            self.modes.push(Mode::Str);
            self.push(TokenKind::QuoteOpen, self.pos, self.pos + 1);
            self.pos += 1;
            return Ok(());
        }
        if rest.starts_with("''") {
            self.modes.push(Mode::IndStr);
            self.push(TokenKind::IndQuoteOpen, self.pos, self.pos + 2);
            self.pos += 2;
            return Ok(());
        }

        // Literal lookaheads: a URI needs a scheme and `:`, a path needs at
        // least one `/` followed by a path character. Both take priority
        // over identifiers, integers, and the `//` operator.
        if let Some(len) = uri_lookahead(rest) {
            self.push_str_token(|s| TokenKind::UriLit(s), len);
            return Ok(());
        }
        if let Some(len) = path_lookahead(rest) {
            self.push_str_token(|s| TokenKind::PathLit(s), len);
            return Ok(());
        }

        if ch.is_ascii_digit() {
            let len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let text = &rest[..len];
            let value: i64 = text.parse().map_err(|_| {
                self.ctx.report(
                    crate::errors::ErrorKind::InvalidInteger { value: text.into() },
                    (self.pos..self.pos + len).into(),
                )
            })?;
            self.push(TokenKind::Int(value), self.pos, self.pos + len);
            self.pos += len;
            return Ok(());
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '\'' || c == '-'))
                .unwrap_or(rest.len());
            let text = &rest[..len];
            let kind = KEYWORDS
                .get(text)
                .cloned()
                .unwrap_or_else(|| TokenKind::Ident(text.to_string()));
            self.push(kind, self.pos, self.pos + len);
            self.pos += len;
            return Ok(());
        }

        // Multi-character operators before their single-character prefixes.
        for (text, kind) in [
            ("==", TokenKind::Eq),
            ("!=", TokenKind::NEq),
            ("&&", TokenKind::AndAnd),
            ("||", TokenKind::OrOr),
            ("->", TokenKind::Impl),
            ("//", TokenKind::Update),
            ("++", TokenKind::Concat),
            ("...", TokenKind::Ellipsis),
        ] {
            if rest.starts_with(text) {
                self.push(kind, self.pos, self.pos + text.len());
                self.pos += text.len();
                return Ok(());
            }
        }

        let kind = match ch {
            '=' => TokenKind::Assign,
            '!' => TokenKind::Not,
            '+' => TokenKind::Plus,
            '?' => TokenKind::Question,
            '~' => TokenKind::Tilde,
            '@' => TokenKind::At,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => {
                if let Some(Mode::Normal { braces }) = self.modes.last_mut() {
                    *braces += 1;
                }
                TokenKind::LBrace
            }
            '}' => {
                let nested = self.modes.len() > 1;
                match self.modes.last_mut() {
                    Some(Mode::Normal { braces }) if *braces > 0 => {
                        *braces -= 1;
                        TokenKind::RBrace
                    }
                    _ if nested => {
                        // End of an interpolation: fall back to the
                        // enclosing string mode.
                        self.modes.pop();
                        TokenKind::InterpClose
                    }
                    _ => TokenKind::RBrace,
                }
            }
            other => {
                return Err(self.ctx.malformed(
                    &format!("unexpected character `{}`", other),
                    (self.pos..self.pos + other.len_utf8()).into(),
                ));
            }
        };
        self.push(kind, self.pos, self.pos + 1);
        self.pos += 1;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Plain string mode
    // ------------------------------------------------------------------

    fn lex_str(&mut self) -> Result<(), SableError> {
        let start = self.pos;
        let mut text = String::new();

        loop {
            let rest = &self.src[self.pos..];
            let ch = match rest.chars().next() {
                Some(c) => c,
                None => return Err(self.ctx.unterminated("string", (start..self.pos).into())),
            };

            if ch == '"' {
                self.flush_literal(text, start, TokenKind::StrLit)?;
                self.modes.pop();
                self.push(TokenKind::QuoteClose, self.pos, self.pos + 1);
                self.pos += 1;
                return Ok(());
            }
            if rest.starts_with("${") {
                self.flush_literal(text, start, TokenKind::StrLit)?;
                self.modes.push(Mode::Normal { braces: 0 });
                self.push(TokenKind::InterpOpen, self.pos, self.pos + 2);
                self.pos += 2;
                return Ok(());
            }
            if ch == '\\' {
                let escaped = rest.chars().nth(1).ok_or_else(|| {
                    self.ctx.unterminated("string", (start..self.pos).into())
                })?;
                text.push(match escaped {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => other,
                });
                self.pos += 1 + escaped.len_utf8();
                continue;
            }
            text.push(ch);
            self.pos += ch.len_utf8();
        }
    }

    // ------------------------------------------------------------------
    // Indented string mode
    // ------------------------------------------------------------------

    fn lex_ind_str(&mut self) -> Result<(), SableError> {
        let start = self.pos;
        let mut text = String::new();

        loop {
            let rest = &self.src[self.pos..];
            let ch = match rest.chars().next() {
                Some(c) => c,
                None => {
                    return Err(self
                        .ctx
                        .unterminated("indented string", (start..self.pos).into()))
                }
            };

            if rest.starts_with("''") {
                // `'''` is an escaped pair of quotes, `''${` a literal
                // interpolation marker, `''\c` an escaped character.
                if rest.starts_with("'''") {
                    text.push_str("''");
                    self.pos += 3;
                    continue;
                }
                if rest.starts_with("''${") {
                    text.push_str("${");
                    self.pos += 4;
                    continue;
                }
                if rest.starts_with("''\\") {
                    let escaped = rest.chars().nth(3).ok_or_else(|| {
                        self.ctx
                            .unterminated("indented string", (start..self.pos).into())
                    })?;
                    text.push(match escaped {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        other => other,
                    });
                    self.pos += 3 + escaped.len_utf8();
                    continue;
                }
                self.flush_literal(text, start, TokenKind::IndStrLit)?;
                self.modes.pop();
                self.push(TokenKind::IndQuoteClose, self.pos, self.pos + 2);
                self.pos += 2;
                return Ok(());
            }
            if rest.starts_with("${") {
                self.flush_literal(text, start, TokenKind::IndStrLit)?;
                self.modes.push(Mode::Normal { braces: 0 });
                self.push(TokenKind::InterpOpen, self.pos, self.pos + 2);
                self.pos += 2;
                return Ok(());
            }
            text.push(ch);
            self.pos += ch.len_utf8();
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn flush_literal(
        &mut self,
        text: String,
        start: usize,
        make: fn(String) -> TokenKind,
    ) -> Result<(), SableError> {
        if !text.is_empty() {
            self.push(make(text), start, self.pos);
        }
        Ok(())
    }

    fn push_str_token(&mut self, make: impl Fn(String) -> TokenKind, len: usize) {
        let text = self.src[self.pos..self.pos + len].to_string();
        self.push(make(text), self.pos, self.pos + len);
        self.pos += len;
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+')
}

fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '%' | '/' | '?' | ':' | '@' | '&' | '=' | '+' | '$' | ',' | '-' | '_' | '.' | '!' | '~'
                | '*' | '\''
        )
}

/// Matches a path literal: an optional run of path characters followed by
/// one or more groups of `/` plus at least one path character. `//` alone
/// never matches, so the update operator survives.
fn path_lookahead(rest: &str) -> Option<usize> {
    let mut len = rest.chars().take_while(|&c| is_path_char(c)).count();
    let mut groups = 0;
    loop {
        let tail = &rest[len..];
        if !tail.starts_with('/') {
            break;
        }
        let seg = tail[1..].chars().take_while(|&c| is_path_char(c)).count();
        if seg == 0 {
            break;
        }
        len += 1 + seg;
        groups += 1;
    }
    (groups > 0).then_some(len)
}

/// Matches a URI literal: `scheme:` followed by at least one URI character.
fn uri_lookahead(rest: &str) -> Option<usize> {
    let first = rest.chars().next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let scheme = rest
        .chars()
        .take_while(|&c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        .count();
    let tail = &rest[scheme..];
    if !tail.starts_with(':') {
        return None;
    }
    let body = tail[1..].chars().take_while(|&c| is_uri_char(c)).count();
    (body > 0).then_some(scheme + 1 + body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let ctx = SourceContext::new("test.sbl", source);
        tokenize(source, &ctx)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn update_operator_is_not_a_path() {
        assert_eq!(
            kinds("a // b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Update,
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn path_and_uri_literals() {
        assert_eq!(
            kinds("./foo/bar.sbl"),
            vec![TokenKind::PathLit("./foo/bar.sbl".into()), TokenKind::Eof]
        );
        assert_eq!(
            kinds("https://example.org/x"),
            vec![
                TokenKind::UriLit("https://example.org/x".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn colon_space_stays_a_lambda() {
        assert_eq!(
            kinds("x: y"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Colon,
                TokenKind::Ident("y".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_interpolation_round_trip() {
        assert_eq!(
            kinds(r#""a${x}b""#),
            vec![
                TokenKind::QuoteOpen,
                TokenKind::StrLit("a".into()),
                TokenKind::InterpOpen,
                TokenKind::Ident("x".into()),
                TokenKind::InterpClose,
                TokenKind::StrLit("b".into()),
                TokenKind::QuoteClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn nested_braces_inside_interpolation() {
        assert_eq!(
            kinds(r#""${ { a = 1; }.a }""#),
            vec![
                TokenKind::QuoteOpen,
                TokenKind::InterpOpen,
                TokenKind::LBrace,
                TokenKind::Ident("a".into()),
                TokenKind::Assign,
                TokenKind::Int(1),
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Dot,
                TokenKind::Ident("a".into()),
                TokenKind::InterpClose,
                TokenKind::QuoteClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn indented_string_escapes() {
        assert_eq!(
            kinds("''a'''b''"),
            vec![
                TokenKind::IndQuoteOpen,
                TokenKind::IndStrLit("a''b".into()),
                TokenKind::IndQuoteClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let ctx = SourceContext::new("test.sbl", "\"abc");
        assert!(tokenize("\"abc", &ctx).is_err());
    }
}
