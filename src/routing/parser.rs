//! Route pattern parser.
//!
//! Turns lexer output into literal text, parameter descriptors and literal
//! groups. Parameter capture patterns are resolved here, so the compiler only
//! has to assemble the regular expression.

use std::fmt;

use fancy_regex::escape;

use crate::routing::compiler::{escape_class, PatternOptions};
use crate::routing::error::PatternError;
use crate::routing::lexer::{lex, LexToken, TokenKind};

/// Name of a route parameter: `:name`, or a positional index for unnamed
/// custom patterns such as `/(\d+)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamName {
    Named(String),
    Index(usize),
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamName::Named(name) => f.write_str(name),
            ParamName::Index(index) => write!(f, "{}", index),
        }
    }
}

/// Trailing modifier of a parameter or group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Modifier {
    #[default]
    None,
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Modifier {
    fn from_token(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("?") => Modifier::Optional,
            Some("*") => Modifier::ZeroOrMore,
            Some("+") => Modifier::OneOrMore,
            _ => Modifier::None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOrMore => "+",
        }
    }

    pub fn is_repeat(self) -> bool {
        matches!(self, Modifier::ZeroOrMore | Modifier::OneOrMore)
    }
}

/// Capture descriptor for one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: ParamName,
    /// Literal text matched before the capture, excluded from it.
    pub prefix: String,
    /// Literal text matched after the capture, excluded from it.
    pub suffix: String,
    /// Regular expression for the captured text.
    pub pattern: String,
    pub modifier: Modifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Param(Param),
    /// `{...}` group holding only literal text.
    Group {
        prefix: String,
        suffix: String,
        modifier: Modifier,
    },
}

struct Parser<'a> {
    tokens: Vec<LexToken>,
    pos: usize,
    next_index: usize,
    result: Vec<Token>,
    options: &'a PatternOptions,
}

/// Parse a pattern string into tokens.
pub fn parse(pattern: &str, options: &PatternOptions) -> Result<Vec<Token>, PatternError> {
    let parser = Parser {
        tokens: lex(pattern)?,
        pos: 0,
        next_index: 0,
        result: Vec::new(),
        options,
    };
    parser.run()
}

impl<'a> Parser<'a> {
    fn run(mut self) -> Result<Vec<Token>, PatternError> {
        let mut path = String::new();

        while self.pos < self.tokens.len() {
            let ch = self.try_consume(TokenKind::Char);
            let name = self.try_consume(TokenKind::Name);
            let pattern = self.try_consume(TokenKind::Pattern);

            if name.is_some() || pattern.is_some() {
                let mut prefix = ch.unwrap_or_default();
                if !self.options.prefixes.contains(prefix.as_str()) {
                    path.push_str(&prefix);
                    prefix.clear();
                }

                if !path.is_empty() {
                    self.result.push(Token::Text(std::mem::take(&mut path)));
                }

                let name = match name {
                    Some(name) => ParamName::Named(name),
                    None => self.positional(),
                };
                let pattern = match pattern {
                    Some(pattern) => pattern,
                    None => self.safe_pattern(&prefix)?,
                };
                let modifier = Modifier::from_token(self.try_consume(TokenKind::Modifier));

                self.result.push(Token::Param(Param {
                    name,
                    prefix,
                    suffix: String::new(),
                    pattern,
                    modifier,
                }));
                continue;
            }

            if let Some(value) = ch.or_else(|| self.try_consume(TokenKind::EscapedChar)) {
                path.push_str(&value);
                continue;
            }

            if !path.is_empty() {
                self.result.push(Token::Text(std::mem::take(&mut path)));
            }

            if self.try_consume(TokenKind::Open).is_some() {
                let prefix = self.consume_text();
                let name = self.try_consume(TokenKind::Name).unwrap_or_default();
                let pattern = self.try_consume(TokenKind::Pattern).unwrap_or_default();
                let suffix = self.consume_text();
                self.must_consume(TokenKind::Close)?;
                let modifier = Modifier::from_token(self.try_consume(TokenKind::Modifier));

                if name.is_empty() && pattern.is_empty() {
                    self.result.push(Token::Group {
                        prefix,
                        suffix,
                        modifier,
                    });
                    continue;
                }

                let param_name = if name.is_empty() {
                    self.positional()
                } else {
                    ParamName::Named(name.clone())
                };
                let pattern = if !name.is_empty() && pattern.is_empty() {
                    self.safe_pattern(&prefix)?
                } else {
                    pattern
                };

                self.result.push(Token::Param(Param {
                    name: param_name,
                    prefix,
                    suffix,
                    pattern,
                    modifier,
                }));
                continue;
            }

            self.must_consume(TokenKind::End)?;
        }

        Ok(self.result)
    }

    fn positional(&mut self) -> ParamName {
        let index = self.next_index;
        self.next_index += 1;
        ParamName::Index(index)
    }

    fn try_consume(&mut self, kind: TokenKind) -> Option<String> {
        let token = self.tokens.get(self.pos)?;
        if token.kind != kind {
            return None;
        }
        self.pos += 1;
        Some(token.value.clone())
    }

    fn must_consume(&mut self, kind: TokenKind) -> Result<String, PatternError> {
        if let Some(value) = self.try_consume(kind) {
            return Ok(value);
        }
        let (found, index) = self
            .tokens
            .get(self.pos)
            .map(|t| (t.kind.as_str(), t.index))
            .unwrap_or((TokenKind::End.as_str(), 0));
        Err(PatternError::UnexpectedToken {
            found,
            index,
            expected: kind.as_str(),
        })
    }

    fn consume_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(value) = self
            .try_consume(TokenKind::Char)
            .or_else(|| self.try_consume(TokenKind::EscapedChar))
        {
            text.push_str(&value);
        }
        text
    }

    fn is_safe(&self, text: &str) -> bool {
        self.options.delimiter.chars().any(|d| text.contains(d))
    }

    /// Default capture pattern for a parameter. When the text before the
    /// parameter is not a delimiter, the capture may not contain that text,
    /// so adjacent parameters split unambiguously.
    fn safe_pattern(&self, prefix: &str) -> Result<String, PatternError> {
        let prev = self.result.last();
        let prev_text = if !prefix.is_empty() {
            prefix
        } else {
            match prev {
                Some(Token::Text(text)) => text.as_str(),
                _ => "",
            }
        };

        if prev_text.is_empty() {
            if let Some(prev) = prev {
                let after = match prev {
                    Token::Param(param) => param.name.to_string(),
                    Token::Text(text) => text.clone(),
                    Token::Group { .. } => String::new(),
                };
                return Err(PatternError::MissingTextBetweenParameters { after });
            }
        }

        let delimiter = escape_class(&self.options.delimiter);
        if prev_text.is_empty() || self.is_safe(prev_text) {
            Ok(format!("[^{}]+?", delimiter))
        } else {
            Ok(format!("(?:(?!{})[^{}])+?", escape(prev_text), delimiter))
        }
    }
}
