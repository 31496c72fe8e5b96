//! Route pattern compiler.
//!
//! # Responsibilities
//! - Assemble a regular expression from parsed tokens
//! - Apply matching options (case, strict trailing delimiter, anchoring)
//! - Cache compiled matchers by (pattern, options)
//!
//! # Design Decisions
//! - `fancy-regex` backs the matchers: parameter patterns rely on negative
//!   lookahead, which the `regex` crate does not support
//! - Compilation happens once per route when the table is built, never per
//!   request

use std::sync::Arc;

use dashmap::DashMap;
use fancy_regex::{escape, Regex};

use crate::routing::error::PatternError;
use crate::routing::matcher::Matcher;
use crate::routing::parser::{parse, Modifier, Param, Token};

/// Options controlling how a pattern is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternOptions {
    /// Case sensitive matching.
    pub sensitive: bool,
    /// Disallow an optional trailing delimiter.
    pub strict: bool,
    /// Anchor the match at the start of the input.
    pub start: bool,
    /// Require the pattern to consume the whole input.
    pub end: bool,
    /// Characters that separate path segments.
    pub delimiter: String,
    /// Characters automatically treated as a parameter prefix.
    pub prefixes: String,
    /// Characters that may follow the match when `end` is set.
    pub ends_with: String,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            sensitive: false,
            strict: false,
            start: true,
            end: true,
            delimiter: "/#?".to_string(),
            prefixes: "./".to_string(),
            ends_with: String::new(),
        }
    }
}

impl PatternOptions {
    /// Options for an exact, whole-path match.
    pub fn exact() -> Self {
        Self::default()
    }

    /// Options for a prefix match that stops at a delimiter boundary.
    pub fn prefix() -> Self {
        Self {
            end: false,
            ..Self::default()
        }
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Escape `text` for use inside a character class.
pub(crate) fn escape_class(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | ']' | '[' | '^' | '-' | '&' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Compile a pattern string into a matcher.
pub fn compile(pattern: &str, options: &PatternOptions) -> Result<Matcher, PatternError> {
    let tokens = parse(pattern, options)?;
    let (source, keys) = tokens_to_regex(&tokens, options)?;
    let regex = build_regex(&source, options.sensitive)?;
    Ok(Matcher::new(pattern, tokens, regex, keys))
}

fn build_regex(source: &str, sensitive: bool) -> Result<Regex, PatternError> {
    let full = if sensitive {
        source.to_string()
    } else {
        format!("(?i){}", source)
    };
    Regex::new(&full).map_err(|e| PatternError::Regex {
        source_pattern: full.clone(),
        message: e.to_string(),
    })
}

/// Build the regular expression source for a token list, returning it with
/// the parameter descriptors in capture-group order.
pub(crate) fn tokens_to_regex(
    tokens: &[Token],
    options: &PatternOptions,
) -> Result<(String, Vec<Param>), PatternError> {
    let delimiter_re = format!("[{}]", escape_class(&options.delimiter));
    let ends_with_re = if options.ends_with.is_empty() {
        "$".to_string()
    } else {
        format!("[{}]|$", escape_class(&options.ends_with))
    };

    let mut route = String::new();
    let mut keys = Vec::new();

    if options.start {
        route.push('^');
    }

    for token in tokens {
        match token {
            Token::Text(text) => route.push_str(&escape(text)),
            Token::Group {
                prefix,
                suffix,
                modifier,
            } => {
                route.push_str(&format!(
                    "(?:{}{}){}",
                    escape(prefix),
                    escape(suffix),
                    modifier.as_str()
                ));
            }
            Token::Param(param) => {
                route.push_str(&param_to_regex(param)?);
                keys.push(param.clone());
            }
        }
    }

    if options.end {
        if !options.strict {
            route.push_str(&delimiter_re);
            route.push('?');
        }
        if options.ends_with.is_empty() {
            route.push('$');
        } else {
            route.push_str(&format!("(?={})", ends_with_re));
        }
    } else {
        let end_delimited = match tokens.last() {
            Some(Token::Text(text)) => text
                .chars()
                .last()
                .map_or(false, |c| options.delimiter.contains(c)),
            Some(_) => false,
            None => true,
        };

        if !options.strict {
            route.push_str(&format!("(?:{}(?={}))?", delimiter_re, ends_with_re));
        }
        if !end_delimited {
            route.push_str(&format!("(?={}|{})", delimiter_re, ends_with_re));
        }
    }

    Ok((route, keys))
}

fn param_to_regex(param: &Param) -> Result<String, PatternError> {
    let prefix = escape(&param.prefix);
    let suffix = escape(&param.suffix);
    let modifier = param.modifier.as_str();

    if param.pattern.is_empty() {
        return Ok(format!("(?:{}{}){}", prefix, suffix, modifier));
    }

    let body = &param.pattern;
    if !prefix.is_empty() || !suffix.is_empty() {
        if param.modifier.is_repeat() {
            let optional = if param.modifier == Modifier::ZeroOrMore {
                "?"
            } else {
                ""
            };
            return Ok(format!(
                "(?:{p}((?:{r})(?:{s}{p}(?:{r}))*){s}){o}",
                p = prefix,
                r = body,
                s = suffix,
                o = optional
            ));
        }
        return Ok(format!("(?:{}({}){}){}", prefix, body, suffix, modifier));
    }

    if param.modifier.is_repeat() {
        return Err(PatternError::RepeatWithoutAffix {
            name: param.name.to_string(),
        });
    }
    Ok(format!("({}){}", body, modifier))
}

/// Compiled matchers keyed by pattern and options.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: DashMap<(String, PatternOptions), Arc<Matcher>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached matcher for `pattern`, compiling it on first use.
    pub fn compile(
        &self,
        pattern: &str,
        options: &PatternOptions,
    ) -> Result<Arc<Matcher>, PatternError> {
        let key = (pattern.to_string(), options.clone());
        if let Some(matcher) = self.compiled.get(&key) {
            return Ok(Arc::clone(matcher.value()));
        }

        let matcher = Arc::new(compile(pattern, options)?);
        self.compiled.insert(key, Arc::clone(&matcher));
        Ok(matcher)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}
