//! Route pattern tokenizer.
//!
//! Splits a pattern string into grammar tokens: literal characters, escaped
//! characters, `{`/`}`, `:name` parameters, `(...)` custom patterns and
//! `*`/`+`/`?` modifiers. Indexes are character offsets.

use crate::routing::error::PatternError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Modifier,
    EscapedChar,
    Open,
    Close,
    Name,
    Pattern,
    Char,
    End,
}

impl TokenKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TokenKind::Modifier => "MODIFIER",
            TokenKind::EscapedChar => "ESCAPED_CHAR",
            TokenKind::Open => "OPEN",
            TokenKind::Close => "CLOSE",
            TokenKind::Name => "NAME",
            TokenKind::Pattern => "PATTERN",
            TokenKind::Char => "CHAR",
            TokenKind::End => "END",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LexToken {
    pub kind: TokenKind,
    pub index: usize,
    pub value: String,
}

impl LexToken {
    fn new(kind: TokenKind, index: usize, value: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            value: value.into(),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize a pattern. The returned list always ends with an `End` token.
pub(crate) fn lex(pattern: &str) -> Result<Vec<LexToken>, PatternError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        match c {
            '*' | '+' | '?' => {
                tokens.push(LexToken::new(TokenKind::Modifier, i, c));
                i += 1;
            }
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or(PatternError::DanglingEscape { index: i })?;
                tokens.push(LexToken::new(TokenKind::EscapedChar, i, *escaped));
                i += 2;
            }
            '{' => {
                tokens.push(LexToken::new(TokenKind::Open, i, c));
                i += 1;
            }
            '}' => {
                tokens.push(LexToken::new(TokenKind::Close, i, c));
                i += 1;
            }
            ':' => {
                let name: String = chars[i + 1..]
                    .iter()
                    .take_while(|c| is_name_char(**c))
                    .collect();
                if name.is_empty() {
                    return Err(PatternError::MissingName { index: i });
                }
                let consumed = name.chars().count();
                tokens.push(LexToken::new(TokenKind::Name, i, name));
                i += 1 + consumed;
            }
            '(' => {
                let (value, next) = lex_custom_pattern(&chars, i)?;
                tokens.push(LexToken::new(TokenKind::Pattern, i, value));
                i = next;
            }
            _ => {
                tokens.push(LexToken::new(TokenKind::Char, i, c));
                i += 1;
            }
        }
    }

    tokens.push(LexToken::new(TokenKind::End, i, ""));
    Ok(tokens)
}

/// Read a `(...)` custom pattern starting at `open`. Returns the inner text
/// and the index just past the closing paren.
fn lex_custom_pattern(chars: &[char], open: usize) -> Result<(String, usize), PatternError> {
    let mut depth = 1usize;
    let mut value = String::new();
    let mut j = open + 1;

    if chars.get(j) == Some(&'?') {
        return Err(PatternError::PatternStartsWithQuestion { index: j });
    }

    while j < chars.len() {
        let c = chars[j];

        if c == '\\' {
            value.push(c);
            if let Some(next) = chars.get(j + 1) {
                value.push(*next);
            }
            j += 2;
            continue;
        }

        if c == ')' {
            depth -= 1;
            if depth == 0 {
                j += 1;
                break;
            }
        } else if c == '(' {
            depth += 1;
            if chars.get(j + 1) != Some(&'?') {
                return Err(PatternError::CapturingGroup { index: j });
            }
        }

        value.push(c);
        j += 1;
    }

    if depth != 0 {
        return Err(PatternError::UnbalancedPattern { index: open });
    }
    if value.is_empty() {
        return Err(PatternError::MissingPattern { index: open });
    }

    Ok((value, j))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pattern: &str) -> Vec<TokenKind> {
        lex(pattern).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_named_parameter() {
        let tokens = lex("/user/:id").unwrap();
        let last = &tokens[tokens.len() - 2];
        assert_eq!(last.kind, TokenKind::Name);
        assert_eq!(last.value, "id");
        assert_eq!(last.index, 6);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::End);
    }

    #[test]
    fn test_lex_group_and_modifier() {
        assert_eq!(
            kinds("{/:id}?"),
            vec![
                TokenKind::Open,
                TokenKind::Char,
                TokenKind::Name,
                TokenKind::Close,
                TokenKind::Modifier,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_lex_custom_pattern_with_non_capturing_group() {
        let tokens = lex("/(\\d+(?:-\\d+)?)").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Pattern);
        assert_eq!(tokens[1].value, "\\d+(?:-\\d+)?");
    }

    #[test]
    fn test_lex_escaped_char() {
        let tokens = lex("\\:literal").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::EscapedChar);
        assert_eq!(tokens[0].value, ":");
    }

    #[test]
    fn test_lex_errors() {
        assert_eq!(lex("/:").unwrap_err(), PatternError::MissingName { index: 1 });
        assert_eq!(lex("/:-x").unwrap_err(), PatternError::MissingName { index: 1 });
        assert_eq!(
            lex("/(?:x)").unwrap_err(),
            PatternError::PatternStartsWithQuestion { index: 2 }
        );
        assert_eq!(
            lex("/(a(b))").unwrap_err(),
            PatternError::CapturingGroup { index: 3 }
        );
        assert_eq!(
            lex("/(abc").unwrap_err(),
            PatternError::UnbalancedPattern { index: 1 }
        );
        assert_eq!(lex("/()").unwrap_err(), PatternError::MissingPattern { index: 1 });
        assert_eq!(lex("/x\\").unwrap_err(), PatternError::DanglingEscape { index: 2 });
    }
}
