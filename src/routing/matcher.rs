//! Compiled pattern matchers and match results.

use std::fmt;
use std::sync::Arc;

use fancy_regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::routing::parser::{Param, ParamName, Token};

/// Converts raw captured text into a parameter value.
pub type Decoder = Arc<dyn Fn(&str, &Param) -> String + Send + Sync>;

/// Value captured for one parameter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    /// Produced by `*` and `+` modifiers, one entry per repetition.
    Repeated(Vec<String>),
}

impl ParamValue {
    /// The single value, or the first repetition.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(value) => Some(value),
            ParamValue::Repeated(values) => values.first().map(String::as_str),
        }
    }
}

/// Captured parameters, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(ParamName, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, name: ParamName, value: ParamValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Look up a parameter by its name, or by the decimal index of an
    /// unnamed parameter.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| match n {
                ParamName::Named(n) => n == name,
                ParamName::Index(i) => i.to_string() == name,
            })
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamName, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(&name.to_string(), value)?;
        }
        map.end()
    }
}

/// Successful match of a path against a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// The matched portion of the input.
    pub path: String,
    /// Byte offset of the match in the input.
    pub index: usize,
    pub params: Params,
}

/// A compiled route pattern.
pub struct Matcher {
    pattern: String,
    tokens: Vec<Token>,
    regex: Regex,
    keys: Vec<Param>,
    decoder: Option<Decoder>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("pattern", &self.pattern)
            .field("regex", &self.regex.as_str())
            .field("keys", &self.keys)
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}

impl Matcher {
    pub(crate) fn new(pattern: &str, tokens: Vec<Token>, regex: Regex, keys: Vec<Param>) -> Self {
        Self {
            pattern: pattern.to_string(),
            tokens,
            regex,
            keys,
            decoder: None,
        }
    }

    /// Replace the identity decoder.
    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn regex_source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn keys(&self) -> &[Param] {
        &self.keys
    }

    /// Match `path`, returning `None` when it does not match.
    pub fn matches(&self, path: &str) -> Option<MatchResult> {
        let captures = match self.regex.captures(path) {
            Ok(Some(captures)) => captures,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    pattern = %self.pattern,
                    error = %e,
                    "Route pattern evaluation failed"
                );
                return None;
            }
        };
        let whole = captures.get(0)?;

        let mut params = Params::new();
        for (i, key) in self.keys.iter().enumerate() {
            // Optional parameters that did not participate are omitted.
            let Some(m) = captures.get(i + 1) else {
                continue;
            };

            let value = if key.modifier.is_repeat() {
                let separator = format!("{}{}", key.prefix, key.suffix);
                ParamValue::Repeated(
                    m.as_str()
                        .split(separator.as_str())
                        .map(|part| self.decode(part, key))
                        .collect(),
                )
            } else {
                ParamValue::Single(self.decode(m.as_str(), key))
            };
            params.insert(key.name.clone(), value);
        }

        Some(MatchResult {
            path: whole.as_str().to_string(),
            index: whole.start(),
            params,
        })
    }

    fn decode(&self, raw: &str, key: &Param) -> String {
        match &self.decoder {
            Some(decoder) => decoder(raw, key),
            None => raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::compiler::{compile, PatternOptions};

    fn exact(pattern: &str) -> Matcher {
        compile(pattern, &PatternOptions::exact()).unwrap()
    }

    fn prefix(pattern: &str) -> Matcher {
        compile(pattern, &PatternOptions::prefix()).unwrap()
    }

    #[test]
    fn test_exact_match_with_parameter() {
        let m = exact("/api/customers/:id").matches("/api/customers/42").unwrap();
        assert_eq!(m.path, "/api/customers/42");
        assert_eq!(m.index, 0);
        assert_eq!(m.params.get_str("id"), Some("42"));
    }

    #[test]
    fn test_exact_allows_trailing_delimiter() {
        assert!(exact("/api/customers").matches("/api/customers/").is_some());
        assert!(exact("/api/customers").matches("/api/customers/1").is_none());
    }

    #[test]
    fn test_case_insensitive_by_default() {
        assert!(exact("/Login").matches("/login").is_some());
        let sensitive = compile("/Login", &PatternOptions::exact().sensitive(true)).unwrap();
        assert!(sensitive.matches("/login").is_none());
    }

    #[test]
    fn test_prefix_match_respects_segment_boundary() {
        let m = prefix("/api");
        assert_eq!(m.matches("/api/customers").unwrap().path, "/api");
        assert!(m.matches("/apiary").is_none());
        assert!(m.matches("/api").is_some());
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        let m = prefix("/");
        assert_eq!(m.matches("/anything/here").unwrap().path, "/");
        assert_eq!(m.matches("/").unwrap().path, "/");
    }

    #[test]
    fn test_zero_or_more_parameter() {
        let m = exact("/api/customers/:id*");
        let none = m.matches("/api/customers").unwrap();
        assert!(none.params.get("id").is_none());

        let one = m.matches("/api/customers/7").unwrap();
        assert_eq!(
            one.params.get("id"),
            Some(&ParamValue::Repeated(vec!["7".to_string()]))
        );

        let many = m.matches("/api/customers/7/notes").unwrap();
        assert_eq!(
            many.params.get("id"),
            Some(&ParamValue::Repeated(vec![
                "7".to_string(),
                "notes".to_string()
            ]))
        );
    }

    #[test]
    fn test_one_or_more_requires_a_segment() {
        let m = exact("/api/:path+");
        assert!(m.matches("/api").is_none());
        assert!(m.matches("/api/a/b").is_some());
    }

    #[test]
    fn test_optional_parameter() {
        let m = exact("/users/:id?");
        assert!(m.matches("/users").unwrap().params.is_empty());
        assert_eq!(
            m.matches("/users/5").unwrap().params.get_str("id"),
            Some("5")
        );
    }

    #[test]
    fn test_custom_pattern_and_positional_name() {
        let m = exact("/orders/(\\d+)");
        assert_eq!(m.matches("/orders/12").unwrap().params.get_str("0"), Some("12"));
        assert!(m.matches("/orders/abc").is_none());
    }

    #[test]
    fn test_adjacent_parameters_split_on_literal() {
        let m = exact("/:from-:to");
        let result = m.matches("/a-b").unwrap();
        assert_eq!(result.params.get_str("from"), Some("a"));
        assert_eq!(result.params.get_str("to"), Some("b"));
    }

    #[test]
    fn test_custom_decoder() {
        let m = exact("/files/:name")
            .with_decoder(Arc::new(|raw: &str, _: &Param| raw.to_uppercase()));
        assert_eq!(
            m.matches("/files/readme").unwrap().params.get_str("name"),
            Some("README")
        );
    }

    #[test]
    fn test_params_serialize_as_object() {
        let m = exact("/a/:x/(\\d+)").matches("/a/y/3").unwrap();
        let json = serde_json::to_value(&m.params).unwrap();
        assert_eq!(json, serde_json::json!({"x": "y", "0": "3"}));
    }

    #[test]
    fn test_literal_metacharacters_match_verbatim() {
        let m = exact("/files/a.b+c");
        assert!(m.matches("/files/a.b+c").is_some());
        assert!(m.matches("/files/aXbbc").is_none());
    }

    #[test]
    fn test_substituted_values_are_recovered() {
        let m = exact("/shop/:cat?/items/:tags*/by/:path+/page/(\\d+)");
        let repeated =
            |v: &[&str]| ParamValue::Repeated(v.iter().map(|s| s.to_string()).collect());
        let cases: [(Option<&str>, &[&str], &[&str], &str); 3] = [
            (Some("books"), &["a", "b"], &["x", "y"], "3"),
            (None, &[], &["x"], "10"),
            (Some("music"), &["solo"], &["p", "q", "r"], "7"),
        ];

        for (cat, tags, path, page) in cases {
            let mut url = String::from("/shop");
            for segment in cat.iter() {
                url.push('/');
                url.push_str(segment);
            }
            url.push_str("/items");
            for segment in tags {
                url.push('/');
                url.push_str(segment);
            }
            url.push_str("/by");
            for segment in path {
                url.push('/');
                url.push_str(segment);
            }
            url.push_str("/page/");
            url.push_str(page);

            let result = m
                .matches(&url)
                .unwrap_or_else(|| panic!("{} did not match", url));
            assert_eq!(result.path, url);
            assert_eq!(result.params.get_str("cat"), cat);
            if tags.is_empty() {
                assert!(result.params.get("tags").is_none());
            } else {
                assert_eq!(result.params.get("tags"), Some(&repeated(tags)));
            }
            assert_eq!(result.params.get("path"), Some(&repeated(path)));
            assert_eq!(result.params.get_str("0"), Some(page));
        }
    }
}
