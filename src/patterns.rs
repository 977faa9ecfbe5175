//! Compiled proxy patterns and the comma delimited lists they are configured from.

use crate::error::ConfigurationError;
use comma_separated::CommaSeparatedIterator;
use itertools::Itertools;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;

/// What a matching hop is considered to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// Part of our own network, dropped from the chain entirely.
    Internal,
    /// Outside our network but trusted to report forwarding information, recorded in the
    /// "proxies" header.
    Trusted,
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyKind::Internal => f.write_str("internal"),
            ProxyKind::Trusted => f.write_str("trusted"),
        }
    }
}

/// A regular expression that has to match a hop in full.
#[derive(Debug, Clone)]
pub struct ProxyPattern {
    kind: ProxyKind,
    source: String,
    regex: Regex,
}

impl ProxyPattern {
    /// Compile `source` into a pattern, anchored at both ends.
    pub fn new(kind: ProxyKind, source: &str) -> Result<Self, ConfigurationError> {
        let regex = Regex::new(&format!("^(?:{source})$")).map_err(|source_err| {
            ConfigurationError::InvalidPattern {
                pattern: source.to_owned(),
                source: source_err,
            }
        })?;
        Ok(ProxyPattern {
            kind,
            source: source.to_owned(),
            regex,
        })
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    /// The pattern as it was configured, without the anchors.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// An ordered set of [`ProxyPattern`]s of the same kind.
///
/// The order is kept for debugging only, a value is matched against the whole set.
///
/// ```rust
/// # use x_forwarded::patterns::{ProxyKind, ProxyPatterns};
/// let patterns = ProxyPatterns::compile(ProxyKind::Internal, r"192\.168\..*, 127\.0\.0\.1").unwrap();
/// assert!(patterns.matches_any("192.168.0.10"));
/// assert!(!patterns.matches_any("10.192.168.0"));
/// ```
#[derive(Debug, Clone)]
pub struct ProxyPatterns {
    kind: ProxyKind,
    patterns: Vec<ProxyPattern>,
}

impl ProxyPatterns {
    pub fn empty(kind: ProxyKind) -> Self {
        ProxyPatterns {
            kind,
            patterns: Vec::new(),
        }
    }

    /// Compile a comma delimited list of regular expressions.
    ///
    /// Whitespace around the commas is ignored and empty entries are skipped, so an empty
    /// list yields an empty set.
    pub fn compile(kind: ProxyKind, list: &str) -> Result<Self, ConfigurationError> {
        Self::from_sources(kind, split_comma_delimited(list))
    }

    /// Compile each of the given regular expressions as-is.
    pub fn from_sources<I, S>(kind: ProxyKind, sources: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = sources
            .into_iter()
            .map(|source| ProxyPattern::new(kind, source.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProxyPatterns { kind, patterns })
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    /// `true` if `value` matches at least one of the patterns in full.
    pub fn matches_any(&self, value: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProxyPattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// The patterns as a list [`ProxyPatterns::compile`] accepts, patterns containing a comma
/// are quoted.
impl fmt::Display for ProxyPatterns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources = self.iter().map(|pattern| match pattern.as_str() {
            source if source.contains(',') => Cow::Owned(format!("\"{source}\"")),
            source => Cow::Borrowed(source),
        });
        f.write_str(&join_comma_delimited(sources))
    }
}

/// Split a comma delimited configuration value into its non-empty, trimmed elements.
///
/// Commas inside double or single quotes don't split, and an element wrapped in quotes is
/// taken without them. This is how a pattern such as `\d{1,3}` is configured. A lone
/// apostrophe opens a quote as well, everything after it up to the closing one stays in the
/// same element.
///
/// # Example
///
/// ```rust
/// # use x_forwarded::patterns::split_comma_delimited;
/// assert_eq!(
///     vec!["element1", "element2", "element3"],
///     split_comma_delimited("element1  , element2,\t element3")
/// );
/// assert_eq!(
///     vec![r"10\.\d{1,3}\.\d{1,3}\.\d{1,3}", "proxy1"],
///     split_comma_delimited(r#""10\.\d{1,3}\.\d{1,3}\.\d{1,3}", proxy1"#)
/// );
/// ```
pub fn split_comma_delimited(value: &str) -> Vec<&str> {
    CommaSeparatedIterator::new(value)
        .map(str::trim)
        .map(unquote)
        .filter(|element| !element.is_empty())
        .collect()
}

fn unquote(element: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| element.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(element)
}

/// Join elements into a `", "` delimited header value.
///
/// ```rust
/// # use x_forwarded::patterns::join_comma_delimited;
/// assert_eq!("proxy1, proxy2", join_comma_delimited(["proxy1", "proxy2"]));
/// assert_eq!("", join_comma_delimited(Vec::<String>::new()));
/// ```
pub fn join_comma_delimited<I>(elements: I) -> String
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    elements.into_iter().join(", ")
}
