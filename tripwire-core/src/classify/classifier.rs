use std::fmt::Display;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::classify::patterns::{DEFAULT_PATTERNS, STATUS_FALLBACK};
use crate::classify::strategy::{RetryStrategy, StrategyTable};
use crate::error::ParseError;
use crate::kind::ErrorKind;

#[derive(Debug, Clone)]
struct PatternGroup {
    kind: ErrorKind,
    patterns: Vec<Regex>,
}

impl PatternGroup {
    fn matches(&self, normalized: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(normalized))
    }
}

static DEFAULT_GROUPS: LazyLock<Vec<PatternGroup>> = LazyLock::new(|| {
    DEFAULT_PATTERNS
        .iter()
        .map(|(kind, pats)| PatternGroup {
            kind: *kind,
            patterns: pats
                .iter()
                .map(|p| Regex::new(p).expect("valid regex"))
                .collect(),
        })
        .collect()
});

/// Something that can be turned into an [`ErrorKind`]: either a raw message
/// that still needs classification or an already-classified kind.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Kind(ErrorKind),
    Message(&'a str),
}

impl From<ErrorKind> for Subject<'_> {
    fn from(kind: ErrorKind) -> Self {
        Subject::Kind(kind)
    }
}

impl<'a> From<&'a str> for Subject<'a> {
    fn from(msg: &'a str) -> Self {
        Subject::Message(msg)
    }
}

impl<'a> From<&'a String> for Subject<'a> {
    fn from(msg: &'a String) -> Self {
        Subject::Message(msg.as_str())
    }
}

/// Maps error text onto [`ErrorKind`]s through an ordered regex table and
/// supplies the per-kind [`RetryStrategy`].
///
/// Groups are tested in insertion order and the first match wins, so a
/// message like `"503 connection refused"` is `network`, not `server`.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    groups: Vec<PatternGroup>,
    strategies: StrategyTable,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self {
            groups: DEFAULT_GROUPS.clone(),
            strategies: StrategyTable::default(),
        }
    }
}

impl ErrorClassifier {
    pub fn new(strategies: StrategyTable) -> Self {
        Self {
            strategies,
            ..Self::default()
        }
    }

    /// Adds a pattern to `kind`'s group without changing group priority.
    pub fn with_pattern(mut self, kind: ErrorKind, pattern: &str) -> Result<Self, ParseError> {
        let re = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ParseError::Pattern {
                kind: kind.to_string(),
                source,
            })?;
        match self.groups.iter_mut().find(|g| g.kind == kind) {
            Some(g) => g.patterns.push(re),
            None => self.groups.push(PatternGroup {
                kind,
                patterns: vec![re],
            }),
        }
        Ok(self)
    }

    pub fn classify<E: Display + ?Sized>(&self, error: &E) -> ErrorKind {
        self.classify_message(&error.to_string())
    }

    /// `None` classifies as [`ErrorKind::Unknown`].
    pub fn classify_optional<E: Display + ?Sized>(&self, error: Option<&E>) -> ErrorKind {
        error.map_or(ErrorKind::Unknown, |e| self.classify(e))
    }

    pub fn classify_message(&self, message: &str) -> ErrorKind {
        let normalized = message.to_lowercase();
        if let Some(g) = self.groups.iter().find(|g| g.matches(&normalized)) {
            return g.kind;
        }
        STATUS_FALLBACK
            .iter()
            .find(|(_, re)| re.is_match(&normalized))
            .map(|(kind, _)| *kind)
            .unwrap_or(ErrorKind::Unknown)
    }

    pub fn resolve<'a>(&self, subject: impl Into<Subject<'a>>) -> ErrorKind {
        match subject.into() {
            Subject::Kind(k) => k,
            Subject::Message(m) => self.classify_message(m),
        }
    }

    pub fn strategy(&self, kind: ErrorKind) -> &RetryStrategy {
        self.strategies.get(kind)
    }

    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    pub fn is_recoverable<'a>(&self, subject: impl Into<Subject<'a>>) -> bool {
        self.strategy(self.resolve(subject)).recoverable
    }

    pub fn max_attempts<'a>(&self, subject: impl Into<Subject<'a>>) -> u32 {
        self.strategy(self.resolve(subject)).max_attempts
    }

    pub fn describe<'a>(&self, subject: impl Into<Subject<'a>>) -> String {
        let kind = self.resolve(subject);
        format!("{kind}: {}", self.strategy(kind).description)
    }
}
