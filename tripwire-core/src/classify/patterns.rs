use std::sync::LazyLock;

use regex::Regex;

use crate::kind::ErrorKind;

/// Default pattern groups, in priority order. Patterns run against the
/// lowercased message.
pub(crate) const DEFAULT_PATTERNS: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::Network,
        &[
            r"connection (refused|reset|aborted|closed|error)",
            r"\bnetwork\b",
            r"\bdns\b",
            r"name (or service not known|resolution)",
            r"(host|network) (is )?unreachable",
            r"no route to host",
            r"broken pipe",
            r"econn(refused|reset|aborted)",
            r"failed to establish",
            r"remote end closed",
            r"\bsocket\b",
        ],
    ),
    (
        ErrorKind::Timeout,
        &[r"timed?\s?out", r"deadline exceeded", r"\b408\b"],
    ),
    (
        ErrorKind::RateLimit,
        &[
            r"\b429\b",
            r"rate[\s_-]?limit",
            r"too many requests",
            r"throttl",
            r"quota exceeded",
        ],
    ),
    (
        ErrorKind::Auth,
        &[
            r"\b40[13]\b",
            r"unauthori[sz]ed",
            r"forbidden",
            r"authenticat",
            r"invalid (api[\s_-]?key|token|credentials)",
            r"access denied",
            r"token (expired|revoked)",
        ],
    ),
    (
        ErrorKind::Server,
        &[
            r"\b50[0-4]\b",
            r"internal server error",
            r"bad gateway",
            r"service unavailable",
            r"server error",
        ],
    ),
    (
        ErrorKind::Client,
        &[
            r"\b40[0245-7]\b",
            r"\b41\d\b",
            r"bad request",
            r"not found",
            r"method not allowed",
            r"client error",
        ],
    ),
    (
        ErrorKind::Data,
        &[
            r"\bjson\b",
            r"decod(e|ing)",
            r"pars(e|ing) error",
            r"unexpected (token|eof|end)",
            r"missing field",
            r"key\s?error",
            r"empty response",
            r"no data",
            r"malformed",
        ],
    ),
    (
        ErrorKind::Validation,
        &[r"validat", r"invalid", r"out of range", r"must be", r"\brequired\b"],
    ),
];

/// Bare HTTP-style status codes, checked only when no group matched.
pub(crate) static STATUS_FALLBACK: LazyLock<Vec<(ErrorKind, Regex)>> = LazyLock::new(|| {
    vec![
        (ErrorKind::Server, Regex::new(r"\b5\d{2}\b").expect("valid regex")),
        (ErrorKind::Client, Regex::new(r"\b4\d{2}\b").expect("valid regex")),
    ]
});
