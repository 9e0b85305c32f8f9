//! Ignore rules.
//!
//! Rules are shell globs (`*`, `?`, `[...]`) matched against the whole
//! root-relative key of a path, e.g. `./target/debug`. Wildcards never
//! cross a `/`: `**` is just two single-segment stars, and braces are
//! literal characters rather than alternation.
//!
//! Rules are scanned in order. A matching rule ignores the path, unless it
//! is negated: the first matching negated rule un-ignores the path and stops
//! the scan, so rules after it are never consulted.

use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};

/// One entry of the ignore file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    #[serde(rename = "Pattern", alias = "pattern")]
    pub pattern: String,

    /// A match cancels exclusion instead of causing it.
    #[serde(rename = "IsNeg", alias = "negate", default)]
    pub negate: bool,
}

impl IgnoreRule {
    pub fn ignore(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            negate: false,
        }
    }

    pub fn keep(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            negate: true,
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    /// `None` for a malformed pattern, which never matches.
    matcher: Option<GlobMatcher>,
    negate: bool,
}

/// An ordered, compiled list of [`IgnoreRule`]s.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<CompiledRule>,
}

impl IgnoreRules {
    /// Rules that ignore nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compiles `rules`, keeping their order.
    pub fn new(rules: &[IgnoreRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                let matcher = match GlobBuilder::new(&shell_glob(&rule.pattern))
                    .literal_separator(true)
                    .backslash_escape(true)
                    .build()
                {
                    Ok(glob) => Some(glob.compile_matcher()),
                    Err(e) => {
                        tracing::warn!(pattern = %rule.pattern, error = %e, "ignore pattern never matches");
                        None
                    }
                };
                CompiledRule {
                    matcher,
                    negate: rule.negate,
                }
            })
            .collect();
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `path` is excluded from tracking.
    pub fn is_ignored(&self, path: &str) -> bool {
        let mut matched = false;
        for rule in &self.rules {
            let Some(matcher) = &rule.matcher else {
                continue;
            };
            if !matcher.is_match(path) {
                continue;
            }
            if rule.negate {
                return false;
            }
            matched = true;
        }
        matched
    }
}

/// Rewrites a shell glob into `globset` syntax.
///
/// Runs of `*` collapse to one `*` and `{`/`}` are escaped, outside
/// character classes. Escaped characters are copied as they are.
fn shell_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push(c);
                // A leading `]` (after an optional negation) is a member.
                if let Some(&negation @ ('!' | '^')) = chars.peek() {
                    out.push(negation);
                    chars.next();
                }
                if chars.peek() == Some(&']') {
                    out.push(']');
                    chars.next();
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '*' if !in_class => {
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                out.push('*');
            }
            '{' | '}' if !in_class => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Convenience wrapper for a one-off check.
pub fn is_ignored(path: &str, rules: &[IgnoreRule]) -> bool {
    IgnoreRules::new(rules).is_ignored(path)
}
