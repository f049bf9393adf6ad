//! Syntactic repair stages
//!
//! Each stage fixes one class of near-JSON mistake that generative backends
//! commonly make. Stages are idempotent and, apart from `StripComments`, only
//! touch text outside double-quoted strings.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::debug;

/// One syntactic repair
pub trait Repair {
    /// Stage name recorded when the stage changed the text
    fn name(&self) -> &'static str;

    /// Apply the repair
    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str>;
}

/// Apply `f` to every segment outside double-quoted strings
///
/// An unterminated string runs to end of text and is left untouched.
fn map_code_segments<'a, F>(text: &'a str, f: F) -> Cow<'a, str>
where
    F: Fn(&str) -> Cow<'_, str>,
{
    let mut out = String::with_capacity(text.len());
    let mut changed = false;
    let mut segment_start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                out.push_str(&text[segment_start..=i]);
                segment_start = i + 1;
            }
        } else if c == '"' {
            let code = &text[segment_start..i];
            let mapped = f(code);
            changed |= matches!(mapped, Cow::Owned(_));
            out.push_str(&mapped);
            segment_start = i;
            in_string = true;
        }
    }

    let tail = &text[segment_start..];
    if in_string {
        out.push_str(tail);
    } else {
        let mapped = f(tail);
        changed |= matches!(mapped, Cow::Owned(_));
        out.push_str(&mapped);
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

/// Remove `//` line comments and `/* */` block comments outside strings
pub struct StripComments;

impl Repair for StripComments {
    fn name(&self) -> &'static str {
        "strip_comments"
    }

    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if !text.contains("//") && !text.contains("/*") {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        let mut in_string = false;
        let mut escaped = false;
        let mut changed = false;

        while let Some(c) = chars.next() {
            if in_string {
                out.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == '"' {
                    in_string = false;
                }
                continue;
            }
            match (c, chars.peek()) {
                ('"', _) => {
                    in_string = true;
                    out.push(c);
                }
                ('/', Some('/')) => {
                    changed = true;
                    for next in chars.by_ref() {
                        if next == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                }
                ('/', Some('*')) => {
                    changed = true;
                    chars.next();
                    let mut prev = '\0';
                    for next in chars.by_ref() {
                        if prev == '*' && next == '/' {
                            break;
                        }
                        prev = next;
                    }
                }
                _ => out.push(c),
            }
        }

        if changed {
            Cow::Owned(out)
        } else {
            Cow::Borrowed(text)
        }
    }
}

static EQUALS_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_][\w-]*)\s*=\s*").expect("valid regex")
});

/// `key=value` → `"key": value`
pub struct EqualsAssignments;

impl Repair for EqualsAssignments {
    fn name(&self) -> &'static str {
        "equals_assignments"
    }

    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        map_code_segments(text, |code| EQUALS_ASSIGNMENT.replace_all(code, r#"$1"$2": "#))
    }
}

static SINGLE_QUOTED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^'\n]*)'(\s*):").expect("valid regex"));

/// `'key':` → `"key":`
pub struct SingleQuotedKeys;

impl Repair for SingleQuotedKeys {
    fn name(&self) -> &'static str {
        "single_quoted_keys"
    }

    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        map_code_segments(text, |code| SINGLE_QUOTED_KEY.replace_all(code, r#""$1"$2:"#))
    }
}

// Closing quote is the first one followed by a member or object end
static SINGLE_QUOTED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m):(\s*)'([^\n]*?)'(\s*(?:[,}\]]|$))").expect("valid regex"));

/// `: 'value'` → `: "value"`
pub struct SingleQuotedValues;

impl Repair for SingleQuotedValues {
    fn name(&self) -> &'static str {
        "single_quoted_values"
    }

    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        map_code_segments(text, |code| SINGLE_QUOTED_VALUE.replace_all(code, r#":$1"$2"$3"#))
    }
}

static TRUE_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:True|TRUE)\b").expect("valid regex"));
static FALSE_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:False|FALSE)\b").expect("valid regex"));
static NULL_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:None|NULL|Null|nil|undefined)\b").expect("valid regex"));

/// `True`/`False`/`None`/`NULL` → JSON literals
pub struct NormalizeLiterals;

impl Repair for NormalizeLiterals {
    fn name(&self) -> &'static str {
        "normalize_literals"
    }

    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        map_code_segments(text, |code| {
            let mut out = Cow::Borrowed(code);
            for (pattern, literal) in [
                (&*TRUE_LITERAL, "true"),
                (&*FALSE_LITERAL, "false"),
                (&*NULL_LITERAL, "null"),
            ] {
                if pattern.is_match(&out) {
                    out = Cow::Owned(pattern.replace_all(&out, literal).into_owned());
                }
            }
            out
        })
    }
}

static QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:\bor\b|\|)\s*null\b").expect("valid regex"));

/// Drop `or null` / `| null` trailers copied from schema hints
pub struct StripQualifiers;

impl Repair for StripQualifiers {
    fn name(&self) -> &'static str {
        "strip_qualifiers"
    }

    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        map_code_segments(text, |code| QUALIFIER.replace_all(code, ""))
    }
}

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

/// Remove commas directly before `}` or `]`
pub struct TrailingCommas;

impl Repair for TrailingCommas {
    fn name(&self) -> &'static str {
        "trailing_commas"
    }

    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        map_code_segments(text, |code| TRAILING_COMMA.replace_all(code, "$1"))
    }
}

static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([{,]\s*)([A-Za-z_][\w-]*)(\s*):").expect("valid regex"));

/// `{key: value}` → `{"key": value}`
pub struct QuoteBareKeys;

impl Repair for QuoteBareKeys {
    fn name(&self) -> &'static str {
        "quote_bare_keys"
    }

    fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        map_code_segments(text, |code| BARE_KEY.replace_all(code, r#"$1"$2"$3:"#))
    }
}

/// Text after repair, with the stages that changed it
#[derive(Debug, Clone, PartialEq)]
pub struct Repaired {
    /// Repaired text
    pub text: String,
    /// Names of stages that changed the text, in order
    pub applied: Vec<&'static str>,
}

/// Ordered list of repair stages
pub struct RepairPipeline {
    stages: Vec<Box<dyn Repair + Send + Sync>>,
}

impl RepairPipeline {
    /// Empty pipeline
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Standard stage order
    pub fn standard() -> Self {
        Self::new()
            .with_stage(StripComments)
            .with_stage(EqualsAssignments)
            .with_stage(SingleQuotedKeys)
            .with_stage(SingleQuotedValues)
            .with_stage(NormalizeLiterals)
            .with_stage(StripQualifiers)
            .with_stage(TrailingCommas)
            .with_stage(QuoteBareKeys)
    }

    /// Append a stage
    pub fn with_stage(mut self, stage: impl Repair + Send + Sync + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Stage names in order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order
    pub fn apply(&self, text: &str) -> Repaired {
        let mut current = text.to_string();
        let mut applied = Vec::new();

        for stage in &self.stages {
            if let Cow::Owned(next) = stage.apply(&current) {
                if next != current {
                    debug!("repair stage {} changed payload", stage.name());
                    applied.push(stage.name());
                    current = next;
                }
            }
        }

        Repaired {
            text: current,
            applied,
        }
    }
}

impl Default for RepairPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
