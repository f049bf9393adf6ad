//! Locate the object span inside generated text and close truncated spans

/// Object-like span found in generated text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    /// Span runs from `{` to its matching `}`
    Closed(&'a str),
    /// Braces never balance; `span` ends at the last `}` and `rest` runs to
    /// end of text
    Greedy {
        /// First `{` to last `}`
        span: &'a str,
        /// First `{` to end of text
        rest: &'a str,
    },
    /// Only an opening brace was found; span runs to end of text
    Open(&'a str),
}

impl<'a> Span<'a> {
    /// The raw slice
    pub fn as_str(&self) -> &'a str {
        match self {
            Span::Closed(s) | Span::Open(s) | Span::Greedy { span: s, .. } => s,
        }
    }

    /// Text from the opening brace to end of text, when the span may be truncated
    pub fn unterminated(&self) -> Option<&'a str> {
        match self {
            Span::Closed(_) => None,
            Span::Greedy { rest, .. } | Span::Open(rest) => Some(rest),
        }
    }
}

/// String-aware brace scanner state
#[derive(Debug, Default)]
struct Scanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl Scanner {
    /// Feed one char; returns true when it is structural (outside a string)
    fn feed(&mut self, c: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == '"' {
                self.in_string = false;
            }
            return false;
        }
        if c == '"' {
            self.in_string = true;
            return false;
        }
        true
    }
}

/// Find the first object span in `text`
///
/// Tries a balanced, string-aware scan from the first `{`. If braces never
/// balance, falls back to the greedy span ending at the last `}` (which may sit
/// in a nested value or a string of a truncated object), and if no `}` follows
/// the opening brace, returns an open span to end of text.
///
/// # Examples
///
/// ```
/// use carbonlens_normalizer::locate::{locate, Span};
///
/// let text = r#"Sure! {"amount": 100} Anything else?"#;
/// assert_eq!(locate(text), Some(Span::Closed(r#"{"amount": 100}"#)));
/// ```
pub fn locate(text: &str) -> Option<Span<'_>> {
    let start = text.find('{')?;
    let rest = &text[start..];

    let mut scanner = Scanner::default();
    for (i, c) in rest.char_indices() {
        if !scanner.feed(c) {
            continue;
        }
        match c {
            '{' => scanner.depth += 1,
            '}' => {
                scanner.depth -= 1;
                if scanner.depth == 0 {
                    return Some(Span::Closed(&rest[..=i]));
                }
            }
            _ => {}
        }
    }

    match rest.rfind('}') {
        Some(end) if end > 0 => Some(Span::Greedy {
            span: &rest[..=end],
            rest,
        }),
        _ => Some(Span::Open(rest)),
    }
}

/// Close an open span, keeping only complete members
///
/// Everything up to the last top-level comma is kept. The trailing segment is
/// kept only when it is a finished `key: value` member whose value is a closed
/// string, a literal, or a closed nested value; a bare number may have been
/// cut mid-digit and is dropped.
///
/// # Examples
///
/// ```
/// use carbonlens_normalizer::locate::complete;
///
/// let open = r#"{"supplier_name": "Acme", "amount": 100, "curr"#;
/// assert_eq!(complete(open), r#"{"supplier_name": "Acme", "amount": 100}"#);
/// ```
pub fn complete(open: &str) -> String {
    let body = open.strip_prefix('{').unwrap_or(open);

    let mut scanner = Scanner::default();
    let mut last_boundary = 0;
    for (i, c) in body.char_indices() {
        if !scanner.feed(c) {
            continue;
        }
        match c {
            '{' | '[' => scanner.depth += 1,
            '}' | ']' => scanner.depth = scanner.depth.saturating_sub(1),
            ',' if scanner.depth == 0 => last_boundary = i,
            _ => {}
        }
    }

    let tail = body[last_boundary..].trim_start_matches(',');
    let keep = if !scanner.in_string && scanner.depth == 0 && is_complete_member(tail) {
        body
    } else {
        &body[..last_boundary]
    };

    format!("{{{}}}", keep.trim_end().trim_end_matches(','))
}

fn is_complete_member(segment: &str) -> bool {
    let trimmed = segment.trim();
    if !trimmed.contains(':') {
        return false;
    }
    trimmed.ends_with('"')
        || trimmed.ends_with('\'')
        || trimmed.ends_with('}')
        || trimmed.ends_with(']')
        || ["null", "true", "false"].iter().any(|lit| trimmed.ends_with(lit))
}
