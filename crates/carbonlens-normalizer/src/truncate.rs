//! Truncate an object at the first line that is not an object member
//!
//! Generative backends sometimes keep writing prose inside the object after
//! the last real field. The object is cut before the first top-level line that
//! neither starts a quoted member nor closes the object, then re-closed.

use regex::Regex;
use std::sync::LazyLock;

static MEMBER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"(?:[^"\\]|\\.)*"\s*:"#).expect("valid regex"));

/// Cut `text` at the first line breaking member grammar and close the object
///
/// Returns `None` when no such line exists (nothing to cut).
///
/// # Examples
///
/// ```
/// use carbonlens_normalizer::truncate::truncate_at_grammar_break;
///
/// let text = "{\n\"amount\": 100,\nThe invoice also mentions taxes.\n}";
/// assert_eq!(truncate_at_grammar_break(text).as_deref(), Some("{\n\"amount\": 100}"));
/// ```
pub fn truncate_at_grammar_break(text: &str) -> Option<String> {
    let mut kept: Vec<&str> = Vec::new();
    let mut depth: i64 = 0;
    let mut broke = false;

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        let at_member_level = depth == 1;
        let acceptable = index == 0
            || !at_member_level
            || trimmed.is_empty()
            || trimmed.starts_with('}')
            || MEMBER_LINE.is_match(line);

        if !acceptable {
            broke = true;
            break;
        }
        depth += structural_delta(line);
        kept.push(line);
    }

    if !broke {
        return None;
    }

    let joined = kept.join("\n");
    let body = joined.trim_end().trim_end_matches(',');
    Some(format!("{}}}", body))
}

/// Net brace/bracket depth change of one line, ignoring strings
fn structural_delta(line: &str) -> i64 {
    let mut delta = 0;
    let mut in_string = false;
    let mut escaped = false;
    for c in line.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => delta += 1,
            '}' | ']' => delta -= 1,
            _ => {}
        }
    }
    delta
}
