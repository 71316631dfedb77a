//! Pull the JSON document out of free-form provider text.
//!
//! Providers like to wrap the document in prose or code fences. Each `{` is
//! tried in order: its balanced closing brace is found (ignoring braces
//! inside string literals) and the slice goes to serde_json. The first
//! slice that parses as an object wins.
//!
//! One scan records the closing brace of every `{` it passes outside a
//! string, so prose full of stray braces is still walked once.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::FormatError;

pub fn extract_document(text: &str) -> Result<Value, FormatError> {
    let mut ends: HashMap<usize, Option<usize>> = HashMap::new();
    let mut first_error = None;

    for (start, _) in text.match_indices('{') {
        if !ends.contains_key(&start) {
            scan_from(text, start, &mut ends);
        }
        let Some(Some(end)) = ends.get(&start).copied() else {
            continue;
        };
        match serde_json::from_str::<Value>(&text[start..end]) {
            Ok(value @ Value::Object(_)) => return Ok(value),
            Ok(_) => {}
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(FormatError::Json(e)),
        None => Err(FormatError::NoObject),
    }
}

/// Scan from the `{` at `start` until it closes or the text runs out.
/// Every brace opened on the way gets its end recorded: the byte index
/// just past its closing `}`, or `None` when it never closes.
fn scan_from(text: &str, start: usize, ends: &mut HashMap<usize, Option<usize>>) {
    let mut open: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(opened) = open.pop() {
                    ends.insert(opened, Some(i + 1));
                }
                if open.is_empty() {
                    return;
                }
            }
            _ => {}
        }
    }
    for opened in open {
        ends.insert(opened, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_object_inside_prose() {
        let text = "Sure! Here is the reaction:\n```json\n{\"title\": \"A {curly} title\", \"n\": 1}\n```\nEnjoy.";
        let value = extract_document(text).unwrap();
        assert_eq!(value["title"], "A {curly} title");
        assert_eq!(value["n"], 1);
    }

    #[test]
    fn skips_unparseable_candidates() {
        let text = "template {not json} then {\"ok\": true}";
        assert_eq!(extract_document(text).unwrap()["ok"], true);
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let text = r#"{"quote": "she said \"}\" loudly", "x": 2}"#;
        assert_eq!(extract_document(text).unwrap()["x"], 2);
    }

    #[test]
    fn no_object_at_all() {
        assert!(matches!(
            extract_document("I cannot help with that."),
            Err(FormatError::NoObject)
        ));
        // Unbalanced.
        assert!(matches!(extract_document("{\"a\": 1"), Err(FormatError::NoObject)));
    }

    #[test]
    fn stray_brace_in_prose_before_the_document() {
        let text = "The formula {A + B -> C is below.\n{\"title\": \"C\"}";
        assert_eq!(extract_document(text).unwrap()["title"], "C");
    }

    #[test]
    fn many_unclosed_braces_are_scanned_once() {
        let mut text = "{ ".repeat(50_000);
        text.push_str("{\"ok\": true}");
        assert_eq!(extract_document(&text).unwrap()["ok"], true);

        let mut ends = HashMap::new();
        scan_from(&text, 0, &mut ends);
        assert_eq!(ends.len(), 50_001);
        assert_eq!(ends[&0], None);
        assert_eq!(ends[&100_000], Some(text.len()));
    }

    #[test]
    fn reports_json_error_when_every_candidate_is_malformed() {
        assert!(matches!(
            extract_document("{title: 'single quotes'}"),
            Err(FormatError::Json(_))
        ));
    }
}
