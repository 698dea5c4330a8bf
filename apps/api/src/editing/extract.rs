//! Locates the command list inside free-form model output.
//!
//! Models wrap their answer in prose and code fences often enough that the raw reply
//! cannot be parsed directly. The list is taken from the first `[` to its matching `]`,
//! counting depth and ignoring brackets inside quoted strings. If that never balances,
//! the widest `[`...`]` span is used instead.

/// Returns the substring holding the outermost bracketed list, or `None` if the text
/// contains no usable `[`...`]` span.
pub fn extract_command_list(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    balanced_span(text, start).or_else(|| widest_span(text, start))
}

fn balanced_span(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

fn widest_span(text: &str, start: usize) -> Option<&str> {
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_list_from_fenced_prose() {
        let reply = "Here you go:\n```\n['a', 'b']\n```";
        assert_eq!(extract_command_list(reply), Some("['a', 'b']"));
    }

    #[test]
    fn test_no_brackets_yields_none() {
        assert_eq!(extract_command_list("I could not understand that."), None);
    }

    #[test]
    fn test_nested_arrays_match_outermost_pair() {
        let reply = r#"Sure! [{"op": "set", "path": ["skills", 0], "value": "Go"}] Let me know."#;
        assert_eq!(
            extract_command_list(reply),
            Some(r#"[{"op": "set", "path": ["skills", 0], "value": "Go"}]"#)
        );
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let reply = r#"[{"op": "append", "path": ["achievements"], "value": "Ranked [1] of 500 ]"}] done"#;
        assert_eq!(
            extract_command_list(reply),
            Some(r#"[{"op": "append", "path": ["achievements"], "value": "Ranked [1] of 500 ]"}]"#)
        );
    }

    #[test]
    fn test_escaped_quotes_do_not_end_string() {
        let reply = r#"["say \"]\" twice"]"#;
        assert_eq!(extract_command_list(reply), Some(reply));
    }

    #[test]
    fn test_unbalanced_falls_back_to_widest_span() {
        let unclosed = "[[1, 2] never closed";
        assert_eq!(extract_command_list(unclosed), Some("[[1, 2]"));
    }

    #[test]
    fn test_close_before_open_yields_none() {
        assert_eq!(extract_command_list("] oops ["), None);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(extract_command_list("```json\n[]\n```"), Some("[]"));
    }
}
