//! Small text utilities for shaping responder output.

/// Splits text into trimmed sentences or list items.
///
/// Bullet and numbering prefixes are stripped; blank pieces are dropped.
pub fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in text.lines() {
        let line = strip_list_marker(line.trim());
        if line.is_empty() {
            continue;
        }
        let mut current = String::new();
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            current.push(ch);
            let boundary = matches!(ch, '.' | '!' | '?')
                && chars.peek().is_none_or(|next| next.is_whitespace());
            if boundary {
                push_piece(&mut out, &current);
                current.clear();
            }
        }
        push_piece(&mut out, &current);
    }
    out
}

fn push_piece(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}

fn strip_list_marker(line: &str) -> &str {
    let line = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
        .unwrap_or(line);
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return rest.trim_start();
        }
    }
    line
}

pub fn is_question(sentence: &str) -> bool {
    sentence.trim_end().ends_with('?')
}

/// Up to `max` non-question sentences.
pub fn statements(text: &str, max: usize) -> Vec<String> {
    sentences(text)
        .into_iter()
        .filter(|s| !is_question(s))
        .take(max)
        .collect()
}

/// The last question in `text`, if any.
pub fn last_question(text: &str) -> Option<String> {
    sentences(text).into_iter().rev().find(|s| is_question(s))
}

/// Bullet block, one `- ` line per item.
pub fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_split_and_strip_markers() {
        let text = "- Keep corridors short. Avoid dead ends!\n2. Use daylight as a guide\n\nWhere do people enter?";
        assert_eq!(
            sentences(text),
            vec![
                "Keep corridors short.",
                "Avoid dead ends!",
                "Use daylight as a guide",
                "Where do people enter?"
            ]
        );
    }

    #[test]
    fn test_decimal_point_is_not_a_boundary() {
        assert_eq!(sentences("Stairs need 1.2m clearance."), vec!["Stairs need 1.2m clearance."]);
    }

    #[test]
    fn test_statements_and_questions() {
        let text = "Good start. What drives the plan? It is compact. Who uses it?";
        assert_eq!(statements(text, 5), vec!["Good start.", "It is compact."]);
        assert_eq!(last_question(text).as_deref(), Some("Who uses it?"));
        assert_eq!(last_question("No questions here."), None);
    }
}
