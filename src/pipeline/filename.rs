//! Page title → on-disk basename.
//!
//! Rules, applied in order: trim whitespace; `:` and `/` become `-`; spaces
//! become `_`; `(`, `)`, `'` and `"` are deleted. Anything else passes
//! through untouched. A final trim makes the mapping idempotent even when a
//! deleted character was shielding edge whitespace (`"(\tx"`).
//!
//! Two titles that map to the same basename share a directory. That
//! collision is accepted, not detected.

/// Map an arbitrary page title to a filesystem-safe basename. Never fails.
pub fn sanitize_filename(title: &str) -> String {
    let mut name = String::with_capacity(title.len());
    for c in title.trim().chars() {
        match c {
            ':' | '/' => name.push('-'),
            ' ' => name.push('_'),
            '(' | ')' | '\'' | '"' => {}
            other => name.push(other),
        }
    }
    name.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_and_separators() {
        assert_eq!(sanitize_filename("Foo Bar"), "Foo_Bar");
        assert_eq!(
            sanitize_filename("Software:Petrel Plugins/Anonymizer"),
            "Software-Petrel_Plugins-Anonymizer"
        );
    }

    #[test]
    fn deletes_brackets_and_quotes() {
        assert_eq!(
            sanitize_filename(r#"  Tool (v2) "beta" it's  "#),
            "Tool_v2_beta_its"
        );
    }

    #[test]
    fn other_characters_pass_through() {
        assert_eq!(sanitize_filename("a&b*c?é"), "a&b*c?é");
    }

    #[test]
    fn total_on_odd_input() {
        assert_eq!(sanitize_filename(""), "");
        assert_eq!(sanitize_filename("   "), "");
        assert_eq!(sanitize_filename("()''\"\""), "");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "Foo Bar",
            " a:b/c (d) 'e' \"f\" ",
            "(\tx",
            "x\t)",
            "Ünïcödé: Tïtle",
            "___",
            "\u{3000}wide space\u{3000}",
            "",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            assert_eq!(sanitize_filename(&once), once, "input: {input:?}");
        }
    }
}
