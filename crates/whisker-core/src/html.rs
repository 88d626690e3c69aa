//! HTML escaping for rendered expression output.

use std::borrow::Cow;

/// Escape text for safe inclusion in HTML.
///
/// Encodes `&`, `<`, `>`, `"` and `'`. Returns the input unchanged (and
/// unallocated) when nothing needs escaping.
pub fn escape_html(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }

    let mut escaped = String::with_capacity(input.len() + input.len() / 4);
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_html("<h1>Hello World</h1>"),
            "&lt;h1&gt;Hello World&lt;/h1&gt;"
        );
    }

    #[test]
    fn test_escape_quotes_and_ampersand() {
        assert_eq!(escape_html(r#"a & "b" 'c'"#), "a &amp; &quot;b&quot; &#39;c&#39;");
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(escape_html("plain text"), Cow::Borrowed(_)));
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    /// Escaped output never contains a raw markup character.
    fn check_no_markup_survives(input: &str) -> Result<(), TestCaseError> {
        let escaped = escape_html(input);
        prop_assert!(!escaped.contains(['<', '>', '"', '\'']));
        Ok(())
    }

    proptest! {
        #[test]
        fn no_markup_survives(input in ".{0,64}") {
            check_no_markup_survives(&input)?;
        }
    }
}
