/// The quote characters a title can be wrapped in, in the order they are tried.
const TITLE_QUOTES: &[char] = &['\'', '"'];

/// Strips the `directive` keyword from the start of `line`, returning the remainder.
/// The keyword must be followed by at least one space to count as a directive.
pub(crate) fn strip_directive<'a>(line: &'a str, directive: &str) -> Option<&'a str> {
    line.strip_prefix(directive)
        .filter(|rest| rest.starts_with(' '))
}

/// Extracts the quoted title that leads `rest`, the text after a directive keyword.
///
/// The single-quoted form is tried first, then the double-quoted form. Quotes do not nest,
/// so the title ends at the first matching closing quote.
pub(crate) fn extract(rest: &str) -> Option<&str> {
    // Skip the spaces separating the keyword from the title.
    let rest = rest.trim_start_matches(' ');

    TITLE_QUOTES.iter().find_map(|quote| {
        // The title must start directly with the quote character.
        let inner = rest.strip_prefix(*quote)?;
        // Everything up to the closing quote is the title.
        let end = inner.find(*quote)?;
        Some(&inner[..end])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_quoted_title() {
        assert_eq!(extract(" 'Debian GNU/Linux' --class debian {"), Some("Debian GNU/Linux"));
    }

    #[test]
    fn extracts_double_quoted_title() {
        assert_eq!(extract(" \"Windows 10\" {"), Some("Windows 10"));
    }

    #[test]
    fn single_quote_inside_double_quotes_is_kept() {
        assert_eq!(extract(" \"Bob's Linux\" {"), Some("Bob's Linux"));
    }

    #[test]
    fn empty_title_is_valid() {
        assert_eq!(extract(" '' {"), Some(""));
    }

    #[test]
    fn bare_title_is_rejected() {
        assert_eq!(extract(" Debian {"), None);
        assert_eq!(extract(" 'unterminated {"), None);
    }

    #[test]
    fn directive_requires_separator() {
        assert_eq!(strip_directive("menuentry 'a'", "menuentry"), Some(" 'a'"));
        assert_eq!(strip_directive("menuentry_id_option='x'", "menuentry"), None);
        assert_eq!(strip_directive("submenu", "submenu"), None);
    }
}
