/// Characters that must be escaped with a backslash to appear inside double quotes.
/// Expansions such as `$var` and command substitutions are left for the shell to perform.
const ESCAPED_CHARACTERS: &[char] = &['\\', '"'];

/// Removes one pair of matching surrounding quotes from `value`.
///
/// In double-quoted values a backslash before one of
/// [ESCAPED_CHARACTERS] is dropped. Single-quoted values are taken literally.
/// Values without matching quotes are returned unchanged.
pub fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        let mut result = String::with_capacity(inner.len());
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\\'
                && let Some(&next) = chars.peek()
                && ESCAPED_CHARACTERS.contains(&next)
            {
                result.push(next);
                chars.next();
                continue;
            }
            result.push(c);
        }
        return result;
    }

    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return value[1..value.len() - 1].to_string();
    }

    value.to_string()
}

/// Wraps `value` in double quotes, escaping embedded quotes and backslashes.
pub fn quote(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for c in value.chars() {
        if ESCAPED_CHARACTERS.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }
    result.push('"');
    result
}
