use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("identifier pattern is valid"));

/// True if `s` can be written as a bare object key or block label.
/// Keywords are excluded since they read back as literals.
pub fn is_identifier(s: &str) -> bool {
    IDENTIFIER.is_match(s) && !matches!(s, "true" | "false" | "null" | "for")
}

/// Double-quoted string literal with escapes. Literal `${` and `%{`
/// are doubled so they are not read back as templates.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');

    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }

    out.push('"');
    out
}

/// Object key: bare when it is an identifier, quoted otherwise.
pub fn format_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote_string(key)
    }
}
