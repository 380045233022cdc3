//! Helpers shared by the quick-xml adapters.

/// Checks if text consists only of XML whitespace.
///
/// Such text between elements is formatting, not content.
pub fn is_whitespace_text(text: &str) -> bool {
    text.bytes().all(|b| matches!(b, b' ' | b'\n' | b'\r' | b'\t'))
}

/// Checks if a name is a valid XML name without a colon.
///
/// Limited to the ASCII punctuation XML allows; any alphabetic or numeric
/// character counts as a letter or digit.
pub fn is_ncname(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | '\u{B7}'))
}

/// Checks if a character may appear in an XML 1.0 document.
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
}

/// Returns the first character that may not appear in an XML document.
pub fn find_illegal_char(text: &str) -> Option<char> {
    text.chars().find(|&c| !is_xml_char(c))
}

/// Splits a lexical XML name into `(prefix, local)`.
pub fn split_qname(name: &str) -> (&str, &str) {
    name.split_once(':').unwrap_or(("", name))
}

/// Splits CDATA content so no section contains the `]]>` terminator.
///
/// `a]]>b` becomes `a]]` and `>b`, which read back as one run.
pub fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_whitespace_text() {
        assert!(is_whitespace_text(" \n\t\r"));
        assert!(is_whitespace_text(""));
        assert!(!is_whitespace_text(" a "));
    }

    #[test]
    fn test_is_ncname() {
        assert!(is_ncname("feed"));
        assert!(is_ncname("_x-1.y"));
        assert!(is_ncname("caf\u{E9}"));
        assert!(!is_ncname(""));
        assert!(!is_ncname("1x"));
        assert!(!is_ncname("a b"));
        assert!(!is_ncname("a:b"));
        assert!(!is_ncname("-a"));
    }

    #[test]
    fn test_illegal_chars() {
        assert_eq!(find_illegal_char("tab\tnew\nline\r"), None);
        assert_eq!(find_illegal_char("a\u{0}b"), Some('\u{0}'));
        assert_eq!(find_illegal_char("bell\u{7}"), Some('\u{7}'));
        assert_eq!(find_illegal_char("\u{FFFF}"), Some('\u{FFFF}'));
        assert!(is_xml_char('\u{10000}'));
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("a:b"), ("a", "b"));
        assert_eq!(split_qname("b"), ("", "b"));
    }

    #[test]
    fn test_cdata_sections() {
        assert_eq!(cdata_sections("plain"), vec!["plain"]);
        assert_eq!(cdata_sections("a]]>b"), vec!["a]]", ">b"]);
        assert_eq!(cdata_sections("]]>]]>"), vec!["]]", ">]]", ">"]);
    }
}
