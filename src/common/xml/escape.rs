use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Escape XML special characters.
///
/// # Examples
///
/// ```
/// use runspan::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("<tag>\"hello\"</tag>"), "&lt;tag&gt;&quot;hello&quot;&lt;/tag&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Resolve the body of an entity reference (the part between `&` and `;`).
///
/// Handles the five predefined entities and decimal/hex character references.
/// Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use runspan::common::xml::resolve_entity;
/// assert_eq!(resolve_entity("amp"), Some('&'));
/// assert_eq!(resolve_entity("#x41"), Some('A'));
/// assert_eq!(resolve_entity("#66"), Some('B'));
/// assert_eq!(resolve_entity("nbsp"), None);
/// ```
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        },
    }
}

/// Unescape XML entity and character references.
///
/// Unknown or malformed references are left unchanged.
///
/// # Examples
///
/// ```
/// use runspan::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&quot;hello&apos;"), "\"hello'");
/// assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
/// assert_eq!(unescape_xml("tab&#9;here"), "tab\there");
/// assert_eq!(unescape_xml("a & b"), "a & b");
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// assert_eq!(unescape_xml("&amp"), "&amp");
/// ```
pub fn unescape_xml(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;

    while let Some(offset) = memchr::memchr(b'&', &bytes[pos..]) {
        let amp = pos + offset;
        out.push_str(&s[pos..amp]);

        let resolved = memchr::memchr(b';', &bytes[amp..])
            .and_then(|semi| resolve_entity(&s[amp + 1..amp + semi]).map(|ch| (ch, semi)));

        match resolved {
            Some((ch, semi)) => {
                out.push(ch);
                pos = amp + semi + 1;
            },
            None => {
                out.push('&');
                pos = amp + 1;
            },
        }
    }

    out.push_str(&s[pos..]);
    out
}
