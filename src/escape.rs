//! Conversion between literal text and its markup form.
//!
//! Only the five predefined entities are known. Both directions make a
//! single left-to-right pass, so escaping twice double-encodes the
//! ampersands and unescaping undoes exactly one level:
//!
//! ```
//! use lossless_xml::escape::{escape, unescape};
//!
//! assert_eq!(escape(&escape("a & b")), "a &amp;amp; b");
//! assert_eq!(unescape("a &amp;lt; b"), "a &lt; b");
//! ```

use std::borrow::Cow;

const ENTITIES: [(char, &str); 5] = [
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    ('"', "&quot;"),
    ('\'', "&apos;"),
];

fn entity_for(c: char) -> Option<&'static str> {
    ENTITIES.iter().find(|&&(l, _)| l == c).map(|&(_, e)| e)
}

fn literal_for(markup: &str) -> Option<(char, usize)> {
    ENTITIES
        .iter()
        .find(|&&(_, e)| markup.starts_with(e))
        .map(|&(l, e)| (l, e.len()))
}

/// Replaces each reserved character with its named entity.
pub fn escape(raw: &str) -> Cow<'_, str> {
    let first = match raw.find(|c: char| entity_for(c).is_some()) {
        Some(idx) => idx,
        None => return Cow::Borrowed(raw),
    };

    let mut out = String::with_capacity(raw.len() + 8);
    out.push_str(&raw[..first]);

    for c in raw[first..].chars() {
        match entity_for(c) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
    }

    Cow::Owned(out)
}

/// Replaces each named entity with its literal character.
///
/// Unknown references and bare `&` are left as they are.
pub fn unescape(markup: &str) -> Cow<'_, str> {
    if !markup.contains('&') {
        return Cow::Borrowed(markup);
    }

    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        match literal_for(rest) {
            Some((literal, len)) => {
                out.push(literal);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

#[cfg(test)]
mod test {
    use super::{escape, unescape};

    #[test]
    fn escapes_each_reserved_character() {
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("a < b"), "a &lt; b");
        assert_eq!(escape("a > b"), "a &gt; b");
        assert_eq!(escape("a \" b"), "a &quot; b");
        assert_eq!(escape("a ' b"), "a &apos; b");
    }

    #[test]
    fn escaping_plain_text_borrows() {
        assert!(matches!(escape("plain"), std::borrow::Cow::Borrowed("plain")));
    }

    #[test]
    fn escaping_twice_double_encodes() {
        assert_eq!(escape(&escape("a & b")), "a &amp;amp; b");
        assert_eq!(escape("a &amp; b"), "a &amp;amp; b");
    }

    #[test]
    fn unescapes_each_entity() {
        assert_eq!(unescape("a &amp; b"), "a & b");
        assert_eq!(unescape("a &lt; b"), "a < b");
        assert_eq!(unescape("a &gt; b"), "a > b");
        assert_eq!(unescape("a &quot; b"), "a \" b");
        assert_eq!(unescape("a &apos; b"), "a ' b");
    }

    #[test]
    fn unescaping_undoes_only_one_level() {
        assert_eq!(unescape("a &amp;lt; b"), "a &lt; b");
        assert_eq!(unescape("&amp;amp;"), "&amp;");
    }

    #[test]
    fn unescaping_leaves_unknown_references_alone() {
        assert_eq!(unescape("&nbsp; & &#60; &amp"), "&nbsp; & &#60; &amp");
    }

    #[test]
    fn unescaping_tolerates_literal_reserved_characters() {
        assert_eq!(unescape("a \" ' < > b"), "a \" ' < > b");
    }

    #[test]
    fn unescape_inverts_escape() {
        for s in ["", "x", "<a href=\"#\">Tom & Jerry's</a>", "&amp;", "üñí & çødé"] {
            assert_eq!(unescape(&escape(s)), s);
        }
    }
}
