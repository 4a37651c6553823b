//! Converts XML strings into a document tree that keeps every byte of
//! formatting.
//!
//! ### Example
//!
//! ```
//! use lossless_xml::parser;
//!
//! let xml = r#"<?xml version="1.0"?>
//! <!-- Awesome data incoming -->
//! <data awesome = 'true' >
//!   <datum>Science</datum>
//!   <datum><![CDATA[Literature]]></datum>
//!   <datum>Math &gt; others</datum>
//! </data>"#;
//! let doc = parser::parse(xml).expect("Failed to parse");
//! assert_eq!(doc.to_string(), xml);
//! ```
//!
//! ### Error handling
//!
//! Parsing stops at the first problem. The error names the construct that
//! failed and the byte offset at which it was detected; for constructs that
//! are never closed, that is where they were opened.
//!
//! ### Leniency
//!
//! Names are scanned by character class only, attribute values may be
//! unquoted or missing altogether, and entity references are not checked.
//! This lets near-XML dialects, such as templates, round-trip unchanged.

use peresil::{Progress, Status, StringPoint};
use tracing::debug;

use super::dom::{
    Attribute, CData, ChildOfElement, ChildOfRoot, Comment, Doctype, Document, Element,
    ProcessingInstruction, Quote, Text,
};
use super::str::XmlStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unterminated comment starting at position {start}")]
    UnterminatedComment { start: usize },
    #[error("Unterminated CDATA section starting at position {start}")]
    UnterminatedCData { start: usize },
    #[error("Unterminated processing instruction starting at position {start}")]
    UnterminatedProcessingInstruction { start: usize },
    #[error("Unterminated DOCTYPE declaration starting at position {start}")]
    UnterminatedDoctype { start: usize },
    #[error("Unterminated attribute value for \"{name}\" starting at position {start}")]
    UnterminatedAttributeValue { name: String, start: usize },
    #[error("Unterminated element <{tag}> starting at position {start}")]
    UnterminatedElement { tag: String, start: usize },
    #[error("Mismatched closing tag at position {position}: expected </{expected}> \
             (opened at position {start}) but found </{found}>")]
    MismatchedClosingTag { expected: String, found: String, start: usize, position: usize },
    #[error("Unexpected closing tag </{found}> at position {position}")]
    UnexpectedClosingTag { found: String, position: usize },
    #[error("Unexpected node type Doctype as child of <{tag}> at position {position}")]
    UnexpectedDoctype { tag: String, position: usize },
    #[error("Unexpected node type Doctype in fragment at position {position}")]
    UnexpectedDoctypeInFragment { position: usize },
    #[error("Expected tag name at position {position}")]
    ExpectedTagName { position: usize },
    #[error("Expected attribute name at position {position}")]
    ExpectedAttributeName { position: usize },
    #[error("Expected '>' or '/>' at position {position}")]
    ExpectedStartTagEnd { position: usize },
    #[error("Expected '>' at end of closing tag for <{tag}> at position {position}")]
    ExpectedClosingTagEnd { tag: String, position: usize },
    #[error("Elements nested deeper than {limit} levels at position {position}")]
    NestingTooDeep { limit: usize, position: usize },
}

impl SyntaxError {
    /// The byte offset into the input at which the error was detected.
    pub fn location(&self) -> usize {
        use self::SyntaxError::*;

        match *self {
            UnterminatedComment { start } |
            UnterminatedCData { start } |
            UnterminatedProcessingInstruction { start } |
            UnterminatedDoctype { start } |
            UnterminatedAttributeValue { start, .. } |
            UnterminatedElement { start, .. } => start,
            MismatchedClosingTag { position, .. } |
            UnexpectedClosingTag { position, .. } |
            UnexpectedDoctype { position, .. } |
            UnexpectedDoctypeInFragment { position } |
            ExpectedTagName { position } |
            ExpectedAttributeName { position } |
            ExpectedStartTagEnd { position } |
            ExpectedClosingTagEnd { position, .. } |
            NestingTooDeep { position, .. } => position,
        }
    }
}

/// How many elements may be open at once. Parsing recurses once per open
/// element, so this bounds stack use.
pub const MAX_DEPTH: usize = 256;

type XmlProgress<'a, T> = Progress<StringPoint<'a>, T, SyntaxError>;

trait PrivateXmlParseExt<'a> {
    fn advance(self, len: usize) -> (StringPoint<'a>, &'a str);
    fn consume_space(self) -> (StringPoint<'a>, &'a str);
    fn consume_name(self) -> (StringPoint<'a>, &'a str);
}

impl<'a> PrivateXmlParseExt<'a> for StringPoint<'a> {
    fn advance(self, len: usize) -> (StringPoint<'a>, &'a str) {
        let next = StringPoint { s: &self.s[len..], offset: self.offset + len };
        (next, &self.s[..len])
    }

    fn consume_space(self) -> (StringPoint<'a>, &'a str) {
        self.advance(self.s.end_of_space())
    }

    fn consume_name(self) -> (StringPoint<'a>, &'a str) {
        self.advance(self.s.end_of_name())
    }
}

fn parse_text<'a>(xml: StringPoint<'a>) -> XmlProgress<'a, Text> {
    let (xml, text) = xml.advance(xml.s.end_of_char_data());
    Progress::success(xml, Text::new(text))
}

fn parse_comment<'a>(xml: StringPoint<'a>) -> XmlProgress<'a, Comment> {
    let start = xml.offset;
    let (xml, _) = xml.advance("<!--".len());
    let (xml, content) = try_parse!(
        xml.consume_to(xml.s.end_of_comment())
            .map_err(|_| SyntaxError::UnterminatedComment { start })
    );
    let (xml, _) = xml.advance("-->".len());

    Progress::success(xml, Comment::new(content))
}

fn parse_cdata<'a>(xml: StringPoint<'a>) -> XmlProgress<'a, CData> {
    let start = xml.offset;
    let (xml, _) = xml.advance("<![CDATA[".len());
    let (xml, content) = try_parse!(
        xml.consume_to(xml.s.end_of_cdata())
            .map_err(|_| SyntaxError::UnterminatedCData { start })
    );
    let (xml, _) = xml.advance("]]>".len());

    Progress::success(xml, CData::new(content))
}

fn parse_doctype<'a>(xml: StringPoint<'a>) -> XmlProgress<'a, Doctype> {
    let start = xml.offset;
    let (xml, _) = xml.advance("<!DOCTYPE".len());
    let (xml, body) = try_parse!(
        xml.consume_to(xml.s.end_of_doctype())
            .map_err(|_| SyntaxError::UnterminatedDoctype { start })
    );
    let (xml, _) = xml.advance(">".len());

    let content = body.trim_start();
    let leading_ws = &body[..body.len() - content.len()];
    let content = content.trim_end();
    let trailing_ws = &body[leading_ws.len() + content.len()..];

    Progress::success(xml, Doctype {
        content: content.to_owned(),
        leading_ws: leading_ws.to_owned(),
        trailing_ws: trailing_ws.to_owned(),
    })
}

fn parse_pi<'a>(xml: StringPoint<'a>) -> XmlProgress<'a, ProcessingInstruction> {
    let start = xml.offset;
    let (xml, _) = xml.advance("<?".len());
    let (xml, target) = xml.consume_name();
    let (xml, ws_after_target) = xml.consume_space();
    let (xml, data) = try_parse!(
        xml.consume_to(xml.s.end_of_pi_value())
            .map_err(|_| SyntaxError::UnterminatedProcessingInstruction { start })
    );
    let (xml, _) = xml.advance("?>".len());

    Progress::success(xml, ProcessingInstruction::new(target, ws_after_target, data))
}

fn parse_attribute_value<'a>(xml: StringPoint<'a>, name: &str) -> XmlProgress<'a, (Quote, &'a str)> {
    let quote = match xml.s.chars().next() {
        Some('"') => Quote::Double,
        Some('\'') => Quote::Single,
        _ => {
            let (xml, value) = xml.advance(xml.s.end_of_unquoted_attribute());
            return Progress::success(xml, (Quote::Unquoted, value));
        }
    };

    let (xml, _) = xml.advance(1);
    let start = xml.offset;
    let quote_char = if quote == Quote::Double { '"' } else { '\'' };
    let (xml, value) = try_parse!(
        xml.consume_to(xml.s.end_of_attribute(quote_char))
            .map_err(|_| SyntaxError::UnterminatedAttributeValue { name: name.to_owned(), start })
    );
    let (xml, _) = xml.advance(1);

    Progress::success(xml, (quote, value))
}

fn parse_attribute<'a>(xml: StringPoint<'a>, leading_ws: &str) -> XmlProgress<'a, Attribute> {
    let (xml, name) = xml.consume_name();
    if name.is_empty() {
        return Progress::failure(xml, SyntaxError::ExpectedAttributeName { position: xml.offset });
    }

    let (after_space, ws_before_equal) = xml.consume_space();
    if !after_space.s.starts_with('=') {
        // The whitespace belongs to whatever follows.
        let attribute = Attribute { leading_ws: leading_ws.to_owned(), ..Attribute::valueless(name) };
        return Progress::success(xml, attribute);
    }

    let (xml, _) = after_space.advance(1);
    let (xml, ws_after_equal) = xml.consume_space();
    let (xml, (quote, value)) = try_parse!(parse_attribute_value(xml, name));

    Progress::success(xml, Attribute {
        name: name.to_owned(),
        value: Some(value.to_owned()),
        leading_ws: leading_ws.to_owned(),
        ws_before_equal: ws_before_equal.to_owned(),
        ws_after_equal: ws_after_equal.to_owned(),
        quote,
    })
}

fn parse_closing_tag<'a>(xml: StringPoint<'a>, element: &mut Element, start: usize) -> XmlProgress<'a, ()> {
    let position = xml.offset;
    let (xml, _) = xml.advance("</".len());
    let (xml, name) = xml.consume_name();

    if name != element.tag_name {
        return Progress::failure(xml, SyntaxError::MismatchedClosingTag {
            expected: element.tag_name.clone(),
            found: name.to_owned(),
            start,
            position,
        });
    }

    let (xml, close_tag_ws) = xml.consume_space();
    let end = xml.offset;
    let (xml, _) = try_parse!(
        xml.consume_literal(">")
            .map_err(|_| SyntaxError::ExpectedClosingTagEnd { tag: name.to_owned(), position: end })
    );

    element.close_tag_ws = close_tag_ws.to_owned();
    Progress::success(xml, ())
}

fn parse_element<'a>(xml: StringPoint<'a>, depth: usize) -> XmlProgress<'a, Element> {
    let start = xml.offset;
    if depth >= MAX_DEPTH {
        return Progress::failure(xml, SyntaxError::NestingTooDeep { limit: MAX_DEPTH, position: start });
    }

    let (xml, _) = xml.advance("<".len());
    let (xml, name) = xml.consume_name();
    if name.is_empty() {
        return Progress::failure(xml, SyntaxError::ExpectedTagName { position: xml.offset });
    }

    let mut element = Element::new(name);

    let mut xml = xml;
    loop {
        let (after_space, space) = xml.consume_space();
        if after_space.s.is_empty() || after_space.s.starts_with('>') || after_space.s.starts_with("/>") {
            element.attr_trailing_ws = space.to_owned();
            xml = after_space;
            break;
        }

        let (next, attribute) = try_parse!(parse_attribute(after_space, space));
        element.attributes.push(attribute);
        xml = next;
    }

    if xml.s.starts_with("/>") {
        let (xml, _) = xml.advance("/>".len());
        element.self_closing = true;
        return Progress::success(xml, element);
    }

    let end = xml.offset;
    let (mut xml, _) = try_parse!(
        xml.consume_literal(">")
            .map_err(|_| SyntaxError::ExpectedStartTagEnd { position: end })
    );

    loop {
        if xml.s.is_empty() {
            return Progress::failure(xml, SyntaxError::UnterminatedElement { tag: element.tag_name, start });
        }

        if xml.s.starts_with("</") {
            let (xml, _) = try_parse!(parse_closing_tag(xml, &mut element, start));
            return Progress::success(xml, element);
        }

        if xml.s.starts_with("<!DOCTYPE") {
            return Progress::failure(xml, SyntaxError::UnexpectedDoctype { tag: element.tag_name, position: xml.offset });
        }

        let (next, child) = try_parse!(parse_child(xml, depth + 1));
        element.children.push(child);
        xml = next;
    }
}

// Anything but a doctype or a closing tag, both of which the caller
// must have ruled out.
fn parse_child<'a>(xml: StringPoint<'a>, depth: usize) -> XmlProgress<'a, ChildOfElement> {
    let s = xml.s;

    if s.starts_with("<!--") {
        parse_comment(xml).map(ChildOfElement::Comment)
    } else if s.starts_with("<![CDATA[") {
        parse_cdata(xml).map(ChildOfElement::CData)
    } else if s.starts_with("<?") {
        parse_pi(xml).map(ChildOfElement::ProcessingInstruction)
    } else if s.starts_with('<') {
        parse_element(xml, depth).map(ChildOfElement::Element)
    } else {
        parse_text(xml).map(ChildOfElement::Text)
    }
}

fn unexpected_closing_tag<'a, T>(xml: StringPoint<'a>) -> XmlProgress<'a, T> {
    let position = xml.offset;
    let (xml, _) = xml.advance("</".len());
    let (xml, name) = xml.consume_name();

    Progress::failure(xml, SyntaxError::UnexpectedClosingTag { found: name.to_owned(), position })
}

fn parse_document<'a>(xml: StringPoint<'a>) -> XmlProgress<'a, Document> {
    let mut doc = Document::default();
    let mut xml = xml;

    while !xml.s.is_empty() {
        if xml.s.starts_with("</") {
            return unexpected_closing_tag(xml);
        }

        let (next, child) = if xml.s.starts_with("<!DOCTYPE") {
            try_parse!(parse_doctype(xml).map(ChildOfRoot::Doctype))
        } else {
            try_parse!(parse_child(xml, 0).map(ChildOfRoot::from))
        };

        doc.children.push(child);
        xml = next;
    }

    Progress::success(xml, doc)
}

fn parse_fragment_children<'a>(xml: StringPoint<'a>) -> XmlProgress<'a, Vec<ChildOfElement>> {
    let mut children = Vec::new();
    let mut xml = xml;

    while !xml.s.is_empty() {
        if xml.s.starts_with("</") {
            return unexpected_closing_tag(xml);
        }

        if xml.s.starts_with("<!DOCTYPE") {
            return Progress::failure(xml, SyntaxError::UnexpectedDoctypeInFragment { position: xml.offset });
        }

        let (next, child) = try_parse!(parse_child(xml, 0));
        children.push(child);
        xml = next;
    }

    Progress::success(xml, children)
}

fn finish<T>(progress: XmlProgress<T>) -> Result<T, SyntaxError> {
    match progress.status {
        Status::Success(value) => Ok(value),
        Status::Failure(e) => {
            debug!(error = %e, location = e.location(), "XML parse failed");
            Err(e)
        }
    }
}

/// Parses a complete document. Any number of top-level nodes, including
/// none, is accepted.
pub fn parse(xml: &str) -> Result<Document, SyntaxError> {
    debug!(len = xml.len(), "parsing XML document");
    finish(parse_document(StringPoint::new(xml)))
}

/// Parses a run of sibling nodes, as found inside an element.
pub fn parse_fragment(xml: &str) -> Result<Vec<ChildOfElement>, SyntaxError> {
    debug!(len = xml.len(), "parsing XML fragment");
    finish(parse_fragment_children(StringPoint::new(xml)))
}
