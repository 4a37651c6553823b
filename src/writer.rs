//! Formats a document tree back into text.
//!
//! Every node writes the text and whitespace it holds, verbatim. Nothing
//! is re-escaped or re-indented, so a freshly parsed document writes out
//! the exact string it came from.
//!
//! ```
//! let xml = "<hello  planet = 'Earth' ><world /></hello >";
//! let doc = lossless_xml::parser::parse(xml).expect("valid XML");
//! assert_eq!(doc.to_string(), xml);
//! ```

use std::fmt;
use std::io::{self, Write};

use super::dom::{
    Attribute, CData, ChildOfElement, ChildOfRoot, Comment, Doctype, Document, Element,
    ProcessingInstruction, Text,
};

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.leading_ws, self.name)?;

        if let Some(ref value) = self.value {
            let quote = self.quote.as_str();
            write!(f, "{}={}{}{}{}", self.ws_before_equal, self.ws_after_equal, quote, value, quote)?;
        }

        Ok(())
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<!--{}-->", self.content)
    }
}

impl fmt::Display for ProcessingInstruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<?{}{}{}?>", self.target, self.ws_after_target, self.data)
    }
}

impl fmt::Display for CData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<![CDATA[{}]]>", self.content)
    }
}

impl fmt::Display for Doctype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<!DOCTYPE{}{}{}>", self.leading_ws, self.content, self.trailing_ws)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}", self.tag_name)?;

        for attr in &self.attributes {
            write!(f, "{}", attr)?;
        }

        f.write_str(&self.attr_trailing_ws)?;

        if self.self_closing {
            return f.write_str("/>");
        }

        f.write_str(">")?;

        for child in &self.children {
            write!(f, "{}", child)?;
        }

        write!(f, "</{}{}>", self.tag_name, self.close_tag_ws)
    }
}

impl fmt::Display for ChildOfElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ChildOfElement::Element(ref n) => fmt::Display::fmt(n, f),
            ChildOfElement::Text(ref n) => fmt::Display::fmt(n, f),
            ChildOfElement::Comment(ref n) => fmt::Display::fmt(n, f),
            ChildOfElement::ProcessingInstruction(ref n) => fmt::Display::fmt(n, f),
            ChildOfElement::CData(ref n) => fmt::Display::fmt(n, f),
        }
    }
}

impl fmt::Display for ChildOfRoot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ChildOfRoot::Element(ref n) => fmt::Display::fmt(n, f),
            ChildOfRoot::Text(ref n) => fmt::Display::fmt(n, f),
            ChildOfRoot::Comment(ref n) => fmt::Display::fmt(n, f),
            ChildOfRoot::ProcessingInstruction(ref n) => fmt::Display::fmt(n, f),
            ChildOfRoot::CData(ref n) => fmt::Display::fmt(n, f),
            ChildOfRoot::Doctype(ref n) => fmt::Display::fmt(n, f),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        Ok(())
    }
}

/// Writes the document to `writer`, byte for byte as it would format.
pub fn format_document<W>(doc: &Document, writer: &mut W) -> io::Result<()>
    where W: Write
{
    write!(writer, "{}", doc)
}

#[cfg(test)]
mod test {
    use super::format_document;
    use super::super::dom::{
        Attribute, CData, ChildOfElement, Comment, Doctype, Document, Element,
        ProcessingInstruction, Quote, Text,
    };

    fn format_xml(doc: &Document) -> String {
        let mut w = Vec::new();
        format_document(doc, &mut w).expect("Not formatted");
        String::from_utf8(w).expect("Not a string")
    }

    #[test]
    fn text_is_written_verbatim() {
        assert_eq!(Text::new("Hello, World!").to_string(), "Hello, World!");
        assert_eq!(Text::new("a &amp; b").to_string(), "a &amp; b");
    }

    #[test]
    fn comment() {
        assert_eq!(Comment::new("This is a comment").to_string(), "<!--This is a comment-->");
    }

    #[test]
    fn processing_instruction() {
        let pi = ProcessingInstruction::new("xml", " ", "version=\"1.0\"");
        assert_eq!(pi.to_string(), "<?xml version=\"1.0\"?>");
    }

    #[test]
    fn cdata_is_not_escaped() {
        assert_eq!(CData::new("<tag>Some data</tag>").to_string(), "<![CDATA[<tag>Some data</tag>]]>");
    }

    #[test]
    fn doctype() {
        assert_eq!(Doctype::new("note SYSTEM \"Note.dtd\"").to_string(), "<!DOCTYPE note SYSTEM \"Note.dtd\">");
    }

    #[test]
    fn attributes_keep_their_spacing() {
        let attr = Attribute {
            ws_before_equal: " ".to_owned(),
            ws_after_equal: "  ".to_owned(),
            quote: Quote::Single,
            ..Attribute::new("author", "John Doe")
        };
        assert_eq!(attr.to_string(), " author =  'John Doe'");
    }

    #[test]
    fn valueless_attribute() {
        assert_eq!(Attribute::valueless("checked").to_string(), " checked");
    }

    #[test]
    fn unquoted_attribute() {
        let attr = Attribute { quote: Quote::Unquoted, ..Attribute::new("width", "10") };
        assert_eq!(attr.to_string(), " width=10");
    }

    #[test]
    fn element_with_attributes_and_text() {
        let mut note = Element::new("note");
        note.attributes.push(Attribute::new("date", "2025-02-22"));
        note.attributes.push(Attribute { quote: Quote::Single, ..Attribute::new("author", "John Doe") });
        note.attr_trailing_ws = " ".to_owned();
        note.append_child(Text::new("Some content"));

        assert_eq!(note.to_string(), "<note date=\"2025-02-22\" author='John Doe' >Some content</note>");
    }

    #[test]
    fn self_closing_element() {
        let br = Element { attr_trailing_ws: " ".to_owned(), ..Element::self_closing("br") };
        assert_eq!(br.to_string(), "<br />");
    }

    #[test]
    fn self_closing_element_ignores_children() {
        let mut br = Element::self_closing("br");
        br.children.push(ChildOfElement::Text(Text::new("lost")));
        assert_eq!(br.to_string(), "<br/>");
    }

    #[test]
    fn nested_elements() {
        let mut child = Element { attr_trailing_ws: " ".to_owned(), ..Element::new("child") };
        child.append_child(Text::new("Text"));
        let mut root = Element::new("root");
        root.append_child(child);

        assert_eq!(root.to_string(), "<root><child >Text</child></root>");
    }

    #[test]
    fn closing_tag_whitespace() {
        let root = Element { close_tag_ws: "\n".to_owned(), ..Element::new("root") };
        assert_eq!(root.to_string(), "<root></root\n>");
    }

    #[test]
    fn document_writes_every_child() {
        let mut doc = Document::default();
        doc.add_child(ProcessingInstruction::new("xml", " ", "version=\"1.0\""));
        doc.add_child(Text::new("\n"));
        doc.add_child(Element::self_closing("hello"));

        assert_eq!(format_xml(&doc), "<?xml version=\"1.0\"?>\n<hello/>");
        assert_eq!(doc.to_string(), format_xml(&doc));
    }
}
