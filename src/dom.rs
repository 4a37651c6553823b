//! An owned document tree that remembers how it was written.
//!
//! Every node keeps the whitespace and quoting that surrounded it in
//! the source, so a tree that has not been modified writes out exactly
//! the text it was parsed from. The mutating methods on [`Element`]
//! infer formatting for anything they add.

use std::borrow::Cow;
use std::mem;

use tracing::trace;

use super::escape::{escape, unescape};
use super::str::XmlChar;

/// The character that delimits an attribute value
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Quote {
    #[default]
    Double,
    Single,
    /// `name=value`, as tolerated by some templating dialects
    Unquoted,
}

impl Quote {
    pub fn as_str(self) -> &'static str {
        match self {
            Quote::Double => "\"",
            Quote::Single => "'",
            Quote::Unquoted => "",
        }
    }

    // An unquoted value has to stay a single token that cannot run into
    // the `/>` of a self-closing tag.
    fn fit(self, escaped_value: &str) -> Quote {
        let fits = !escaped_value.is_empty() &&
            !escaped_value.contains(|c: char| c.is_space_char() || c == '/');

        match self {
            Quote::Unquoted if !fits => Quote::Double,
            q => q,
        }
    }
}

/// Metadata about an element, along with the spacing around it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// The escaped value, or `None` for a bare `name` with no `=`.
    pub value: Option<String>,
    /// Whitespace before the name, separating it from what precedes it.
    pub leading_ws: String,
    pub ws_before_equal: String,
    pub ws_after_equal: String,
    pub quote: Quote,
}

impl Attribute {
    /// Creates a double-quoted attribute from an already-escaped value.
    pub fn new<N, V>(name: N, escaped_value: V) -> Attribute
        where N: Into<String>,
              V: Into<String>,
    {
        Attribute {
            name: name.into(),
            value: Some(escaped_value.into()),
            leading_ws: " ".to_owned(),
            ws_before_equal: String::new(),
            ws_after_equal: String::new(),
            quote: Quote::Double,
        }
    }

    pub fn valueless<N>(name: N) -> Attribute
        where N: Into<String>
    {
        Attribute {
            value: None,
            ..Attribute::new(name, "")
        }
    }

    pub fn is_valueless(&self) -> bool {
        self.value.is_none()
    }

    /// The value with entities decoded. A valueless attribute reads as
    /// the empty string.
    pub fn unescaped_value(&self) -> Cow<'_, str> {
        match self.value {
            Some(ref v) => unescape(v),
            None => Cow::Borrowed(""),
        }
    }

    /// Escapes and stores a new value, keeping the existing formatting.
    pub fn set_value(&mut self, unescaped_value: &str) {
        let value = escape(unescaped_value).into_owned();
        self.quote = self.quote.fit(&value);
        self.value = Some(value);
    }

    fn styled_like(&self, name: &str, unescaped_value: &str) -> Attribute {
        let mut attr = Attribute {
            name: name.to_owned(),
            value: None,
            leading_ws: self.leading_ws.clone(),
            ws_before_equal: self.ws_before_equal.clone(),
            ws_after_equal: self.ws_after_equal.clone(),
            quote: self.quote,
        };
        attr.set_value(unescaped_value);
        attr
    }
}

/// Character data, stored escaped
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Text {
    pub text: String,
}

impl Text {
    pub fn new<S>(escaped_text: S) -> Text
        where S: Into<String>
    {
        Text { text: escaped_text.into() }
    }

    pub fn from_unescaped(unescaped_text: &str) -> Text {
        Text::new(escape(unescaped_text))
    }

    pub fn unescaped_text(&self) -> Cow<'_, str> {
        unescape(&self.text)
    }

    pub fn set_text(&mut self, unescaped_text: &str) {
        self.text = escape(unescaped_text).into_owned();
    }

    /// True when the decoded text contains nothing but XML whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.unescaped_text().chars().all(|c| c.is_space_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Comment {
    pub content: String,
}

impl Comment {
    pub fn new<S>(content: S) -> Comment
        where S: Into<String>
    {
        Comment { content: content.into() }
    }
}

/// `<?target data?>`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessingInstruction {
    pub target: String,
    pub ws_after_target: String,
    pub data: String,
}

impl ProcessingInstruction {
    pub fn new<T, W, D>(target: T, ws_after_target: W, data: D) -> ProcessingInstruction
        where T: Into<String>,
              W: Into<String>,
              D: Into<String>,
    {
        ProcessingInstruction {
            target: target.into(),
            ws_after_target: ws_after_target.into(),
            data: data.into(),
        }
    }
}

/// Unescaped character data
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CData {
    pub content: String,
}

impl CData {
    pub fn new<S>(content: S) -> CData
        where S: Into<String>
    {
        CData { content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    /// Everything between `<!DOCTYPE` and `>`, trimmed.
    pub content: String,
    pub leading_ws: String,
    pub trailing_ws: String,
}

impl Doctype {
    pub fn new<S>(content: S) -> Doctype
        where S: Into<String>
    {
        Doctype {
            content: content.into(),
            leading_ws: " ".to_owned(),
            trailing_ws: String::new(),
        }
    }
}

/// Where [`Element::add_element`] puts the new child, by index into
/// the current children
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Insertion {
    #[default]
    End,
    After(usize),
    Before(usize),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddElementOptions {
    pub position: Insertion,
    /// Copy the indentation of the nearest sibling element.
    pub guess_formatting: bool,
}

impl Default for AddElementOptions {
    fn default() -> AddElementOptions {
        AddElementOptions {
            position: Insertion::End,
            guess_formatting: true,
        }
    }
}

impl AddElementOptions {
    pub fn after(index: usize) -> AddElementOptions {
        AddElementOptions { position: Insertion::After(index), ..Default::default() }
    }

    pub fn before(index: usize) -> AddElementOptions {
        AddElementOptions { position: Insertion::Before(index), ..Default::default() }
    }

    pub fn without_formatting(self) -> AddElementOptions {
        AddElementOptions { guess_formatting: false, ..self }
    }
}

/// Elements are the workhorse of a document and may contain any type of
/// node, except for a doctype
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag_name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<ChildOfElement>,
    /// Whitespace between the last attribute (or the tag name) and `>` or `/>`.
    pub attr_trailing_ws: String,
    pub self_closing: bool,
    /// Whitespace inside the closing tag, before its `>`.
    pub close_tag_ws: String,
}

impl Element {
    pub fn new<S>(tag_name: S) -> Element
        where S: Into<String>
    {
        Element {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    /// An empty `<tag_name/>`.
    pub fn self_closing<S>(tag_name: S) -> Element
        where S: Into<String>
    {
        Element {
            self_closing: true,
            ..Element::new(tag_name)
        }
    }

    /// The first attribute with this name; duplicates are never merged.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.attribute(name).map(Attribute::unescaped_value)
    }

    /// Overwrites the value of an existing attribute, or appends a new
    /// one styled like the current last attribute.
    pub fn set_attribute_value(&mut self, name: &str, unescaped_value: &str) {
        if let Some(attr) = self.attributes.iter_mut().find(|a| a.name == name) {
            attr.set_value(unescaped_value);
            return;
        }

        let attr = match self.attributes.last() {
            Some(last) => last.styled_like(name, unescaped_value),
            None => {
                let mut attr = Attribute::new(name, "");
                attr.set_value(unescaped_value);
                attr
            }
        };

        trace!(element = %self.tag_name, attribute = name, "appending attribute");
        self.attributes.push(attr);
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let idx = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(idx))
    }

    /// Inserts `nodes` at `index` (clamped to the number of children).
    ///
    /// The element stops being self-closing, and adjacent text is merged
    /// afterwards.
    pub fn add_child<I>(&mut self, index: usize, nodes: I)
        where I: IntoIterator,
              I::Item: Into<ChildOfElement>,
    {
        let index = index.min(self.children.len());
        self.self_closing = false;
        let tail = self.children.split_off(index);
        self.children.extend(nodes.into_iter().map(Into::into));
        self.children.extend(tail);
        self.coalesce_text();
    }

    pub fn append_child<C>(&mut self, child: C)
        where C: Into<ChildOfElement>
    {
        let len = self.children.len();
        self.add_child(len, Some(child));
    }

    /// Inserts an element, by default indenting it like its nearest
    /// element sibling.
    pub fn add_element(&mut self, child: Element, options: AddElementOptions) {
        let len = self.children.len();
        let index = match options.position {
            Insertion::End => len,
            Insertion::After(i) => (i + 1).min(len),
            Insertion::Before(i) => {
                let i = i.min(len);
                // Land in front of the reference node's indentation.
                if i > 0 && self.children[i - 1].text().is_some() { i - 1 } else { i }
            }
        };

        let indent = if options.guess_formatting {
            self.indentation_near(index)
        } else {
            None
        };

        trace!(
            element = %self.tag_name,
            child = %child.tag_name,
            index,
            indented = indent.is_some(),
            "adding element"
        );

        let mut nodes = Vec::with_capacity(2);
        nodes.extend(indent.map(ChildOfElement::Text));
        nodes.push(ChildOfElement::Element(child));
        self.add_child(index, nodes);
    }

    // The whitespace in front of the closest element, looking backwards
    // from `index` first.
    fn indentation_near(&self, index: usize) -> Option<Text> {
        let is_element = |i: &usize| self.children[*i].element().is_some();

        let sibling = (0..index).rev().find(is_element)
            .or_else(|| (index..self.children.len()).find(is_element))?;

        let preceding = sibling.checked_sub(1)?;
        self.children[preceding]
            .text()
            .filter(|t| t.is_whitespace())
            .cloned()
    }

    pub fn remove_child(&mut self, index: usize) -> Option<ChildOfElement> {
        if index >= self.children.len() {
            return None;
        }
        let child = self.children.remove(index);
        self.coalesce_text();
        Some(child)
    }

    /// Drops empty text nodes and merges runs of adjacent ones.
    pub fn coalesce_text(&mut self) {
        merge_text_runs(&mut self.children);
    }

    pub fn first_element_by_name(&self, tag_name: &str) -> Option<&Element> {
        self.children.iter()
            .filter_map(ChildOfElement::element)
            .find(|e| e.tag_name == tag_name)
    }

    pub fn first_element_by_name_mut(&mut self, tag_name: &str) -> Option<&mut Element> {
        self.children.iter_mut()
            .filter_map(ChildOfElement::element_mut)
            .find(|e| e.tag_name == tag_name)
    }

    /// Immediate children with this tag name; descendants are not searched.
    pub fn elements_by_name(&self, tag_name: &str) -> Vec<&Element> {
        self.children.iter()
            .filter_map(ChildOfElement::element)
            .filter(|e| e.tag_name == tag_name)
            .collect()
    }

    pub fn elements_by_name_mut(&mut self, tag_name: &str) -> Vec<&mut Element> {
        self.children.iter_mut()
            .filter_map(ChildOfElement::element_mut)
            .filter(|e| e.tag_name == tag_name)
            .collect()
    }

    /// The decoded text and CDATA directly inside this element.
    pub fn text_content(&self) -> String {
        let mut content = String::new();
        for child in &self.children {
            match *child {
                ChildOfElement::Text(ref t) => content.push_str(&t.unescaped_text()),
                ChildOfElement::CData(ref c) => content.push_str(&c.content),
                _ => {}
            }
        }
        content
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No root element found")]
pub struct NoRootElement;

/// The top-level sequence of nodes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub children: Vec<ChildOfRoot>,
}

impl Document {
    pub fn new(children: Vec<ChildOfRoot>) -> Document {
        Document { children }
    }

    /// Appends a top-level node, merging it into trailing text.
    pub fn add_child<C>(&mut self, child: C)
        where C: Into<ChildOfRoot>
    {
        self.children.push(child.into());
        self.coalesce_text();
    }

    /// Drops empty text nodes and merges runs of adjacent ones.
    pub fn coalesce_text(&mut self) {
        merge_text_runs(&mut self.children);
    }

    /// The first top-level element.
    pub fn root_element(&self) -> Result<&Element, NoRootElement> {
        self.children.iter()
            .find_map(ChildOfRoot::element)
            .ok_or(NoRootElement)
    }

    pub fn root_element_mut(&mut self) -> Result<&mut Element, NoRootElement> {
        self.children.iter_mut()
            .find_map(ChildOfRoot::element_mut)
            .ok_or(NoRootElement)
    }
}

macro_rules! unpack(
    ($enum_name:ident, $name:ident, $name_mut:ident, $wrapper:ident) => (
        pub fn $name(&self) -> Option<&$wrapper> {
            match *self {
                $enum_name::$wrapper(ref n) => Some(n),
                _ => None,
            }
        }

        pub fn $name_mut(&mut self) -> Option<&mut $wrapper> {
            match *self {
                $enum_name::$wrapper(ref mut n) => Some(n),
                _ => None,
            }
        }
    )
);

/// Nodes that may occur at the top level of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildOfRoot {
    Element(Element),
    Text(Text),
    Comment(Comment),
    ProcessingInstruction(ProcessingInstruction),
    CData(CData),
    Doctype(Doctype),
}

impl ChildOfRoot {
    unpack!(ChildOfRoot, element, element_mut, Element);
    unpack!(ChildOfRoot, text, text_mut, Text);
    unpack!(ChildOfRoot, comment, comment_mut, Comment);
    unpack!(ChildOfRoot, processing_instruction, processing_instruction_mut, ProcessingInstruction);
    unpack!(ChildOfRoot, cdata, cdata_mut, CData);
    unpack!(ChildOfRoot, doctype, doctype_mut, Doctype);
}

/// Nodes that may occur as a child of an element node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildOfElement {
    Element(Element),
    Text(Text),
    Comment(Comment),
    ProcessingInstruction(ProcessingInstruction),
    CData(CData),
}

impl ChildOfElement {
    unpack!(ChildOfElement, element, element_mut, Element);
    unpack!(ChildOfElement, text, text_mut, Text);
    unpack!(ChildOfElement, comment, comment_mut, Comment);
    unpack!(ChildOfElement, processing_instruction, processing_instruction_mut, ProcessingInstruction);
    unpack!(ChildOfElement, cdata, cdata_mut, CData);
}

trait TextChild {
    fn as_text(&self) -> Option<&Text>;
    fn as_text_mut(&mut self) -> Option<&mut Text>;
}

impl TextChild for ChildOfRoot {
    fn as_text(&self) -> Option<&Text> { self.text() }
    fn as_text_mut(&mut self) -> Option<&mut Text> { self.text_mut() }
}

impl TextChild for ChildOfElement {
    fn as_text(&self) -> Option<&Text> { self.text() }
    fn as_text_mut(&mut self) -> Option<&mut Text> { self.text_mut() }
}

fn merge_text_runs<C>(children: &mut Vec<C>)
    where C: TextChild
{
    for child in mem::take(children) {
        if let Some(text) = child.as_text() {
            if text.text.is_empty() {
                continue;
            }
            if let Some(previous) = children.last_mut().and_then(C::as_text_mut) {
                previous.text.push_str(&text.text);
                continue;
            }
        }
        children.push(child);
    }
}

macro_rules! conversion_trait(
    ($res_type:ident, {
        $($leaf_type:ident => $variant:expr),*
    }) => (
        $(impl From<$leaf_type> for $res_type {
            fn from(v: $leaf_type) -> $res_type {
                $variant(v)
            }
        })*
    )
);

conversion_trait!(
    ChildOfRoot, {
        Element               => ChildOfRoot::Element,
        Text                  => ChildOfRoot::Text,
        Comment               => ChildOfRoot::Comment,
        ProcessingInstruction => ChildOfRoot::ProcessingInstruction,
        CData                 => ChildOfRoot::CData,
        Doctype               => ChildOfRoot::Doctype
    }
);

conversion_trait!(
    ChildOfElement, {
        Element               => ChildOfElement::Element,
        Text                  => ChildOfElement::Text,
        Comment               => ChildOfElement::Comment,
        ProcessingInstruction => ChildOfElement::ProcessingInstruction,
        CData                 => ChildOfElement::CData
    }
);

impl From<ChildOfElement> for ChildOfRoot {
    fn from(v: ChildOfElement) -> ChildOfRoot {
        match v {
            ChildOfElement::Element(n) => ChildOfRoot::Element(n),
            ChildOfElement::Text(n) => ChildOfRoot::Text(n),
            ChildOfElement::Comment(n) => ChildOfRoot::Comment(n),
            ChildOfElement::ProcessingInstruction(n) => ChildOfRoot::ProcessingInstruction(n),
            ChildOfElement::CData(n) => ChildOfRoot::CData(n),
        }
    }
}
