//! A lossless XML document model.
//!
//! Parsing a string and formatting the resulting document gives back
//! exactly the same string: whitespace inside tags, quote styles, entity
//! references, comments and doctypes are all kept. The tree can be edited
//! in between, and unedited regions still come back untouched.
//!
//! ```
//! use lossless_xml::{parser, AddElementOptions, Element};
//!
//! let xml = "<planets>\n  <planet name='Mercury'/>\n</planets>";
//! let mut doc = parser::parse(xml).expect("Failed to parse");
//!
//! let planets = doc.root_element_mut().expect("No root element");
//! let mut venus = Element::self_closing("planet");
//! venus.set_attribute_value("name", "Venus");
//! planets.add_element(venus, AddElementOptions::after(1));
//!
//! assert_eq!(
//!     doc.to_string(),
//!     "<planets>\n  <planet name='Mercury'/>\n  <planet name=\"Venus\"/>\n</planets>"
//! );
//! ```
//!
//! ### Design decisions
//!
//! The tree is plain owned data. Children live in a `Vec` on their parent
//! and there are no back-references, so nodes are addressed by index and
//! can be cloned or moved freely.
//!
//! Text and attribute values are stored in their escaped, on-the-wire
//! form. Accessors such as [`Element::attribute_value`] unescape on the way
//! out and setters escape on the way in.

#[macro_use]
extern crate peresil;

pub mod escape;
mod str;
pub mod dom;
pub mod parser;
pub mod writer;

pub use dom::{
    AddElementOptions, Attribute, CData, ChildOfElement, ChildOfRoot, Comment, Doctype, Document,
    Element, Insertion, NoRootElement, ProcessingInstruction, Quote, Text,
};
pub use parser::{parse, parse_fragment, SyntaxError};
