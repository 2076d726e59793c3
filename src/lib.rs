//! Render evaluated pattern trees as XML documents.
//!
//! A [`PatternDocument`] holds the forest produced by a binary-template
//! evaluation pass. [`render`] turns it into either an attribute-rich
//! document (when meta information is enabled) or a flat document of
//! variable-named elements.

pub mod error;
pub mod pattern;
pub mod renderer;

pub use error::RenderError;
pub use pattern::{
    load_document, load_document_from_path, DataRegion, Endian, Literal, Pattern,
    PatternDocument, PatternKind, Visibility,
};
pub use renderer::{
    render, render_to_string, Encoding, Render, RenderContext, RenderOptions, XmlRenderer,
    FILE_EXTENSION,
};
