//! Core domain types, capability traits, and edit algorithms for putting a
//! customer name into a presentation.
//!
//! Nothing in this crate knows about a concrete file format. Backends
//! implement [`PresentationDocument`] and [`SlideCanvas`]; [`NameEditor`]
//! runs the insert and substitute decisions against them.

pub mod document;
pub mod editor;
pub mod error;
pub mod types;

pub use document::{PresentationDocument, ShapeHandle, SlideCanvas};
pub use editor::{NameEditor, DEFAULT_PLACEHOLDER};
pub use error::{Error, Result};
pub use types::{
    EditOutcome, EditReport, Emu, PresentationFormat, Rect, Rgb, SlideSize, TextBoxLayout,
    TextStyle,
};
