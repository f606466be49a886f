//! PPTX (Office Open XML) backend for putting a customer name into a
//! presentation.
//!
//! A .pptx file is a ZIP package of XML parts. Slides are parsed into a
//! small XML tree, edited through the `pptx_name_core` capability traits,
//! and only the edited parts are written back.

pub mod inserter;
pub mod output;
pub mod package;
pub mod presentation;
pub mod slide;
pub mod text;
pub mod xml;

pub use inserter::{updated_path, NameInserter, SaveTarget};
pub use presentation::PptxDocument;
pub use slide::PptxSlide;
