//! Error types for presentation editing.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, editing, or saving a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// The presentation to edit does not exist.
    #[error("File not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The template to copy from does not exist.
    #[error("Template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// Failed to read or write a file.
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// A part the package must contain is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The presentation has no slides to put a name on.
    #[error("Presentation contains no slides")]
    NoSlides,

    /// A shape handle did not point at a usable shape.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// A caller-supplied value cannot be used.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The finished output could not be moved into place.
    #[error("Failed to save {}: {}", .path.display(), .reason)]
    PersistError { path: PathBuf, reason: String },
}
