//! The narrow view of a presentation that the name edits need.

use crate::error::Result;
use crate::types::{Rect, SlideSize, TextStyle};
use serde::{Deserialize, Serialize};

/// Index of a shape within its slide, in z-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeHandle(pub usize);

/// One slide's shapes, addressed by [`ShapeHandle`].
pub trait SlideCanvas {
    /// Number of top-level shapes on the slide.
    fn shape_count(&self) -> usize;

    /// Whether the shape carries a text frame.
    fn has_text(&self, shape: ShapeHandle) -> bool;

    /// Full text of the shape's frame, `None` when it has no frame.
    ///
    /// Paragraphs are joined with `\n`; soft line breaks appear as `\u{b}`.
    fn text(&self, shape: ShapeHandle) -> Option<String>;

    /// Replace the shape's text, one paragraph per `\n`.
    fn set_text(&mut self, shape: ShapeHandle, text: &str) -> Result<()>;

    /// Add an empty text box and return its handle.
    fn add_text_box(&mut self, rect: Rect) -> Result<ShapeHandle>;

    /// Apply `style` to every run of the shape's text.
    fn apply_style(&mut self, shape: ShapeHandle, style: &TextStyle) -> Result<()>;

    fn handles(&self) -> Vec<ShapeHandle> {
        (0..self.shape_count()).map(ShapeHandle).collect()
    }

    /// Trimmed text of every text-bearing shape, in z-order.
    fn trimmed_texts(&self) -> Vec<String> {
        self.handles()
            .into_iter()
            .filter(|&h| self.has_text(h))
            .filter_map(|h| self.text(h))
            .map(|t| t.trim().to_string())
            .collect()
    }
}

/// A loaded presentation.
pub trait PresentationDocument {
    type Slide: SlideCanvas;

    fn slide_size(&self) -> SlideSize;

    fn slide_count(&self) -> usize;

    /// Zero-based slide access.
    fn slide(&self, index: usize) -> Result<&Self::Slide>;

    fn slide_mut(&mut self, index: usize) -> Result<&mut Self::Slide>;
}
