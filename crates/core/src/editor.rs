//! Insert and substitute decisions, independent of the file format.

use crate::document::{PresentationDocument, SlideCanvas};
use crate::error::{Error, Result};
use crate::types::{EditOutcome, TextBoxLayout, TextStyle};

/// Token replaced by [`NameEditor::substitute_placeholder`] unless configured otherwise.
pub const DEFAULT_PLACEHOLDER: &str = "{{NAME}}";

/// Applies a name to an in-memory presentation.
#[derive(Debug, Clone)]
pub struct NameEditor {
    style: TextStyle,
    layout: TextBoxLayout,
    placeholder: String,
}

impl Default for NameEditor {
    fn default() -> Self {
        Self {
            style: TextStyle::default(),
            layout: TextBoxLayout::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl NameEditor {
    /// Create an editor with 24pt white text, the standard placement, and `{{NAME}}`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_layout(mut self, layout: TextBoxLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Whether some text-bearing shape on the slide reads exactly `name`
    /// once its own surrounding whitespace is trimmed.
    ///
    /// `name` itself is not trimmed, and containment does not count.
    pub fn name_present<S: SlideCanvas>(slide: &S, name: &str) -> bool {
        slide.trimmed_texts().iter().any(|text| text == name)
    }

    /// Add `name` in a styled text box on the first slide unless it is already there.
    pub fn insert_if_absent<D: PresentationDocument>(
        &self,
        doc: &mut D,
        name: &str,
    ) -> Result<EditOutcome> {
        if doc.slide_count() == 0 {
            return Err(Error::NoSlides);
        }
        let rect = self.layout.rect_for(doc.slide_size());
        let slide = doc.slide_mut(0)?;

        if Self::name_present(slide, name) {
            log::debug!("Name {:?} already on first slide", name);
            return Ok(EditOutcome::AlreadyPresent);
        }

        let shape = slide.add_text_box(rect)?;
        slide.set_text(shape, name)?;
        slide.apply_style(shape, &self.style)?;
        log::debug!(
            "Added text box {:?} at left={} top={}",
            shape,
            rect.left.0,
            rect.top.0
        );

        Ok(EditOutcome::Inserted { rect })
    }

    /// Replace every occurrence of the placeholder with `name` on every slide.
    pub fn substitute_placeholder<D: PresentationDocument>(
        &self,
        doc: &mut D,
        name: &str,
    ) -> Result<EditOutcome> {
        if self.placeholder.is_empty() {
            return Err(Error::InvalidArgument(
                "placeholder token must not be empty".to_string(),
            ));
        }

        let mut shapes = 0;
        let mut occurrences = 0;

        for index in 0..doc.slide_count() {
            let slide = doc.slide_mut(index)?;
            for handle in slide.handles() {
                if !slide.has_text(handle) {
                    continue;
                }
                let Some(text) = slide.text(handle) else {
                    continue;
                };
                let count = text.matches(self.placeholder.as_str()).count();
                if count == 0 {
                    continue;
                }
                slide.set_text(handle, &text.replace(self.placeholder.as_str(), name))?;
                shapes += 1;
                occurrences += count;
            }
            log::debug!("Slide {}: {} shape(s) substituted so far", index + 1, shapes);
        }

        Ok(EditOutcome::Substituted {
            shapes,
            occurrences,
        })
    }
}
