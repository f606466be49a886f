//! Domain types for placing and styling a name on a slide.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use std::path::PathBuf;

/// A length in English Metric Units, the unit OOXML stores geometry in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Emu(pub i64);

impl Emu {
    pub const PER_INCH: i64 = 914_400;

    /// Convert inches to EMU, truncating toward zero like `int()` would.
    pub fn from_inches(inches: f64) -> Self {
        Self((inches * Self::PER_INCH as f64) as i64)
    }
}

impl Add for Emu {
    type Output = Emu;

    fn add(self, rhs: Emu) -> Emu {
        Emu(self.0 + rhs.0)
    }
}

impl Sub for Emu {
    type Output = Emu;

    fn sub(self, rhs: Emu) -> Emu {
        Emu(self.0 - rhs.0)
    }
}

/// Position and size of a shape on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: Emu,
    pub top: Emu,
    pub width: Emu,
    pub height: Emu,
}

impl Rect {
    pub fn new(left: Emu, top: Emu, width: Emu, height: Emu) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Dimensions shared by every slide of a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: Emu,
    pub height: Emu,
}

impl Default for SlideSize {
    /// 10in x 7.5in, the 4:3 size PowerPoint assumes when none is declared.
    fn default() -> Self {
        Self {
            width: Emu(9_144_000),
            height: Emu(6_858_000),
        }
    }
}

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Upper-case hex form used by `a:srgbClr`, e.g. `FFFFFF`.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Font attributes applied to every run of an inserted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font size in hundredths of a point (`sz` in DrawingML).
    pub size_centipoints: u32,
    pub color: Rgb,
}

impl TextStyle {
    pub fn new(points: u32, color: Rgb) -> Self {
        Self {
            size_centipoints: points * 100,
            color,
        }
    }
}

impl Default for TextStyle {
    /// 24pt white.
    fn default() -> Self {
        Self::new(24, Rgb::WHITE)
    }
}

/// Fixed placement of the name text box, measured from the slide's
/// left and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBoxLayout {
    pub left: Emu,
    pub width: Emu,
    pub height: Emu,
    /// Gap between the bottom of the box and the bottom of the slide.
    pub bottom_offset: Emu,
}

impl Default for TextBoxLayout {
    fn default() -> Self {
        Self {
            left: Emu::from_inches(1.5),
            width: Emu::from_inches(4.0),
            height: Emu::from_inches(0.5),
            bottom_offset: Emu::from_inches(4.0),
        }
    }
}

impl TextBoxLayout {
    /// Resolve the box against a concrete slide size.
    ///
    /// The top edge is `slide height - box height - bottom offset`; on a
    /// slide shorter than that it goes negative, which PowerPoint accepts.
    pub fn rect_for(&self, slide: SlideSize) -> Rect {
        Rect::new(
            self.left,
            slide.height - self.height - self.bottom_offset,
            self.width,
            self.height,
        )
    }
}

/// What an edit did to the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    /// A new text box holding the name was added to the first slide.
    Inserted { rect: Rect },
    /// The first slide already had a shape whose text is exactly the name.
    AlreadyPresent,
    /// Placeholder occurrences were replaced with the name.
    Substituted { shapes: usize, occurrences: usize },
}

impl EditOutcome {
    /// Whether the document differs from what was loaded.
    pub fn is_modified(&self) -> bool {
        match self {
            EditOutcome::Inserted { .. } => true,
            EditOutcome::AlreadyPresent => false,
            EditOutcome::Substituted { shapes, .. } => *shapes > 0,
        }
    }
}

/// Summary of one file-level operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub name: String,
    #[serde(flatten)]
    pub outcome: EditOutcome,
}

/// The format of a presentation file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary).
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]) {
            return Some(Self::Ppt);
        }

        None
    }
}
