//! A whole .pptx presentation as a [`PresentationDocument`].

use crate::output::write_atomic;
use crate::package::{resolve_target, PptxPackage};
use crate::slide::PptxSlide;
use crate::xml::{local_name, XmlDocument, XmlElement};
use pptx_name_core::{Emu, Error, PresentationDocument, Result, SlideSize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// A presentation loaded for editing.
pub struct PptxDocument {
    /// File the document was opened from, if any.
    path: Option<PathBuf>,
    package: PptxPackage,
    slide_size: SlideSize,
    slides: Vec<PptxSlide>,
}

impl PptxDocument {
    /// Load a presentation file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::SourceNotFound(path.to_path_buf()));
        }
        log::debug!("Loading {}", path.display());
        let mut doc = Self::from_bytes(std::fs::read(path)?)?;
        doc.path = Some(path.to_path_buf());
        Ok(doc)
    }

    /// Load a presentation from its file bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let package = PptxPackage::from_bytes(bytes)?;

        let presentation_part = presentation_part(&package)?;
        let presentation = XmlDocument::parse(&package.read_part(&presentation_part)?)?;
        let relationships = Relationships::for_part(&package, &presentation_part)?;

        let slide_size = read_slide_size(presentation.root());
        let slide_parts = slide_order(presentation.root(), &relationships);

        let mut slides = Vec::with_capacity(slide_parts.len());
        for part in slide_parts {
            let content = package.read_part(&part)?;
            slides.push(PptxSlide::parse(part, &content)?);
        }

        log::debug!(
            "Presentation has {} slides of {}x{} EMU",
            slides.len(),
            slide_size.width.0,
            slide_size.height.0
        );

        Ok(Self {
            path: None,
            package,
            slide_size,
            slides,
        })
    }

    /// Whether any slide was edited.
    pub fn is_modified(&self) -> bool {
        self.slides.iter().any(PptxSlide::is_modified)
    }

    /// The package bytes with every edited slide re-serialized.
    ///
    /// An unedited document yields exactly the bytes it was loaded from.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if !self.is_modified() {
            return Ok(self.package.source_bytes().to_vec());
        }

        let mut replacements = BTreeMap::new();
        for slide in self.slides.iter().filter(|s| s.is_modified()) {
            replacements.insert(slide.part_name().to_string(), slide.to_bytes()?);
        }
        self.package.write_with(&replacements)
    }

    /// Write the document to `path` through a temporary file and rename.
    ///
    /// A new file takes the permissions of the file the document was
    /// opened from; an existing one keeps its own.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.to_bytes()?, self.path.as_deref())
    }
}

impl PresentationDocument for PptxDocument {
    type Slide = PptxSlide;

    fn slide_size(&self) -> SlideSize {
        self.slide_size
    }

    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn slide(&self, index: usize) -> Result<&PptxSlide> {
        self.slides
            .get(index)
            .ok_or_else(|| Error::MissingPart(format!("slide {}", index + 1)))
    }

    fn slide_mut(&mut self, index: usize) -> Result<&mut PptxSlide> {
        self.slides
            .get_mut(index)
            .ok_or_else(|| Error::MissingPart(format!("slide {}", index + 1)))
    }
}

/// The main presentation part, found through the package relationships.
fn presentation_part(package: &PptxPackage) -> Result<String> {
    if package.contains("_rels/.rels") {
        let rels = Relationships::parse(&package.read_part("_rels/.rels")?, "")?;
        let target = rels
            .of_type("/officeDocument")
            .next()
            .map(|rel| rel.target.clone());
        if let Some(target) = target {
            return Ok(target);
        }
    }
    if package.contains(DEFAULT_PRESENTATION_PART) {
        return Ok(DEFAULT_PRESENTATION_PART.to_string());
    }
    Err(Error::UnsupportedFormat(
        "package has no presentation part".to_string(),
    ))
}

fn read_slide_size(presentation: &XmlElement) -> SlideSize {
    let size = presentation.find("sldSz").and_then(|sz| {
        let cx = sz.get_attr("cx")?.parse::<i64>().ok()?;
        let cy = sz.get_attr("cy")?.parse::<i64>().ok()?;
        Some(SlideSize {
            width: Emu(cx),
            height: Emu(cy),
        })
    });

    size.unwrap_or_else(|| {
        log::warn!("No usable p:sldSz, assuming 10in x 7.5in slides");
        SlideSize::default()
    })
}

/// Slide part names in presentation order.
///
/// `p:sldIdLst` decides the order; without it, slide relationships are
/// ordered by the number in their target name.
fn slide_order(presentation: &XmlElement, rels: &Relationships) -> Vec<String> {
    if let Some(list) = presentation.find("sldIdLst") {
        return list
            .elements()
            .filter(|e| e.is("sldId"))
            .filter_map(|e| {
                let id = relationship_id(e)?;
                match rels.by_id.get(id) {
                    Some(rel) => Some(rel.target.clone()),
                    None => {
                        log::warn!("Slide id references unknown relationship {}", id);
                        None
                    }
                }
            })
            .collect();
    }

    let mut slides: Vec<&Relationship> = rels.of_type("/slide").collect();
    slides.sort_by(|a, b| match (
        extract_slide_number(&a.target),
        extract_slide_number(&b.target),
    ) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.target.cmp(&b.target),
    });
    slides.into_iter().map(|rel| rel.target.clone()).collect()
}

/// The namespaced `r:id` attribute, as opposed to the plain numeric `id`.
fn relationship_id(element: &XmlElement) -> Option<&str> {
    element
        .attrs
        .iter()
        .find(|(key, _)| key.contains(':') && local_name(key) == "id")
        .map(|(_, value)| value.as_str())
}

/// Extract a slide number from a string like "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[derive(Debug, Clone)]
struct Relationship {
    rel_type: String,
    /// Part name, already resolved against the source part's directory.
    target: String,
}

/// Internal relationships of one part, by id.
#[derive(Debug, Default)]
struct Relationships {
    by_id: HashMap<String, Relationship>,
    in_order: Vec<String>,
}

impl Relationships {
    /// Relationships of `part`, empty when it has no `.rels` part.
    fn for_part(package: &PptxPackage, part: &str) -> Result<Self> {
        let (dir, file) = part.rsplit_once('/').unwrap_or(("", part));
        let rels_part = if dir.is_empty() {
            format!("_rels/{}.rels", file)
        } else {
            format!("{}/_rels/{}.rels", dir, file)
        };

        if !package.contains(&rels_part) {
            log::warn!("{} has no relationships part", part);
            return Ok(Self::default());
        }
        Self::parse(&package.read_part(&rels_part)?, dir)
    }

    fn parse(bytes: &[u8], base_dir: &str) -> Result<Self> {
        let xml = XmlDocument::parse(bytes)?;
        let mut rels = Self::default();

        for e in xml.root().elements().filter(|e| e.is("Relationship")) {
            if e.get_attr("TargetMode") == Some("External") {
                continue;
            }
            let (Some(id), Some(rel_type), Some(target)) =
                (e.get_attr("Id"), e.get_attr("Type"), e.get_attr("Target"))
            else {
                log::warn!("Skipping incomplete relationship in {}", base_dir);
                continue;
            };

            rels.in_order.push(id.to_string());
            rels.by_id.insert(
                id.to_string(),
                Relationship {
                    rel_type: rel_type.to_string(),
                    target: resolve_target(base_dir, target),
                },
            );
        }

        Ok(rels)
    }

    /// Relationships whose type URI ends with `suffix`, in document order.
    fn of_type<'a>(&'a self, suffix: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.in_order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .filter(move |rel| rel.rel_type.ends_with(suffix))
    }
}
