//! A slide part (`ppt/slides/slideN.xml`) as a [`SlideCanvas`].

use crate::text::{frame_text, qualified, set_frame_text, style_runs};
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use pptx_name_core::{Error, Rect, Result, ShapeHandle, SlideCanvas, TextStyle};

const DRAWINGML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// Children of `p:spTree` that are shapes in their own right.
const SHAPE_ELEMENTS: &[&str] = &[
    "sp",
    "grpSp",
    "graphicFrame",
    "cxnSp",
    "pic",
    "contentPart",
    "AlternateContent",
];

/// A parsed slide.
#[derive(Debug, Clone)]
pub struct PptxSlide {
    part_name: String,
    xml: XmlDocument,
    modified: bool,
}

impl PptxSlide {
    /// Parse slide XML. The part must contain a `p:cSld/p:spTree`.
    pub fn parse(part_name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let part_name = part_name.into();
        let xml = XmlDocument::parse(bytes)
            .map_err(|e| Error::XmlError(format!("{}: {}", part_name, e)))?;

        if xml.root().path(&["cSld", "spTree"]).is_none() {
            return Err(Error::XmlError(format!("{} has no shape tree", part_name)));
        }

        Ok(Self {
            part_name,
            xml,
            modified: false,
        })
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    /// Whether any edit touched this slide since it was parsed.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.xml.to_bytes()
    }

    fn sp_tree(&self) -> Option<&XmlElement> {
        self.xml.root().path(&["cSld", "spTree"])
    }

    fn sp_tree_mut(&mut self) -> Result<&mut XmlElement> {
        let part_name = self.part_name.clone();
        self.xml
            .root_mut()
            .path_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::XmlError(format!("{} has no shape tree", part_name)))
    }

    fn shape(&self, handle: ShapeHandle) -> Option<&XmlElement> {
        self.sp_tree()?
            .elements()
            .filter(|e| is_shape(e))
            .nth(handle.0)
    }

    /// The shape's text body. Every `p:sp` can hold text, so `None` means
    /// a non-`p:sp` shape; a `p:sp` without `p:txBody` reads as `Some(None)`.
    fn text_body(&self, handle: ShapeHandle) -> Option<Option<&XmlElement>> {
        let shape = self.shape(handle)?;
        if shape.is("sp") {
            Some(shape.find("txBody"))
        } else {
            None
        }
    }

    /// The shape's text body, created empty when a `p:sp` has none yet.
    fn text_body_mut(&mut self, handle: ShapeHandle) -> Result<&mut XmlElement> {
        let part_name = self.part_name.clone();
        let a = self.dml_prefix();
        let shape = self
            .sp_tree_mut()?
            .elements_mut()
            .filter(|e| is_shape(e))
            .nth(handle.0)
            .filter(|shape| shape.is("sp"))
            .ok_or_else(|| {
                Error::InvalidShape(format!(
                    "{} shape {} has no text frame",
                    part_name, handle.0
                ))
            })?;

        if shape.position("txBody").is_none() {
            let body = empty_text_body(shape.prefix(), &a);
            let at = shape.position("extLst").unwrap_or(shape.children.len());
            shape.children.insert(at, XmlNode::Element(body));
        }
        shape.find_mut("txBody").ok_or_else(|| {
            Error::InvalidShape(format!("{} shape {} has no text frame", part_name, handle.0))
        })
    }

    /// One more than the largest shape id on the slide.
    fn next_shape_id(&self) -> u32 {
        let mut max_id = 0;
        self.xml.root().walk(&mut |e| {
            if e.is("cNvPr") {
                if let Some(id) = e.get_attr("id").and_then(|v| v.parse::<u32>().ok()) {
                    max_id = max_id.max(id);
                }
            }
        });
        max_id + 1
    }

    /// Prefix bound to the DrawingML namespace on the slide root.
    fn dml_prefix(&self) -> String {
        self.xml
            .root()
            .attrs
            .iter()
            .find(|(_, value)| value == DRAWINGML_NS)
            .map(|(key, _)| key.strip_prefix("xmlns:").unwrap_or("").to_string())
            .unwrap_or_else(|| "a".to_string())
    }
}

impl SlideCanvas for PptxSlide {
    fn shape_count(&self) -> usize {
        self.sp_tree()
            .map(|tree| tree.elements().filter(|e| is_shape(e)).count())
            .unwrap_or(0)
    }

    fn has_text(&self, shape: ShapeHandle) -> bool {
        self.text_body(shape).is_some()
    }

    fn text(&self, shape: ShapeHandle) -> Option<String> {
        self.text_body(shape)
            .map(|body| body.map(frame_text).unwrap_or_default())
    }

    fn set_text(&mut self, shape: ShapeHandle, text: &str) -> Result<()> {
        set_frame_text(self.text_body_mut(shape)?, text);
        self.modified = true;
        Ok(())
    }

    fn add_text_box(&mut self, rect: Rect) -> Result<ShapeHandle> {
        let id = self.next_shape_id();
        let a = self.dml_prefix();
        let tree = self.sp_tree_mut()?;
        let p = tree.prefix().to_string();

        let sp = text_box_element(&p, &a, id, rect);
        // p:extLst, when present, has to stay the last child.
        let at = tree.position("extLst").unwrap_or(tree.children.len());
        tree.children.insert(at, XmlNode::Element(sp));

        self.modified = true;
        log::debug!("{}: added text box id {}", self.part_name, id);
        Ok(ShapeHandle(self.shape_count() - 1))
    }

    fn apply_style(&mut self, shape: ShapeHandle, style: &TextStyle) -> Result<()> {
        style_runs(self.text_body_mut(shape)?, style);
        self.modified = true;
        Ok(())
    }
}

fn is_shape(element: &XmlElement) -> bool {
    SHAPE_ELEMENTS.contains(&element.local_name())
}

/// A `p:sp` text box the way PowerPoint writes one: auto-fit, no wrap, no fill.
fn text_box_element(p: &str, a: &str, id: u32, rect: Rect) -> XmlElement {
    XmlElement::new(qualified(p, "sp"))
        .child(
            XmlElement::new(qualified(p, "nvSpPr"))
                .child(
                    XmlElement::new(qualified(p, "cNvPr"))
                        .attr("id", id.to_string())
                        .attr("name", format!("TextBox {}", id.saturating_sub(1))),
                )
                .child(XmlElement::new(qualified(p, "cNvSpPr")).attr("txBox", "1"))
                .child(XmlElement::new(qualified(p, "nvPr"))),
        )
        .child(
            XmlElement::new(qualified(p, "spPr"))
                .child(
                    XmlElement::new(qualified(a, "xfrm"))
                        .child(
                            XmlElement::new(qualified(a, "off"))
                                .attr("x", rect.left.0.to_string())
                                .attr("y", rect.top.0.to_string()),
                        )
                        .child(
                            XmlElement::new(qualified(a, "ext"))
                                .attr("cx", rect.width.0.to_string())
                                .attr("cy", rect.height.0.to_string()),
                        ),
                )
                .child(
                    XmlElement::new(qualified(a, "prstGeom"))
                        .attr("prst", "rect")
                        .child(XmlElement::new(qualified(a, "avLst"))),
                )
                .child(XmlElement::new(qualified(a, "noFill"))),
        )
        .child(
            XmlElement::new(qualified(p, "txBody"))
                .child(
                    XmlElement::new(qualified(a, "bodyPr"))
                        .attr("wrap", "none")
                        .child(XmlElement::new(qualified(a, "spAutoFit"))),
                )
                .child(XmlElement::new(qualified(a, "lstStyle")))
                .child(XmlElement::new(qualified(a, "p"))),
        )
}

/// The minimal `p:txBody` a shape needs before it can hold text.
fn empty_text_body(p: &str, a: &str) -> XmlElement {
    XmlElement::new(qualified(p, "txBody"))
        .child(XmlElement::new(qualified(a, "bodyPr")))
        .child(XmlElement::new(qualified(a, "lstStyle")))
        .child(XmlElement::new(qualified(a, "p")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pptx_name_core::{Emu, Rgb};

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>  Quarterly Review </a:t></a:r></a:p></p:txBody></p:sp><p:pic><p:nvPicPr><p:cNvPr id="7" name="Picture 6"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill/><p:spPr/></p:pic><p:sp><p:nvSpPr><p:cNvPr id="3" name="Rect 2"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp></p:spTree></p:cSld></p:sld>"#;

    fn slide() -> PptxSlide {
        PptxSlide::parse("ppt/slides/slide1.xml", SLIDE.as_bytes()).unwrap()
    }

    #[test]
    fn test_shapes_and_text() {
        let slide = slide();
        assert_eq!(slide.shape_count(), 3);
        assert!(slide.has_text(ShapeHandle(0)));
        assert!(!slide.has_text(ShapeHandle(1)));
        assert!(slide.has_text(ShapeHandle(2)));
        assert!(!slide.has_text(ShapeHandle(9)));
        assert_eq!(
            slide.text(ShapeHandle(0)).as_deref(),
            Some("  Quarterly Review ")
        );
        // A p:sp without a text body reads as empty text
        assert_eq!(slide.text(ShapeHandle(2)).as_deref(), Some(""));
        assert_eq!(slide.text(ShapeHandle(1)), None);
        assert_eq!(slide.trimmed_texts(), vec!["Quarterly Review", ""]);
        assert!(!slide.is_modified());
    }

    #[test]
    fn test_add_text_box() {
        let mut slide = slide();
        let rect = Rect::new(
            Emu::from_inches(1.5),
            Emu::from_inches(3.0),
            Emu::from_inches(4.0),
            Emu::from_inches(0.5),
        );

        let handle = slide.add_text_box(rect).unwrap();
        slide.set_text(handle, "Bob Smith").unwrap();
        slide.apply_style(handle, &TextStyle::new(24, Rgb::WHITE)).unwrap();

        assert_eq!(handle, ShapeHandle(3));
        assert_eq!(slide.shape_count(), 4);
        assert_eq!(slide.text(handle).as_deref(), Some("Bob Smith"));
        assert!(slide.is_modified());

        let xml = String::from_utf8(slide.to_bytes().unwrap()).unwrap();
        assert!(xml.contains(r#"<p:cNvPr id="8" name="TextBox 7"/>"#));
        assert!(xml.contains(r#"<a:off x="1371600" y="2743200"/>"#));
        assert!(xml.contains(r#"<a:ext cx="3657600" cy="457200"/>"#));
        assert!(xml.contains(r#"sz="2400""#));
        assert!(xml.contains(r#"<a:srgbClr val="FFFFFF"/>"#));
        assert!(xml.contains("<a:t>Bob Smith</a:t>"));
    }

    #[test]
    fn test_set_text_on_shape_without_frame_fails() {
        let mut slide = slide();
        let err = slide.set_text(ShapeHandle(1), "x").unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
        assert!(!slide.is_modified());
    }

    #[test]
    fn test_set_text_creates_missing_body() {
        let mut slide = slide();
        slide.set_text(ShapeHandle(2), "Filled").unwrap();

        assert_eq!(slide.text(ShapeHandle(2)).as_deref(), Some("Filled"));
        let xml = String::from_utf8(slide.to_bytes().unwrap()).unwrap();
        assert!(xml.contains(
            r#"<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>Filled</a:t></a:r></a:p></p:txBody></p:sp>"#
        ));
    }

    #[test]
    fn test_text_box_goes_before_ext_list() {
        let xml = SLIDE.replace(
            "</p:spTree>",
            r#"<p:extLst><p:ext uri="{X}"/></p:extLst></p:spTree>"#,
        );
        let mut slide = PptxSlide::parse("ppt/slides/slide1.xml", xml.as_bytes()).unwrap();
        slide.add_text_box(Rect::new(Emu(0), Emu(0), Emu(1), Emu(1))).unwrap();

        let tree = slide.sp_tree().unwrap();
        let last = tree.elements().last().unwrap();
        assert!(last.is("extLst"));
        assert_eq!(slide.shape_count(), 4);
    }

    #[test]
    fn test_missing_shape_tree_is_error() {
        let err = PptxSlide::parse("s.xml", b"<p:sld xmlns:p=\"urn:p\"/>").unwrap_err();
        assert!(matches!(err, Error::XmlError(_)));
    }
}
