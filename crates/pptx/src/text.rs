//! Reading and rewriting DrawingML text bodies (`p:txBody`).

use crate::xml::{XmlElement, XmlNode};
use pptx_name_core::TextStyle;
use std::borrow::Cow;
use std::fmt::Write;

/// Vertical tab, how a soft line break (`a:br`) reads in shape text.
pub const LINE_BREAK: char = '\u{b}';

/// Fill elements a run's properties may carry; at most one is allowed.
const FILL_ELEMENTS: &[&str] = &["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];

/// Full text of a text body: paragraphs joined with `\n`.
pub fn frame_text(tx_body: &XmlElement) -> String {
    tx_body
        .elements()
        .filter(|e| e.is("p"))
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.find("t") {
                    text.push_str(&unescape_controls(&t.inner_text()));
                }
            }
            "br" => text.push(LINE_BREAK),
            _ => {}
        }
    }
    text
}

/// Replace the body's paragraphs with `text`, one paragraph per line.
///
/// Every paragraph keeps the first paragraph's `a:pPr`, and every run
/// keeps the first run's `a:rPr`. The first paragraph's `a:endParaRPr` is
/// carried onto the first new paragraph.
pub fn set_frame_text(tx_body: &mut XmlElement, text: &str) {
    let dml = dml_prefix(tx_body).to_string();

    let first_paragraph = tx_body.find("p");
    let paragraph_props = first_paragraph.and_then(|p| p.find("pPr")).cloned();
    let end_props = first_paragraph.and_then(|p| p.find("endParaRPr")).cloned();
    let run_props = tx_body
        .elements()
        .filter(|e| e.is("p"))
        .flat_map(|p| p.elements().filter(|e| e.is("r")))
        .find_map(|r| r.find("rPr"))
        .cloned();

    let insert_at = tx_body.position("p").unwrap_or(tx_body.children.len());
    tx_body.remove_all(&["p"]);

    let paragraphs: Vec<XmlNode> = text
        .split('\n')
        .enumerate()
        .map(|(index, line)| {
            let end = if index == 0 { end_props.clone() } else { None };
            XmlNode::Element(build_paragraph(
                &dml,
                line,
                paragraph_props.as_ref(),
                run_props.as_ref(),
                end,
            ))
        })
        .collect();

    let tail = tx_body.children.split_off(insert_at);
    tx_body.children.extend(paragraphs);
    tx_body.children.extend(tail);
}

fn build_paragraph(
    dml: &str,
    line: &str,
    paragraph_props: Option<&XmlElement>,
    run_props: Option<&XmlElement>,
    end_props: Option<XmlElement>,
) -> XmlElement {
    let mut paragraph = XmlElement::new(qualified(dml, "p"));
    if let Some(props) = paragraph_props {
        paragraph = paragraph.child(props.clone());
    }

    for (index, segment) in line.split(LINE_BREAK).enumerate() {
        if index > 0 {
            paragraph = paragraph.child(XmlElement::new(qualified(dml, "br")));
        }
        if segment.is_empty() {
            continue;
        }
        let mut run = XmlElement::new(qualified(dml, "r"));
        if let Some(props) = run_props {
            run = run.child(props.clone());
        }
        run = run.child(XmlElement::new(qualified(dml, "t")).text(escape_controls(segment)));
        paragraph = paragraph.child(run);
    }

    if let Some(props) = end_props {
        paragraph = paragraph.child(props);
    }
    paragraph
}

/// Control characters XML 1.0 cannot carry. Tab, newline and carriage
/// return are allowed.
fn is_forbidden_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}')
}

/// Write forbidden control characters as `_xHHHH_`, the escape Office
/// uses for them in `a:t`.
fn escape_controls(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_forbidden_control) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if is_forbidden_control(c) {
            let _ = write!(escaped, "_x{:04X}_", u32::from(c));
        } else {
            escaped.push(c);
        }
    }
    Cow::Owned(escaped)
}

/// Undo [`escape_controls`]. Escapes of anything but a forbidden control
/// character are left as literal text.
fn unescape_controls(text: &str) -> Cow<'_, str> {
    if !text.contains("_x") {
        return Cow::Borrowed(text);
    }
    let mut unescaped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("_x") {
        unescaped.push_str(&rest[..start]);
        let tail = &rest[start..];
        match decode_control(tail) {
            Some(c) => {
                unescaped.push(c);
                rest = &tail[7..];
            }
            None => {
                unescaped.push_str("_x");
                rest = &tail[2..];
            }
        }
    }
    unescaped.push_str(rest);
    Cow::Owned(unescaped)
}

/// The control character encoded at the start of `s`, as in `_x0001_`.
fn decode_control(s: &str) -> Option<char> {
    let hex = s.get(2..6)?;
    if s.get(6..7)? != "_" || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let c = char::from_u32(u32::from_str_radix(hex, 16).ok()?)?;
    is_forbidden_control(c).then_some(c)
}

/// Set size and solid color on every run of the body.
pub fn style_runs(tx_body: &mut XmlElement, style: &TextStyle) {
    let dml = dml_prefix(tx_body).to_string();
    let size = style.size_centipoints.to_string();
    let color = style.color.to_hex();

    for paragraph in tx_body.elements_mut().filter(|e| e.is("p")) {
        for run in paragraph.elements_mut().filter(|e| e.is("r")) {
            if run.position("rPr").is_none() {
                run.children
                    .insert(0, XmlNode::Element(XmlElement::new(qualified(&dml, "rPr"))));
            }
            let Some(props) = run.find_mut("rPr") else {
                continue;
            };

            props.set_attr("sz", size.as_str());
            props.remove_all(FILL_ELEMENTS);
            // The fill follows a:ln when there is one.
            let at = props.position("ln").map(|i| i + 1).unwrap_or(0);
            let fill = XmlElement::new(qualified(&dml, "solidFill"))
                .child(XmlElement::new(qualified(&dml, "srgbClr")).attr("val", color.as_str()));
            props.children.insert(at, XmlNode::Element(fill));
        }
    }
}

/// DrawingML prefix used inside this body, `a` unless the body says otherwise.
fn dml_prefix(tx_body: &XmlElement) -> &str {
    tx_body.elements().next().map(|e| e.prefix()).unwrap_or("a")
}

/// Join a prefix and local name, leaving unprefixed names bare.
pub fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;
    use pptx_name_core::Rgb;

    fn body(xml: &str) -> XmlElement {
        let wrapped = format!(
            r#"<p:txBody xmlns:p="urn:p" xmlns:a="urn:a">{}</p:txBody>"#,
            xml
        );
        XmlDocument::parse(wrapped.as_bytes()).unwrap().root().clone()
    }

    #[test]
    fn test_frame_text_joins_paragraphs_runs_and_breaks() {
        let tx = body(
            r#"<a:bodyPr/><a:p><a:r><a:t>Hello </a:t></a:r><a:r><a:t>there</a:t></a:r></a:p><a:p><a:r><a:t>one</a:t></a:r><a:br/><a:fld id="x" type="slidenum"><a:t>2</a:t></a:fld></a:p>"#,
        );
        assert_eq!(frame_text(&tx), "Hello there\none\u{b}2");
    }

    #[test]
    fn test_empty_body_reads_empty() {
        let tx = body(r#"<a:bodyPr/><a:lstStyle/><a:p/>"#);
        assert_eq!(frame_text(&tx), "");
    }

    #[test]
    fn test_set_text_keeps_properties() {
        let mut tx = body(
            r#"<a:bodyPr/><a:lstStyle/><a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="3200" b="1"/><a:t>{{NA</a:t></a:r><a:r><a:t>ME}}, welcome!</a:t></a:r><a:endParaRPr lang="en-US"/></a:p><a:p><a:r><a:t>old</a:t></a:r></a:p>"#,
        );

        let replaced = frame_text(&tx).replace("{{NAME}}", "Alice");
        set_frame_text(&mut tx, &replaced);

        assert_eq!(frame_text(&tx), "Alice, welcome!\nold");
        let paragraphs: Vec<&XmlElement> = tx.elements().filter(|e| e.is("p")).collect();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].find("pPr").unwrap().get_attr("algn"), Some("ctr"));
        assert!(paragraphs[0].find("endParaRPr").is_some());
        assert!(paragraphs[1].find("endParaRPr").is_none());

        let run = paragraphs[0].find("r").unwrap();
        let props = run.find("rPr").unwrap();
        assert_eq!(props.get_attr("sz"), Some("3200"));
        assert_eq!(props.get_attr("b"), Some("1"));

        // bodyPr and lstStyle still lead the body
        let order: Vec<&str> = tx.elements().map(|e| e.local_name()).collect();
        assert_eq!(order, vec!["bodyPr", "lstStyle", "p", "p"]);
    }

    #[test]
    fn test_set_text_line_breaks_and_empty() {
        let mut tx = body(r#"<a:bodyPr/><a:p/>"#);
        set_frame_text(&mut tx, "a\u{b}b");
        let p = tx.find("p").unwrap();
        let kinds: Vec<&str> = p.elements().map(|e| e.local_name()).collect();
        assert_eq!(kinds, vec!["r", "br", "r"]);

        set_frame_text(&mut tx, "");
        assert_eq!(tx.elements().filter(|e| e.is("p")).count(), 1);
        assert_eq!(frame_text(&tx), "");
    }

    #[test]
    fn test_style_runs_sets_size_and_color() {
        let mut tx = body(
            r#"<a:bodyPr/><a:p><a:r><a:t>x</a:t></a:r><a:r><a:rPr sz="1000"><a:ln w="1"/><a:noFill/><a:latin typeface="Arial"/></a:rPr><a:t>y</a:t></a:r></a:p>"#,
        );
        style_runs(&mut tx, &TextStyle::new(24, Rgb::WHITE));

        for run in tx.find("p").unwrap().elements().filter(|e| e.is("r")) {
            let props = run.find("rPr").unwrap();
            assert_eq!(props.get_attr("sz"), Some("2400"));
            let fill = props.find("solidFill").unwrap();
            assert_eq!(fill.find("srgbClr").unwrap().get_attr("val"), Some("FFFFFF"));
            assert!(props.find("noFill").is_none());
            assert_eq!(run.elements().next().unwrap().local_name(), "rPr");
        }

        let second = tx.find("p").unwrap().elements().nth(1).unwrap();
        let order: Vec<&str> = second
            .find("rPr")
            .unwrap()
            .elements()
            .map(|e| e.local_name())
            .collect();
        assert_eq!(order, vec!["ln", "solidFill", "latin"]);
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let mut tx = body(r#"<a:bodyPr/><a:p/>"#);
        set_frame_text(&mut tx, "A\u{1}B\u{1f}\tC");

        let t = tx.path(&["p", "r", "t"]).unwrap();
        assert_eq!(t.inner_text(), "A_x0001_B_x001F_\tC");
        assert_eq!(frame_text(&tx), "A\u{1}B\u{1f}\tC");
    }

    #[test]
    fn test_unescape_leaves_other_sequences() {
        assert_eq!(unescape_controls("_x0041_ and _x12"), "_x0041_ and _x12");
        assert_eq!(unescape_controls("a_x0007_b_x_"), "a\u{7}b_x_");
        assert_eq!(escape_controls("plain"), "plain");
    }

    #[test]
    fn test_qualified() {
        assert_eq!(qualified("a", "r"), "a:r");
        assert_eq!(qualified("", "r"), "r");
    }
}
