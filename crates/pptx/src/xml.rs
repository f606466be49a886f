//! A small owned XML tree over quick-xml events.
//!
//! Slides are read into this tree, edited, and written back. Anything the
//! edits do not understand (declarations, comments, CDATA, processing
//! instructions) is carried as the original event.

use pptx_name_core::{Error, Result};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;

/// A node in the tree.
#[derive(Debug, Clone)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data.
    Text(String),
    Other(Event<'static>),
}

/// An element with its attributes (unescaped) and children.
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder: add an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Builder: add a child element.
    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder: add a text child.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix of the element name, empty when unprefixed.
    pub fn prefix(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(prefix, _)| prefix)
            .unwrap_or("")
    }

    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn find(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local))
    }

    pub fn find_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(local))
    }

    /// Follow a chain of local names from this element.
    pub fn path(&self, locals: &[&str]) -> Option<&XmlElement> {
        locals.iter().try_fold(self, |e, local| e.find(local))
    }

    pub fn path_mut(&mut self, locals: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for local in locals {
            current = current.find_mut(local)?;
        }
        Some(current)
    }

    /// Index into `children` of the first element with the given local name.
    pub fn position(&self, local: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.is(local)))
    }

    /// Remove every child element whose local name is in `locals`.
    pub fn remove_all(&mut self, locals: &[&str]) {
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(e) if locals.contains(&e.local_name())));
    }

    /// Concatenated text of direct text children.
    pub fn inner_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Visit this element and every descendant element, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a XmlElement)) {
        visit(self);
        for child in self.elements() {
            child.walk(visit);
        }
    }
}

/// A parsed document: the root element plus whatever surrounds it.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    prolog: Vec<XmlNode>,
    root: XmlElement,
    epilog: Vec<XmlNode>,
}

impl XmlDocument {
    /// Parse a UTF-8 XML part.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let content = std::str::from_utf8(bytes)
            .map_err(|e| Error::XmlError(format!("Part is not UTF-8: {}", e)))?;
        // Parts may start with a byte-order mark.
        let content = content.trim_start_matches('\u{feff}');

        let mut reader = Reader::from_str(content);
        let mut nodes: Vec<XmlNode> = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::XmlError(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(ref e) => stack.push(element_from(e)?),
                Event::Empty(ref e) => {
                    let element = element_from(e)?;
                    push_node(&mut stack, &mut nodes, XmlNode::Element(element));
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("Unexpected closing tag".to_string()))?;
                    push_node(&mut stack, &mut nodes, XmlNode::Element(element));
                }
                Event::Text(ref e) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Invalid text: {}", e)))?;
                    push_node(&mut stack, &mut nodes, XmlNode::Text(text.into_owned()));
                }
                Event::Eof => break,
                other => push_node(&mut stack, &mut nodes, XmlNode::Other(other.into_owned())),
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::XmlError(format!("Unclosed element <{}>", open.name)));
        }

        let root_index = nodes
            .iter()
            .position(|n| matches!(n, XmlNode::Element(_)))
            .ok_or_else(|| Error::XmlError("Document has no root element".to_string()))?;
        let epilog = nodes.split_off(root_index + 1);
        let root = match nodes.pop() {
            Some(XmlNode::Element(root)) => root,
            _ => return Err(Error::XmlError("Document has no root element".to_string())),
        };

        Ok(Self {
            prolog: nodes,
            root,
            epilog,
        })
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    /// Serialize back to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner().into_inner())
    }
}

fn element_from(start: &BytesStart) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::XmlError(format!("Bad attribute on <{}>: {}", name, e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::XmlError(format!("Bad value for {}: {}", key, e)))?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(XmlElement {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn push_node(stack: &mut [XmlElement], nodes: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => nodes.push(node),
    }
}

fn write_node<W: std::io::Write>(writer: &mut Writer<W>, node: &XmlNode) -> Result<()> {
    let written = match node {
        XmlNode::Element(element) => return write_element(writer, element),
        XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text))),
        XmlNode::Other(event) => writer.write_event(event.clone()),
    };
    written.map_err(|e| Error::XmlError(format!("Failed to write XML: {}", e)))
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attrs {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let map_err = |e: quick_xml::Error| Error::XmlError(format!("Failed to write XML: {}", e));

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(map_err);
    }

    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start)).map_err(map_err)?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(end)).map_err(map_err)
}

/// Extract the local name from a potentially namespaced XML name.
pub fn local_name(name: &str) -> &str {
    name.split_once(':').map(|(_, local)| local).unwrap_or(name)
}
