//! Minimal element tree for embedded markup
//!
//! Parsed documents keep elements, attributes, text and CDATA in order.
//! Comments and processing instructions are dropped. Whitespace-only text
//! between elements is treated as formatting and discarded.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::{Error, Result};

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
}

/// An XML element with ordered attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// The `<?xml ...?>` declaration of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Declaration {
    pub fn new(encoding: &str) -> Self {
        Self {
            version: "1.0".into(),
            encoding: Some(encoding.into()),
            standalone: None,
        }
    }
}

/// A parsed document: optional declaration plus root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub declaration: Option<Declaration>,
    pub root: Element,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Builder form of [`Element::set_attr`] that skips absent values.
    pub fn with_attr(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.set_attr(name, value);
        }
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push(child);
        self
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// All descendants reached by following `path` (`/`-separated names).
    pub fn select(&self, path: &str) -> Vec<&Element> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|e| e.elements().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    /// Mutable form of [`Element::select`].
    pub fn select_mut(&mut self, path: &str) -> Vec<&mut Element> {
        let steps: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut current = vec![self];
        for step in steps {
            current = current
                .into_iter()
                .flat_map(|e| e.elements_mut().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    /// Content of the first text or CDATA child.
    pub fn text(&self) -> Option<&str> {
        self.children.iter().find_map(|n| match n {
            Node::Text(t) | Node::CData(t) => Some(t.as_str()),
            Node::Element(_) => None,
        })
    }

    /// Whether the element holds a text or CDATA child.
    pub fn has_text(&self) -> bool {
        self.text().is_some()
    }

    /// Replace the first text-like child, or append a text child.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        for node in &mut self.children {
            match node {
                Node::Text(t) | Node::CData(t) => {
                    *t = text;
                    return;
                }
                Node::Element(_) => {}
            }
        }
        self.children.push(Node::Text(text));
    }
}

fn decode_utf8(bytes: Cow<'_, [u8]>) -> String {
    match bytes {
        Cow::Borrowed(b) => String::from_utf8_lossy(b).into_owned(),
        Cow::Owned(b) => String::from_utf8(b)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}

fn open_element(start: &BytesStart<'_>, context: &str) -> Result<Element> {
    let mut element = Element::new(decode_utf8(Cow::Borrowed(start.name().as_ref())));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::xml(context, e))?;
        let key = decode_utf8(Cow::Borrowed(attr.key.as_ref()));
        let value = attr.unescape_value().map_err(|e| Error::xml(context, e))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

impl Fragment {
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            root,
        }
    }

    /// Parse a document. `context` names the source in error messages.
    pub fn parse(text: &str, context: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        let mut declaration = None;
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            let event = reader.read_event().map_err(|e| Error::xml(context, e))?;
            match event {
                Event::Decl(decl) => {
                    let version = decl.version().map_err(|e| Error::xml(context, e))?;
                    let encoding = match decl.encoding() {
                        Some(enc) => Some(decode_utf8(enc.map_err(|e| Error::xml(context, e))?)),
                        None => None,
                    };
                    let standalone = match decl.standalone() {
                        Some(sa) => Some(decode_utf8(sa.map_err(|e| Error::xml(context, e))?)),
                        None => None,
                    };
                    declaration = Some(Declaration {
                        version: decode_utf8(version),
                        encoding,
                        standalone,
                    });
                }
                Event::Start(start) => stack.push(open_element(&start, context)?),
                Event::Empty(start) => {
                    let element = open_element(&start, context)?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => root = Some(element),
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::malformed(context, "unbalanced closing tag"))?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => root = Some(element),
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| Error::xml(context, e))?;
                    if text.trim().is_empty() {
                        continue;
                    }
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(Node::CData(decode_utf8(data.into_inner())));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::malformed(context, "unclosed element"));
        }
        let root = root.ok_or_else(|| Error::malformed(context, "missing root element"))?;
        Ok(Self { declaration, root })
    }

    /// Serialize with two-space indentation.
    pub fn to_indented_string(&self) -> Result<String> {
        self.serialize(true)
    }

    /// Serialize without any formatting whitespace.
    ///
    /// Empty elements are written as `<a/>`, and the declaration is followed
    /// by CRLF.
    pub fn to_compact_string(&self) -> Result<String> {
        self.serialize(false)
    }

    fn serialize(&self, indent: bool) -> Result<String> {
        let mut writer = if indent {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        let root_name = self.root.name.clone();

        if let Some(decl) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(|e| Error::xml(&root_name, e))?;
            if !indent {
                writer
                    .get_mut()
                    .extend_from_slice(b"\r\n");
            }
        }
        write_element(&mut writer, &self.root)?;

        let bytes = writer.into_inner();
        String::from_utf8(bytes).map_err(|e| Error::xml(&root_name, e))
    }
}

/// Escape attribute content, keeping line breaks and tabs as character references.
pub(crate) fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    let escaped: Vec<(String, String)> = element
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), escape_attr(v)))
        .collect();
    for (key, value) in &escaped {
        start.push_attribute((key.as_bytes(), value.as_bytes()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(|e| Error::xml(&element.name, e))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(|e| Error::xml(&element.name, e))?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => {
                let escaped = escape_text(t);
                writer
                    .write_event(Event::Text(BytesText::from_escaped(escaped.as_str())))
                    .map_err(|e| Error::xml(&element.name, e))?;
            }
            Node::CData(t) => {
                writer
                    .write_event(Event::CData(BytesCData::new(t.as_str())))
                    .map_err(|e| Error::xml(&element.name, e))?;
            }
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| Error::xml(&element.name, e))?;
    Ok(())
}
