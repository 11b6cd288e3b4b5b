//! Minimal owned element tree built on top of `quick-xml` events.
//!
//! Feeds and sitemaps are small, so it is simpler to read them into a tree
//! once and then look up children by name than to thread a state machine
//! through every format. Element names keep their prefix (`content:encoded`,
//! `dc:date`); [`Element::local_name`] strips it for formats that are
//! usually default-namespaced, like Atom and sitemaps. Each element also
//! carries the namespace URI its prefix is bound to, for RSS modules whose
//! prefix is the author's choice.

use crate::errors::ParseError;
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::escape::{resolve_html5_entity, resolve_xml_entity};
use quick_xml::events::{BytesRef, BytesStart, Event};

/// One XML element with its attributes, direct text and children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Qualified name as written in the document.
    pub name: String,
    /// Attributes as `(qualified key, unescaped value)` in document order.
    pub attrs: Vec<(String, String)>,
    /// Concatenated direct text and CDATA content, untrimmed.
    pub text: String,
    pub children: Vec<Element>,
    /// URI bound to the name's prefix (or the default namespace) in scope.
    pub namespace: Option<String>,
}

impl Element {
    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Prefix of the qualified name, `""` when there is none.
    pub fn prefix(&self) -> &str {
        self.name.rsplit_once(':').map_or("", |(prefix, _)| prefix)
    }

    /// First direct child with this local name in `namespace`.
    pub fn child_ns<'a>(&'a self, namespace: &str, local: &str) -> Option<&'a Element> {
        self.children
            .iter()
            .find(|c| c.local_name() == local && c.namespace.as_deref() == Some(namespace))
    }

    /// First direct child with exactly this qualified name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Direct children with exactly this qualified name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Direct children matching a local name, whatever their prefix.
    pub fn children_local<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.local_name() == local)
    }

    /// First direct child matching a local name.
    pub fn child_local<'a>(&'a self, local: &str) -> Option<&'a Element> {
        self.children.iter().find(|c| c.local_name() == local)
    }

    /// Trimmed text of the first child named `name`, or `""`.
    pub fn child_text(&self, name: &str) -> &str {
        self.child(name).map(|c| c.text.trim()).unwrap_or("")
    }

    /// Trimmed text of the first child with local name `local`, or `""`.
    pub fn child_text_local(&self, local: &str) -> &str {
        self.child_local(local).map(|c| c.text.trim()).unwrap_or("")
    }

    /// Attribute value by key, matching either the qualified or the local key.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key || k.rsplit_once(':').is_some_and(|(_, local)| local == key))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a whole document into its root element.
///
/// Text is decoded with the encoding named in the XML declaration (or BOM),
/// so legacy single-byte feeds such as `windows-1251` come out readable.
/// Mismatched or missing end tags are reported as [`ParseError`]. Content
/// outside the root (BOM, whitespace, comments) is ignored.
pub fn parse_document(bytes: &[u8]) -> Result<Element, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    let mut stack: Vec<Element> = Vec::new();
    // namespace declarations, one frame per open element
    let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event()?;
        let decoder = reader.decoder();
        match event {
            Event::Start(e) => {
                let el = open_element(&e, decoder, &mut scopes)?;
                stack.push(el);
            }
            Event::Empty(e) => {
                let el = open_element(&e, decoder, &mut scopes)?;
                scopes.pop();
                attach(&mut stack, &mut root, el);
            }
            Event::End(_) => {
                scopes.pop();
                if let Some(done) = stack.pop() {
                    attach(&mut stack, &mut root, done);
                }
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&decoder.decode(&t).map_err(quick_xml::Error::from)?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&decoder.decode(&c).map_err(quick_xml::Error::from)?);
                }
            }
            Event::GeneralRef(r) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&resolve_reference(&r, decoder)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ParseError::Unclosed(open.name));
    }
    root.ok_or(ParseError::Empty)
}

/// Build an element and push its namespace declarations onto `scopes`.
fn open_element(
    e: &BytesStart<'_>,
    decoder: Decoder,
    scopes: &mut Vec<Vec<(String, String)>>,
) -> Result<Element, ParseError> {
    let mut attrs = Vec::new();
    for a in e.attributes().flatten() {
        let key = decoder.decode(a.key.as_ref()).map_err(quick_xml::Error::from)?.into_owned();
        // unknown entities leave the value as written
        let value = match a.decode_and_unescape_value_with(decoder, lookup_entity) {
            Ok(v) => v.into_owned(),
            Err(_) => decoder.decode(&a.value).map_err(quick_xml::Error::from)?.into_owned(),
        };
        attrs.push((key, value));
    }

    let mut el = Element {
        name: decoder.decode(e.name().as_ref()).map_err(quick_xml::Error::from)?.into_owned(),
        attrs,
        ..Default::default()
    };
    scopes.push(declared_namespaces(&el.attrs));
    el.namespace = lookup_namespace(scopes, el.prefix());
    Ok(el)
}

/// `(prefix, uri)` pairs from `xmlns` attributes; the default namespace has
/// an empty prefix.
fn declared_namespaces(attrs: &[(String, String)]) -> Vec<(String, String)> {
    attrs
        .iter()
        .filter_map(|(key, uri)| {
            if key == "xmlns" {
                Some((String::new(), uri.clone()))
            } else {
                key.strip_prefix("xmlns:").map(|prefix| (prefix.to_string(), uri.clone()))
            }
        })
        .collect()
}

/// Innermost binding for `prefix`. `xmlns=""` unbinds the default.
fn lookup_namespace(scopes: &[Vec<(String, String)>], prefix: &str) -> Option<String> {
    scopes
        .iter()
        .rev()
        .flat_map(|frame| frame.iter())
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.clone())
        .filter(|uri| !uri.is_empty())
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

/// XML's five entities plus the HTML5 set, which feeds use freely.
fn lookup_entity(name: &str) -> Option<&'static str> {
    resolve_xml_entity(name).or_else(|| resolve_html5_entity(name))
}

/// Text for an `&...;` reference inside element content.
///
/// Unknown names are kept verbatim rather than failing the document.
fn resolve_reference(r: &BytesRef<'_>, decoder: Decoder) -> Result<String, ParseError> {
    if let Ok(Some(ch)) = r.resolve_char_ref() {
        return Ok(ch.to_string());
    }
    let name = decoder.decode(r).map_err(quick_xml::Error::from)?;
    Ok(match lookup_entity(&name) {
        Some(text) => text.to_string(),
        None => format!("&{name};"),
    })
}
