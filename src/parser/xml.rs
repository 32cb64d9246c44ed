use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{ConvertError, Result};
use crate::instance::{InstanceId, InstanceTree, Variant};

/// Deepest element nesting accepted before a scene is rejected.
pub const MAX_DEPTH: usize = 10_000;

/// One element of a scene document, without its position in the source.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    /// Character data before the first child element.
    text: String,
    children: Vec<usize>,
}

impl Element {
    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Flat element table built from a pull parser. Index 0 is the document element.
#[derive(Debug)]
struct XmlDocument {
    elements: Vec<Element>,
}

impl XmlDocument {
    fn parse(text: &str) -> Result<Self> {
        let normalized;
        let text = if text.contains('\r') {
            normalized = text.replace("\r\n", "\n").replace('\r', "\n");
            normalized.as_str()
        } else {
            text
        };

        let mut reader = Reader::from_str(text);
        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let id = open_element(&mut elements, &open, &start)?;
                    open.push(id);
                    if open.len() > MAX_DEPTH {
                        return Err(ConvertError::TooDeep { limit: MAX_DEPTH });
                    }
                }
                Event::Empty(start) => {
                    open_element(&mut elements, &open, &start)?;
                }
                Event::End(_) => {
                    if open.pop().is_none() {
                        return Err(ConvertError::Malformed("unexpected closing tag".into()));
                    }
                }
                Event::Text(text) => {
                    if let Some(element) = leading_text_target(&mut elements, &open) {
                        element.text.push_str(&text.unescape().map_err(quick_xml::Error::from)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(element) = leading_text_target(&mut elements, &open) {
                        element.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = open.last() {
            return Err(ConvertError::Malformed(format!(
                "<{}> is never closed",
                elements[*unclosed].name
            )));
        }
        if elements.is_empty() {
            return Err(ConvertError::Malformed("document has no root element".into()));
        }
        Ok(Self { elements })
    }

    fn get(&self, id: usize) -> &Element {
        &self.elements[id]
    }

    fn children_named<'d>(&'d self, id: usize, name: &'d str) -> impl Iterator<Item = usize> + 'd {
        self.elements[id]
            .children
            .iter()
            .copied()
            .filter(move |child| self.elements[*child].name == name)
    }

    fn child_named(&self, id: usize, name: &str) -> Option<usize> {
        self.children_named(id, name).next()
    }

    /// Every element below `id` in document order.
    fn descendants(&self, id: usize) -> Vec<usize> {
        let mut found = Vec::new();
        let mut stack: Vec<usize> = self.elements[id].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            found.push(current);
            stack.extend(self.elements[current].children.iter().rev().copied());
        }
        found
    }
}

/// Records a new element under the innermost open one.
fn open_element(elements: &mut Vec<Element>, open: &[usize], start: &BytesStart) -> Result<usize> {
    let mut element = Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Element::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        element.attributes.push((key, value));
    }

    let id = elements.len();
    match open.last() {
        Some(parent) => elements[*parent].children.push(id),
        None if !elements.is_empty() => {
            return Err(ConvertError::Malformed(format!(
                "second document element <{}>",
                element.name
            )));
        }
        None => {}
    }
    elements.push(element);
    Ok(id)
}

/// The open element still collecting its leading text, if any.
fn leading_text_target<'e>(elements: &'e mut [Element], open: &[usize]) -> Option<&'e mut Element> {
    let element = &mut elements[*open.last()?];
    element.children.is_empty().then_some(element)
}

/// Parses a `.rbxmx`/`.rbxlx` document into a fresh instance tree.
///
/// The first `Item` directly under the document element is the root and any
/// later top-level siblings are ignored. Only when the document element has no
/// direct `Item` child is the whole document scanned, and then every `Item`
/// carrying both `class` and `referent` becomes a root of its own.
///
/// Documents nested deeper than [`MAX_DEPTH`] are rejected.
pub fn parse_xml(text: &str) -> Result<InstanceTree> {
    let document = XmlDocument::parse(text)?;
    let mut tree = InstanceTree::new();

    let mut top_level = document.children_named(0, "Item");
    match top_level.next() {
        Some(item) => {
            let ignored = top_level.count();
            if ignored > 0 {
                tracing::warn!("Ignoring {ignored} top-level Item sibling(s) after the first");
            }
            parse_item(&document, &mut tree, item)?;
        }
        None => {
            let candidates = document.descendants(0).into_iter().filter(|id| {
                let element = document.get(*id);
                element.name == "Item"
                    && element.attribute("class").is_some_and(|c| !c.is_empty())
                    && element.attribute("referent").is_some_and(|r| !r.is_empty())
            });
            for item in candidates {
                parse_item(&document, &mut tree, item)?;
            }
        }
    }

    if tree.roots().is_empty() {
        return Err(ConvertError::NoRoot);
    }

    tracing::debug!(
        "Parsed {} instance(s) under {} root(s)",
        tree.len(),
        tree.roots().len()
    );
    Ok(tree)
}

/// Adds `item` and its nested items to `tree` as a new root subtree.
fn parse_item(document: &XmlDocument, tree: &mut InstanceTree, item: usize) -> Result<()> {
    let mut stack: Vec<(usize, Option<InstanceId>)> = vec![(item, None)];

    while let Some((element_id, parent)) = stack.pop() {
        let element = document.get(element_id);
        let class_name = element.attribute("class").unwrap_or_default().to_string();
        let referent = element.attribute("referent").unwrap_or_default().to_string();
        let properties = match document.child_named(element_id, "Properties") {
            Some(props) => parse_properties(document, props)?,
            None => HashMap::new(),
        };

        let id = tree.insert(class_name, referent, properties, parent);

        // Reversed so the first child is popped, and therefore attached, first.
        let children: Vec<usize> = document.children_named(element_id, "Item").collect();
        stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
    }

    Ok(())
}

fn parse_properties(document: &XmlDocument, properties: usize) -> Result<HashMap<String, Variant>> {
    let mut decoded = HashMap::new();
    for prop in &document.get(properties).children {
        let element = document.get(*prop);
        let name = element.attribute("name").unwrap_or_default().to_string();
        let value = decode_property(document, &name, *prop)?;
        decoded.insert(name, value);
    }
    Ok(decoded)
}

fn decode_property(document: &XmlDocument, name: &str, prop: usize) -> Result<Variant> {
    let element = document.get(prop);
    let text = element.text.as_str();

    let value = match element.name.as_str() {
        "string" => Variant::String(text.to_string()),
        "ProtectedString" => Variant::String(text.to_string()),
        "bool" => Variant::Bool(text == "true"),
        "int" => Variant::Int(parse_number(name, "int", text, 0)?),
        "float" => Variant::Float(parse_number(name, "float", text, 0.0)?),
        "Content" => match document.child_named(prop, "url") {
            Some(url) => Variant::Raw(document.get(url).text.clone()),
            None => Variant::Raw(text.to_string()),
        },
        _ => Variant::Raw(text.to_string()),
    };
    Ok(value)
}

/// Decodes numeric property text.
///
/// Only empty text falls back to `empty`. Surrounding whitespace is accepted
/// around a number, but whitespace alone is not a number.
fn parse_number<T: std::str::FromStr>(
    name: &str,
    kind: &'static str,
    text: &str,
    empty: T,
) -> Result<T> {
    if text.is_empty() {
        return Ok(empty);
    }
    text.trim().parse().map_err(|_| ConvertError::InvalidProperty {
        name: name.to_string(),
        kind,
        value: text.to_string(),
    })
}
