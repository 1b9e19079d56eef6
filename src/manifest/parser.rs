//! XML parser producing an [`Element`] tree
//!
//! Comments, processing instructions, and the XML declaration are dropped.
//! Character data is unescaped and trimmed per segment: an element's leading
//! text, and the tail after each child.

use super::element::Element;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Malformed XML
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct XmlError(pub String);

/// Parse a complete XML document and return its root element
pub fn parse_document(xml: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if stack.is_empty() && root.is_some() {
                    return Err(XmlError("multiple root elements".to_string()));
                }
                stack.push(parse_element(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let element = parse_element(e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| XmlError("unexpected closing tag".to_string()))?;
                element.text = element.text.trim().to_string();
                for child in &mut element.children {
                    child.tail = child.tail.trim().to_string();
                }
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(ref e)) => {
                let raw = String::from_utf8_lossy(e);
                let text = unescape(&raw)
                    .map_err(|err| XmlError(format!("Invalid character data: {}", err)))?;
                push_text(&mut stack, &text)?;
            }
            Ok(Event::CData(ref e)) => {
                push_text(&mut stack, &String::from_utf8_lossy(e))?;
            }
            Ok(Event::GeneralRef(ref e)) => {
                let reference = format!("&{};", String::from_utf8_lossy(e));
                let text = unescape(&reference)
                    .map_err(|err| XmlError(format!("Invalid entity reference: {}", err)))?;
                push_text(&mut stack, &text)?;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XmlError(format!(
                    "Error parsing XML at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError(format!("unclosed element <{}>", open.tag)));
    }

    root.ok_or_else(|| XmlError("document has no root element".to_string()))
}

fn parse_element(e: &BytesStart) -> Result<Element, XmlError> {
    let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()).to_string());

    for attr in e.attributes() {
        let attr = attr.map_err(|e| XmlError(format!("Invalid attribute: {}", e)))?;
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError(format!("Invalid attribute value: {}", e)))?;
        element.attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).to_string(),
            value.to_string(),
        ));
    }

    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(XmlError("multiple root elements".to_string())),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(open) => match open.children.last_mut() {
            Some(previous) => previous.tail.push_str(text),
            None => open.text.push_str(text),
        },
        None if text.trim().is_empty() => {}
        None => {
            return Err(XmlError(format!(
                "text outside of root element: {}",
                text.trim()
            )))
        }
    }
    Ok(())
}
