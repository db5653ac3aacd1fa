//! XML response normalization.
//!
//! Elements become JSON values: a text-only element without attributes is a
//! string, anything else is an object whose keys are attribute names and child
//! element names (attributes and children share one level). Repeated children
//! collapse into an array; a lone child stays a plain value. Text mixed with
//! attributes or children lands under [`TEXT_FIELD`].

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value, json};
use tracing::debug;

/// Key holding the original body when it could not be parsed.
pub const RAW_FIELD: &str = "raw";

/// Key holding element text that sits next to attributes or children.
pub const TEXT_FIELD: &str = "#text";

/// Converts an XML body into a JSON value.
///
/// Never fails: unparseable input comes back as `{"raw": <body>}`.
#[must_use]
pub fn normalize(body: &str) -> Value {
    match parse_document(body) {
        Ok(value) => value,
        Err(reason) => {
            debug!(%reason, bytes = body.len(), "markup parse failed; returning raw body");
            json!({ RAW_FIELD: body })
        }
    }
}

/// Returns `true` when `value` is the raw fallback envelope produced for
/// `body`.
///
/// A well-formed `<raw>..</raw>` document has the same shape as the
/// envelope, so the carried string must also equal the original body.
#[must_use]
pub fn is_raw(value: &Value, body: &str) -> bool {
    value.as_object().is_some_and(|map| {
        map.len() == 1 && map.get(RAW_FIELD).and_then(Value::as_str) == Some(body)
    })
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|err| format!("invalid element name: {err}"))?
            .to_owned();

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| format!("attribute error: {err}"))?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|err| format!("invalid attribute name: {err}"))?
                .to_owned();
            let value = attribute
                .unescape_value()
                .map_err(|err| format!("attribute value error: {err}"))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    fn into_value(self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return Value::String(self.text);
        }

        let mut map = Map::new();
        for (key, value) in self.attributes {
            insert_or_append(&mut map, key, Value::String(value));
        }
        for child in self.children {
            let name = child.name.clone();
            insert_or_append(&mut map, name, child.into_value());
        }
        if !self.text.is_empty() {
            insert_or_append(&mut map, TEXT_FIELD.to_owned(), Value::String(self.text));
        }
        Value::Object(map)
    }
}

// Element values are never arrays, so an existing array can only be a group
// of earlier siblings.
fn insert_or_append(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        None => {
            map.insert(key, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

fn parse_document(body: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    // The bottom of the stack is a nameless document node collecting roots.
    let mut stack = vec![Element::default()];

    loop {
        let event = reader
            .read_event()
            .map_err(|err| format!("parse error at {}: {err}", reader.buffer_position()))?;

        match event {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                attach(&mut stack, element)?;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err("unexpected closing tag".to_owned());
                }
                let element = stack.pop().ok_or("unexpected closing tag")?;
                attach(&mut stack, element)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| format!("text error: {err}"))?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)
                    .map_err(|err| format!("cdata error: {err}"))?
                    .to_owned();
                append_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            // declarations, doctypes, comments and processing instructions
            _ => {}
        }
    }

    if stack.len() > 1 {
        let unclosed: Vec<_> = stack[1..].iter().map(|e| e.name.as_str()).collect();
        return Err(format!("unclosed element(s): <{}>", unclosed.join(">, <")));
    }

    let document = stack.pop().ok_or("empty document")?;
    if document.children.is_empty() {
        return Err("no root element".to_owned());
    }

    let mut map = Map::new();
    for root in document.children {
        let name = root.name.clone();
        insert_or_append(&mut map, name, root.into_value());
    }
    Ok(Value::Object(map))
}

fn attach(stack: &mut [Element], element: Element) -> Result<(), String> {
    let parent = stack.last_mut().ok_or("element outside document")?;
    parent.children.push(element);
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), String> {
    if stack.len() < 2 {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err("text outside the root element".to_owned());
    }
    if let Some(current) = stack.last_mut() {
        current.text.push_str(text);
    }
    Ok(())
}
