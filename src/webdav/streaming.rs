use crate::common::compression::{ContentEncoding, decompress_stream};
use crate::webdav::types::DavEntry;
use anyhow::{Result, anyhow};
use hyper::body::Incoming;
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, Event};
use std::io::{BufRead, Cursor};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementName {
    Multistatus,
    Response,
    Propstat,
    Prop,
    Href,
    Status,
    Displayname,
    Getetag,
    Resourcetype,
    Collection,
    Getcontenttype,
    Getcontentlength,
    Getlastmodified,
    Other,
}

pub fn element_from_bytes(raw: &[u8]) -> ElementName {
    let local = match raw.iter().position(|b| *b == b':') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    };

    if local.eq_ignore_ascii_case(b"multistatus") {
        ElementName::Multistatus
    } else if local.eq_ignore_ascii_case(b"response") {
        ElementName::Response
    } else if local.eq_ignore_ascii_case(b"propstat") {
        ElementName::Propstat
    } else if local.eq_ignore_ascii_case(b"prop") {
        ElementName::Prop
    } else if local.eq_ignore_ascii_case(b"href") {
        ElementName::Href
    } else if local.eq_ignore_ascii_case(b"status") {
        ElementName::Status
    } else if local.eq_ignore_ascii_case(b"displayname") {
        ElementName::Displayname
    } else if local.eq_ignore_ascii_case(b"getetag") {
        ElementName::Getetag
    } else if local.eq_ignore_ascii_case(b"resourcetype") {
        ElementName::Resourcetype
    } else if local.eq_ignore_ascii_case(b"collection") {
        ElementName::Collection
    } else if local.eq_ignore_ascii_case(b"getcontenttype") {
        ElementName::Getcontenttype
    } else if local.eq_ignore_ascii_case(b"getcontentlength") {
        ElementName::Getcontentlength
    } else if local.eq_ignore_ascii_case(b"getlastmodified") {
        ElementName::Getlastmodified
    } else {
        ElementName::Other
    }
}

fn path_ends_with<T: PartialEq>(stack: &[T], needle: &[T]) -> bool {
    stack.len() >= needle.len() && stack[stack.len() - needle.len()..] == needle[..]
}

const PROP_PATH: [ElementName; 3] = [
    ElementName::Response,
    ElementName::Propstat,
    ElementName::Prop,
];

/// Event-driven builder of [`DavEntry`] values.
///
/// Element text is buffered between start and end tags because quick-xml reports entity
/// references as separate events.
struct MultistatusParser {
    stack: Vec<ElementName>,
    current: DavEntry,
    text: String,
    entries: Vec<DavEntry>,
}

impl MultistatusParser {
    fn new() -> Self {
        Self {
            stack: Vec::with_capacity(16),
            current: DavEntry::default(),
            text: String::new(),
            entries: Vec::new(),
        }
    }

    fn on_start(&mut self, raw: &[u8]) {
        let element = element_from_bytes(raw);
        self.stack.push(element);
        self.text.clear();

        match element {
            ElementName::Response => {
                self.current = DavEntry::default();
            }
            ElementName::Collection => {
                if self.path_ends_with(&[
                    ElementName::Response,
                    ElementName::Propstat,
                    ElementName::Prop,
                    ElementName::Resourcetype,
                    ElementName::Collection,
                ]) {
                    self.current.is_collection = true;
                }
            }
            _ => {}
        }
    }

    fn on_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn on_end(&mut self) {
        let text = std::mem::take(&mut self.text);
        let value = text.trim();
        if !value.is_empty() {
            self.assign(value);
        }

        if let Some(ElementName::Response) = self.stack.pop() {
            let finished = std::mem::take(&mut self.current);
            trace!(href = %finished.href, collection = finished.is_collection, "parsed response");
            self.entries.push(finished);
        }
    }

    fn assign(&mut self, value: &str) {
        let Some(&element) = self.stack.last() else {
            return;
        };

        if self.path_ends_with(&[ElementName::Response, ElementName::Href]) {
            self.current.href = value.to_string();
            return;
        }
        if self.path_ends_with(&[ElementName::Response, ElementName::Status]) {
            self.current.status = Some(value.to_string());
            return;
        }
        if self.path_ends_with(&[
            ElementName::Response,
            ElementName::Propstat,
            ElementName::Status,
        ]) {
            self.current.propstat_statuses.push(value.to_string());
            return;
        }

        let parent = &self.stack[..self.stack.len() - 1];
        if !path_ends_with(parent, &PROP_PATH) {
            return;
        }
        match element {
            ElementName::Displayname => self.current.displayname = Some(value.to_string()),
            ElementName::Getetag => self.current.etag = Some(value.to_string()),
            ElementName::Getcontenttype => self.current.content_type = Some(value.to_string()),
            ElementName::Getlastmodified => self.current.last_modified = Some(value.to_string()),
            ElementName::Getcontentlength => {
                self.current.content_length = value.parse().ok();
            }
            _ => {}
        }
    }

    fn path_ends_with(&self, needle: &[ElementName]) -> bool {
        path_ends_with(&self.stack, needle)
    }

    fn handle(&mut self, event: Event<'_>) -> Result<bool> {
        match event {
            Event::Start(e) => self.on_start(e.name().as_ref()),
            Event::Empty(e) => {
                self.on_start(e.name().as_ref());
                self.on_end();
            }
            Event::Text(e) => {
                let text = decode_text(e.as_ref())?;
                self.on_text(&text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                self.on_text(&text);
            }
            Event::GeneralRef(e) => {
                let text = resolve_reference(&e)?;
                self.on_text(&text);
            }
            Event::End(_) => self.on_end(),
            Event::Eof => return Ok(false),
            _ => {}
        }
        Ok(true)
    }
}

fn resolve_reference(reference: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = reference
        .resolve_char_ref()
        .map_err(|e| anyhow!("XML character reference error: {e}"))?
    {
        return Ok(ch.to_string());
    }
    let name = reference
        .decode()
        .map_err(|e| anyhow!("XML decode error: {e}"))?;
    match resolve_predefined_entity(&name) {
        Some(resolved) => Ok(resolved.to_string()),
        None => Ok(format!("&{name};")),
    }
}

fn parse_multistatus_reader<R: BufRead>(reader: R) -> Result<Vec<DavEntry>> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(false);

    let mut buf = Vec::with_capacity(8 * 1024);
    let mut parser = MultistatusParser::new();

    loop {
        let event = xml
            .read_event_into(&mut buf)
            .map_err(|e| anyhow!("XML error: {e}"))?;
        if !parser.handle(event)? {
            break;
        }
        buf.clear();
    }

    Ok(parser.entries)
}

/// Parse a WebDAV `207 Multi-Status` body from an already aggregated buffer.
pub fn parse_multistatus_bytes(body: &[u8]) -> Result<Vec<DavEntry>> {
    parse_multistatus_reader(Cursor::new(body))
}

/// Parse a `207 Multi-Status` body while it streams in, undoing `encodings` on the fly.
pub async fn parse_multistatus_stream(
    resp_body: Incoming,
    encodings: &[ContentEncoding],
) -> Result<Vec<DavEntry>> {
    let reader = decompress_stream(resp_body, encodings);
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(false);

    let mut buf = Vec::with_capacity(8 * 1024);
    let mut parser = MultistatusParser::new();

    loop {
        let event = xml
            .read_event_into_async(&mut buf)
            .await
            .map_err(|e| anyhow!("XML parsing error: {e}"))?;
        if !parser.handle(event)? {
            break;
        }
        buf.clear();
    }

    Ok(parser.entries)
}

pub fn decode_text(raw: &[u8]) -> Result<String> {
    match std::str::from_utf8(raw) {
        Ok(s) => Ok(unescape(s)
            .map_err(|err| anyhow!("XML decode error: {err}"))?
            .into_owned()),
        Err(_) => Ok(String::from_utf8_lossy(raw).into_owned()),
    }
}
