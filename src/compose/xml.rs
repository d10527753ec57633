//! Event-stream rewriting of WordprocessingML parts.
//!
//! Every function here reads a part with `quick-xml`, passes untouched events
//! straight back to the writer, and only re-serialises what it changes. The
//! result is byte-identical to the input outside the edited nodes.

use super::ComposeError;
use crate::metadata::PlaceholderMap;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesText, Event};
use std::collections::HashSet;
use std::ops::Range;

pub const IMAGE_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

fn xml_err<E: Into<quick_xml::Error>>(e: E) -> ComposeError {
    ComposeError::Xml(e.into())
}

fn reader(xml: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    reader
}

fn escaped_text(text: &str) -> Event<'static> {
    Event::Text(BytesText::from_escaped(partial_escape(text).into_owned()))
}

// =========================================================================
// Placeholders
// =========================================================================

/// Byte ranges of mapped `{{token}}`s in `text`, found in one left-to-right
/// pass, paired with their values. Unmapped tokens are skipped.
fn token_spans<'m>(text: &str, placeholders: &'m PlaceholderMap) -> Vec<(Range<usize>, &'m str)> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while let Some(found) = text[pos..].find("{{") {
        let start = pos + found;
        let Some(close) = text[start..].find("}}") else {
            break;
        };
        let end = start + close + 2;
        match placeholders.get(&text[start..end]) {
            Some(value) => {
                spans.push((start..end, value));
                pos = end;
            }
            // step past one brace so "{{a {{b}}" still finds {{b}}
            None => pos = start + 1,
        }
    }
    spans
}

/// Replace mapped tokens in a run of text nodes read as one string, so a
/// token split across nodes is still found. Each value lands in the node
/// where its token starts; the rest of the token is removed from the nodes
/// it spilled into. Returns true if anything was replaced.
pub fn replace_across(texts: &mut [String], placeholders: &PlaceholderMap) -> bool {
    let joined = texts.concat();
    let spans = token_spans(&joined, placeholders);
    if spans.is_empty() {
        return false;
    }

    let mut offset = 0;
    for text in texts.iter_mut() {
        let (node_start, node_end) = (offset, offset + text.len());
        offset = node_end;
        let mut out = String::with_capacity(text.len());
        let mut pos = node_start;
        for (span, value) in &spans {
            if span.end <= node_start || span.start >= node_end {
                continue;
            }
            if span.start > pos {
                out.push_str(&joined[pos..span.start]);
            }
            if span.start >= node_start {
                out.push_str(value);
            }
            pos = span.end.min(node_end);
        }
        if pos < node_end {
            out.push_str(&joined[pos..node_end]);
        }
        *text = out;
    }
    true
}

/// Replace every mapped `{{token}}` in `text` in one left-to-right pass.
///
/// Unmapped tokens are copied verbatim. Returns `None` when nothing changed.
pub fn replace_tokens(text: &str, placeholders: &PlaceholderMap) -> Option<String> {
    let mut texts = [text.to_string()];
    if !replace_across(&mut texts, placeholders) {
        return None;
    }
    let [out] = texts;
    Some(out)
}

/// Substitute placeholders in the `w:t` text of every paragraph of a part.
///
/// A paragraph's text nodes are matched as one string, so tokens that Word
/// split across runs are replaced too. Text nodes outside any paragraph are
/// handled on their own. Returns the rewritten part and the number of text
/// nodes changed.
pub fn substitute_placeholders(
    xml: &[u8],
    placeholders: &PlaceholderMap,
) -> Result<(Vec<u8>, usize), ComposeError> {
    let mut reader = reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut buffered: Vec<Event> = Vec::new();
    // text-node slots of each open paragraph, innermost last
    let mut open: Vec<Vec<usize>> = Vec::new();
    let mut in_text = false;
    let mut changed = 0;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match &event {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == b"w:p" => open.push(Vec::new()),
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(text) if in_text && open.is_empty() => {
                let raw = text.unescape().map_err(xml_err)?;
                if let Some(replaced) = replace_tokens(&raw, placeholders) {
                    writer.write_event(escaped_text(&replaced)).map_err(xml_err)?;
                    changed += 1;
                    continue;
                }
            }
            Event::Text(_) if in_text => {
                if let Some(slots) = open.last_mut() {
                    slots.push(buffered.len());
                }
            }
            _ => {}
        }

        if open.is_empty() {
            writer.write_event(event).map_err(xml_err)?;
            continue;
        }
        let closes = matches!(&event, Event::End(e) if e.name().as_ref() == b"w:p");
        buffered.push(event);
        if closes {
            if let Some(slots) = open.pop() {
                changed += replace_in_paragraph(&mut buffered, &slots, placeholders)?;
            }
            if open.is_empty() {
                for e in buffered.drain(..) {
                    writer.write_event(e).map_err(xml_err)?;
                }
            }
        }
    }
    for e in buffered {
        writer.write_event(e).map_err(xml_err)?;
    }

    Ok((writer.into_inner(), changed))
}

/// Rewrite the text events at `slots` with placeholders replaced across
/// them. Returns the number of events changed.
fn replace_in_paragraph(
    events: &mut [Event],
    slots: &[usize],
    placeholders: &PlaceholderMap,
) -> Result<usize, ComposeError> {
    let mut texts = Vec::with_capacity(slots.len());
    for &slot in slots {
        let text = match &events[slot] {
            Event::Text(t) => t.unescape().map_err(xml_err)?.into_owned(),
            _ => String::new(),
        };
        texts.push(text);
    }

    let original = texts.clone();
    if !replace_across(&mut texts, placeholders) {
        return Ok(0);
    }

    let mut changed = 0;
    for ((&slot, text), before) in slots.iter().zip(texts).zip(original) {
        if text != before {
            events[slot] = escaped_text(&text);
            changed += 1;
        }
    }
    Ok(changed)
}

// =========================================================================
// Insertion point
// =========================================================================

/// Remove every occurrence of `marker` from a run of text nodes, including
/// occurrences split across node boundaries. Returns true if any was found.
pub fn strip_marker(texts: &mut [String], marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    let mut found = false;
    loop {
        let joined: String = texts.concat();
        let Some(start) = joined.find(marker) else {
            return found;
        };
        found = true;
        let end = start + marker.len();

        let mut offset = 0;
        for text in texts.iter_mut() {
            let (node_start, node_end) = (offset, offset + text.len());
            offset = node_end;
            let cut_start = start.max(node_start);
            let cut_end = end.min(node_end);
            if cut_start < cut_end {
                text.replace_range(cut_start - node_start..cut_end - node_start, "");
            }
        }
    }
}

/// Where generated content ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Before the first body paragraph that held the marker.
    Marker,
    /// At the end of the body, before its section properties.
    BodyEnd,
}

/// Insert `content` (raw WordprocessingML block markup) into a document part.
///
/// The content goes before the first top-level body paragraph whose text
/// contains `marker`, and the marker is stripped from that paragraph. With no
/// such paragraph the content goes at the end of the body, ahead of the
/// body-level `w:sectPr`.
pub fn insert_content(
    document: &[u8],
    marker: &str,
    content: &str,
) -> Result<(Vec<u8>, InsertionPoint), ComposeError> {
    let mut reader = reader(document);
    let mut writer = Writer::new(Vec::with_capacity(document.len() + content.len()));
    let mut depth = 0usize;
    let mut body_depth: Option<usize> = None;
    let mut inserted: Option<InsertionPoint> = None;
    let mut paragraph: Vec<Event> = Vec::new();
    let mut paragraph_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        if let Event::Eof = event {
            break;
        }

        if !paragraph.is_empty() {
            match &event {
                Event::Start(_) => paragraph_depth += 1,
                Event::End(_) => paragraph_depth -= 1,
                _ => {}
            }
            let closes = paragraph_depth == 0;
            paragraph.push(event);
            if closes {
                depth -= 1;
                let buffered = std::mem::take(&mut paragraph);
                if inserted.is_none() {
                    if let Some(stripped) = strip_paragraph(&buffered, marker)? {
                        writer.get_mut().extend_from_slice(content.as_bytes());
                        inserted = Some(InsertionPoint::Marker);
                        for e in stripped {
                            writer.write_event(e).map_err(xml_err)?;
                        }
                        continue;
                    }
                }
                for e in buffered {
                    writer.write_event(e).map_err(xml_err)?;
                }
            }
            continue;
        }

        let at_body_level = body_depth == Some(depth);
        match &event {
            Event::Start(e) => {
                let name = e.name();
                if at_body_level && name.as_ref() == b"w:p" {
                    depth += 1;
                    paragraph_depth = 1;
                    paragraph.push(event);
                    continue;
                }
                if at_body_level && name.as_ref() == b"w:sectPr" && inserted.is_none() {
                    writer.get_mut().extend_from_slice(content.as_bytes());
                    inserted = Some(InsertionPoint::BodyEnd);
                }
                depth += 1;
                if name.as_ref() == b"w:body" {
                    body_depth = Some(depth);
                }
            }
            Event::Empty(e) => {
                if at_body_level && e.name().as_ref() == b"w:sectPr" && inserted.is_none() {
                    writer.get_mut().extend_from_slice(content.as_bytes());
                    inserted = Some(InsertionPoint::BodyEnd);
                }
            }
            Event::End(e) => {
                if at_body_level && e.name().as_ref() == b"w:body" {
                    if inserted.is_none() {
                        writer.get_mut().extend_from_slice(content.as_bytes());
                        inserted = Some(InsertionPoint::BodyEnd);
                    }
                    body_depth = None;
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        writer.write_event(event).map_err(xml_err)?;
    }

    let point = inserted.ok_or_else(|| {
        ComposeError::InvalidTemplate("document part has no w:body".to_string())
    })?;
    Ok((writer.into_inner(), point))
}

/// If the buffered paragraph contains `marker`, return it with the marker
/// removed from its text nodes.
fn strip_paragraph<'a>(
    events: &[Event<'a>],
    marker: &str,
) -> Result<Option<Vec<Event<'a>>>, ComposeError> {
    let mut text_slots = Vec::new();
    let mut texts = Vec::new();
    let mut in_text = false;
    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::Text(t) if in_text => {
                text_slots.push(i);
                texts.push(t.unescape().map_err(xml_err)?.into_owned());
            }
            _ => {}
        }
    }

    let original = texts.clone();
    if !strip_marker(&mut texts, marker) {
        return Ok(None);
    }

    let mut out = events.to_vec();
    for ((slot, text), before) in text_slots.into_iter().zip(texts).zip(original) {
        if text != before {
            out[slot] = escaped_text(&text);
        }
    }
    Ok(Some(out))
}

// =========================================================================
// Relationships and content types
// =========================================================================

/// `Id` attributes already present in a relationships part.
pub fn relationship_ids(rels: &[u8]) -> Result<HashSet<String>, ComposeError> {
    let mut reader = reader(rels);
    let mut ids = HashSet::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"Id" {
                        ids.insert(String::from_utf8_lossy(&attr.value).into_owned());
                    }
                }
            }
            _ => {}
        }
    }
    Ok(ids)
}

/// An image relationship to add to `word/_rels/document.xml.rels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRelationship {
    pub id: String,
    /// Relative to `word/`, e.g. `media/report_image1.jpeg`.
    pub target: String,
}

fn relationship_markup(relationships: &[ImageRelationship]) -> String {
    relationships
        .iter()
        .map(|rel| {
            format!(
                r#"<Relationship Id="{}" Type="{IMAGE_RELATIONSHIP_TYPE}" Target="{}"/>"#,
                rel.id, rel.target
            )
        })
        .collect()
}

/// Append image relationships to a relationships part, creating the part
/// when the template has none.
pub fn add_relationships(
    rels: Option<&[u8]>,
    relationships: &[ImageRelationship],
) -> Result<Vec<u8>, ComposeError> {
    let markup = relationship_markup(relationships);
    let Some(rels) = rels else {
        return Ok(format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{RELATIONSHIPS_NS}">{markup}</Relationships>"#
        )
        .into_bytes());
    };
    append_before_root_end(rels, b"Relationships", &markup)
}

/// Make sure `[Content_Types].xml` declares a default for `extension`.
pub fn ensure_default_content_type(
    content_types: &[u8],
    extension: &str,
    content_type: &str,
) -> Result<Vec<u8>, ComposeError> {
    let mut reader = reader(content_types);
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Default" => {
                let declared = e.attributes().flatten().any(|attr| {
                    attr.key.as_ref() == b"Extension"
                        && attr.value.eq_ignore_ascii_case(extension.as_bytes())
                });
                if declared {
                    return Ok(content_types.to_vec());
                }
            }
            _ => {}
        }
    }
    let markup = format!(r#"<Default Extension="{extension}" ContentType="{content_type}"/>"#);
    append_before_root_end(content_types, b"Types", &markup)
}

/// Write `markup` as the last children of the root element `root`.
/// A self-closing root is expanded.
fn append_before_root_end(xml: &[u8], root: &[u8], markup: &str) -> Result<Vec<u8>, ComposeError> {
    let mut reader = reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + markup.len()));
    let mut depth = 0usize;
    let mut appended = false;

    loop {
        let event = reader.read_event().map_err(xml_err)?;
        match &event {
            Event::Eof => break,
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if depth == 0 && e.local_name().as_ref() == root && !appended {
                    writer.get_mut().extend_from_slice(markup.as_bytes());
                    appended = true;
                }
            }
            Event::Empty(e) if depth == 0 && e.local_name().as_ref() == root && !appended => {
                let start = e.clone().into_owned();
                let end = start.to_end().into_owned();
                writer.write_event(Event::Start(start)).map_err(xml_err)?;
                writer.get_mut().extend_from_slice(markup.as_bytes());
                writer.write_event(Event::End(end)).map_err(xml_err)?;
                appended = true;
                continue;
            }
            _ => {}
        }
        writer.write_event(event).map_err(xml_err)?;
    }

    if !appended {
        return Err(ComposeError::InvalidTemplate(format!(
            "missing <{}> root element",
            String::from_utf8_lossy(root)
        )));
    }
    Ok(writer.into_inner())
}
