use quick_xml::events::Event;
use std::collections::HashMap;
use std::path::Path;

use docrag_core::Result;

use crate::ooxml::{attr, entry_reader, local_name, open_archive, read_entry_to_string, xml_error, Archive};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Text of every text-bearing top-level shape, slide by slide, newline-joined.
pub fn extract_pptx(path: &Path) -> Result<String> {
    let mut archive = open_archive(path)?;
    let slides = slide_parts(&mut archive, path)?;

    let mut shapes = Vec::new();
    for slide in &slides {
        shapes.extend(slide_shape_texts(&mut archive, slide, path)?);
    }
    Ok(shapes.join("\n"))
}

/// Slide part names in presentation order. Falls back to numeric file order
/// when the presentation part has no usable slide list.
fn slide_parts(archive: &mut Archive, path: &Path) -> Result<Vec<String>> {
    let ordered = ordered_slide_parts(archive, path).unwrap_or_default();
    if !ordered.is_empty() {
        return Ok(ordered);
    }

    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let n = name.strip_prefix("ppt/slides/slide")?.strip_suffix(".xml")?.parse().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    numbered.sort();
    Ok(numbered.into_iter().map(|(_, name)| name).collect())
}

fn ordered_slide_parts(archive: &mut Archive, path: &Path) -> Result<Vec<String>> {
    let rels_xml = read_entry_to_string(archive, PRESENTATION_RELS, path)?;
    let mut targets = HashMap::new();
    let mut reader = quick_xml::Reader::from_str(&rels_xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) if local_name(e) == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(e, b"Id"), attr(e, b"Target")) {
                    targets.insert(id, resolve_target(&target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, PRESENTATION_RELS, e)),
            _ => {}
        }
    }

    let presentation_xml = read_entry_to_string(archive, PRESENTATION_PART, path)?;
    let mut reader = quick_xml::Reader::from_str(&presentation_xml);
    let mut parts = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) if local_name(e) == b"sldId" => {
                if let Some(part) = attr(e, b"r:id").and_then(|rid| targets.get(&rid)) {
                    parts.push(part.clone());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, PRESENTATION_PART, e)),
            _ => {}
        }
    }
    Ok(parts)
}

/// Relationship targets are relative to `ppt/`.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{target}"),
    }
}

/// One string per `p:sp` directly under the slide's shape tree that has a
/// text body; its paragraphs joined by newlines.
fn slide_shape_texts(archive: &mut Archive, part: &str, path: &Path) -> Result<Vec<String>> {
    let mut reader = entry_reader(archive, part, path)?;
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut texts = Vec::new();
    let mut shape: Option<ShapeText> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e);
                if name == b"sp" && parent_is(&stack, b"spTree") {
                    shape = Some(ShapeText::default());
                } else if let Some(s) = shape.as_mut() {
                    match name.as_slice() {
                        b"txBody" => s.has_body = true,
                        b"p" if parent_is(&stack, b"txBody") => s.paragraphs.push(String::new()),
                        _ => {}
                    }
                }
                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(s) = shape.as_mut() {
                    match local_name(e).as_slice() {
                        b"txBody" => s.has_body = true,
                        b"p" if parent_is(&stack, b"txBody") => s.paragraphs.push(String::new()),
                        b"br" if parent_is(&stack, b"p") => s.push_str("\n"),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => {
                let name = stack.pop().unwrap_or_default();
                if name == b"sp" && parent_is(&stack, b"spTree") {
                    if let Some(s) = shape.take().filter(|s| s.has_body) {
                        texts.push(s.paragraphs.join("\n"));
                    }
                }
            }
            Ok(Event::Text(ref t)) => {
                if let Some(s) = shape.as_mut() {
                    if parent_is(&stack, b"t") {
                        let text = t.unescape().map_err(|e| xml_error(path, part, e))?;
                        s.push_str(&text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, part, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(texts)
}

#[derive(Default)]
struct ShapeText {
    has_body: bool,
    paragraphs: Vec<String>,
}

impl ShapeText {
    fn push_str(&mut self, s: &str) {
        if let Some(last) = self.paragraphs.last_mut() {
            last.push_str(s);
        }
    }
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().is_some_and(|n| n == name)
}
