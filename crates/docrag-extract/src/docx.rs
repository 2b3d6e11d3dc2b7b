use quick_xml::events::Event;
use std::path::Path;

use docrag_core::Result;

use crate::ooxml::{entry_reader, local_name, open_archive, xml_error};

const DOCUMENT_PART: &str = "word/document.xml";

/// Body paragraphs in document order, newline-joined. Empty paragraphs stay
/// as empty lines; paragraphs nested in tables or text boxes are not body
/// paragraphs.
pub fn extract_docx(path: &Path) -> Result<String> {
    let mut archive = open_archive(path)?;
    let mut reader = entry_reader(&mut archive, DOCUMENT_PART, path)?;

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_body_paragraph = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = local_name(e);
                if name == b"p" && parent_is(&stack, b"body") {
                    in_body_paragraph = true;
                    current.clear();
                } else if in_body_paragraph && parent_is(&stack, b"r") && paragraph_depth(&stack) == 1 {
                    push_run_break(&name, &mut current);
                }
                stack.push(name);
            }
            Ok(Event::Empty(ref e)) => {
                let name = local_name(e);
                if name == b"p" && parent_is(&stack, b"body") {
                    paragraphs.push(String::new());
                } else if in_body_paragraph && parent_is(&stack, b"r") && paragraph_depth(&stack) == 1 {
                    push_run_break(&name, &mut current);
                }
            }
            Ok(Event::End(_)) => {
                let name = stack.pop().unwrap_or_default();
                if name == b"p" && in_body_paragraph && parent_is(&stack, b"body") {
                    paragraphs.push(std::mem::take(&mut current));
                    in_body_paragraph = false;
                }
            }
            Ok(Event::Text(ref t)) => {
                if in_body_paragraph && is_run_text(&stack) && paragraph_depth(&stack) == 1 {
                    let text = t.unescape().map_err(|e| xml_error(path, DOCUMENT_PART, e))?;
                    current.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, DOCUMENT_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs.join("\n"))
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().is_some_and(|n| n == name)
}

/// Open `w:p` elements; more than one means a text box inside a paragraph.
fn paragraph_depth(stack: &[Vec<u8>]) -> usize {
    stack.iter().filter(|n| n.as_slice() == b"p").count()
}

/// `w:t` directly under a run.
fn is_run_text(stack: &[Vec<u8>]) -> bool {
    let n = stack.len();
    n >= 2 && stack[n - 1] == b"t" && stack[n - 2] == b"r"
}

fn push_run_break(name: &[u8], out: &mut String) {
    match name {
        b"tab" => out.push('\t'),
        b"br" | b"cr" => out.push('\n'),
        _ => {}
    }
}
