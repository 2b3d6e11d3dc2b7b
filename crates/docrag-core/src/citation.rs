//! Mapping `[n]` markers in a generated answer back to retrieved documents.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::types::RetrievedDocument;

fn marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([0-9]+)\]").expect("static citation pattern"))
}

/// Every bracketed integer in `answer`, in order of appearance, duplicates
/// included. Numbers too large for `usize` are dropped.
pub fn extract_markers(answer: &str) -> Vec<usize> {
    marker_regex()
        .captures_iter(answer)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect()
}

/// Documents cited by `answer`, deduplicated, in first-citation order.
/// Markers that match no document id are ignored.
pub fn resolve_citations<'a>(answer: &str, docs: &'a [RetrievedDocument]) -> Vec<&'a RetrievedDocument> {
    let mut seen = HashSet::new();
    extract_markers(answer)
        .into_iter()
        .filter(|id| seen.insert(*id))
        .filter_map(|id| docs.iter().find(|d| d.id == id))
        .collect()
}
