//! Shared plumbing for the ZIP + XML office formats.

use quick_xml::events::BytesStart;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

use docrag_core::{Error, Result};

pub(crate) type Archive = ZipArchive<BufReader<File>>;

pub(crate) fn open_archive(path: &Path) -> Result<Archive> {
    let file = File::open(path).map_err(|e| Error::extraction(path.display().to_string(), e))?;
    ZipArchive::new(BufReader::new(file))
        .map_err(|e| Error::extraction(path.display().to_string(), format!("not a valid ZIP container: {e}")))
}

/// A streaming XML reader over one archive member.
pub(crate) fn entry_reader<'a>(
    archive: &'a mut Archive,
    name: &str,
    path: &Path,
) -> Result<quick_xml::Reader<BufReader<impl Read + 'a>>> {
    let entry = archive
        .by_name(name)
        .map_err(|_| Error::extraction(path.display().to_string(), format!("missing {name}")))?;
    Ok(quick_xml::Reader::from_reader(BufReader::new(entry)))
}

pub(crate) fn read_entry_to_string(archive: &mut Archive, name: &str, path: &Path) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|_| Error::extraction(path.display().to_string(), format!("missing {name}")))?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| Error::extraction(path.display().to_string(), format!("failed to read {name}: {e}")))?;
    Ok(xml)
}

/// Element name without its namespace prefix.
pub(crate) fn local_name(e: &BytesStart<'_>) -> Vec<u8> {
    e.local_name().as_ref().to_vec()
}

/// Value of the attribute with the qualified name `key` (e.g. `r:id`).
pub(crate) fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

pub(crate) fn xml_error(path: &Path, part: &str, err: impl std::fmt::Display) -> Error {
    Error::extraction(path.display().to_string(), format!("XML parse error in {part}: {err}"))
}
