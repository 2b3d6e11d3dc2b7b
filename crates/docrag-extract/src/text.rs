use std::fs;
use std::path::Path;

use docrag_core::{Error, Result};

/// Whole file as text; bytes that are not UTF-8 are replaced, not rejected.
pub fn extract_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => {
            let bytes = fs::read(path).map_err(|e| Error::extraction(path.display().to_string(), e))?;
            Ok(String::from_utf8_lossy(&bytes).to_string())
        }
    }
}
