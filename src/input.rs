use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use noodles::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Open a text input, decompressing by extension (.gz via flate2, .bgz via BGZF)
pub fn open_text_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    // Check by file extension (faster than reading magic bytes)
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match ext {
        "bgz" => Ok(Box::new(BufReader::new(bgzf::io::reader::Reader::new(file)))),
        "gz" => Ok(Box::new(BufReader::new(MultiGzDecoder::new(file)))),
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

/// Split a record line into fields: tabs when present, any whitespace otherwise
pub fn split_fields(line: &str) -> Vec<&str> {
    if line.contains('\t') {
        line.split('\t').map(|f| f.trim()).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// True for blank lines and `#` comments
pub fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}
