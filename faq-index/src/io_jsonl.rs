//! Corpus reader: one `{ "question": ..., "answer": ... }` object per line.

use std::io::{BufRead, BufReader};
use std::{fs::File, path::Path};

use tracing::{debug, info};

use crate::errors::IndexError;
use crate::record::CorpusRow;

/// Reads corpus rows strictly.
///
/// - Empty lines are skipped.
/// - `null`/missing fields deserialize to `None`; filtering happens in the builder.
/// - Any malformed line fails the whole read with its 1-based line number.
///
/// # Errors
/// - [`IndexError::Io`] if the file cannot be read.
/// - [`IndexError::Parse`] if a line is not a valid row.
pub fn read_corpus(jsonl_path: impl AsRef<Path>) -> Result<Vec<CorpusRow>, IndexError> {
    info!("Reading FAQ corpus: {:?}", jsonl_path.as_ref());

    let file = File::open(jsonl_path.as_ref())?;
    parse_corpus(BufReader::new(file))
}

/// Same as [`read_corpus`] over any buffered reader.
pub fn parse_corpus(reader: impl BufRead) -> Result<Vec<CorpusRow>, IndexError> {
    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let row: CorpusRow = serde_json::from_str(&line)
            .map_err(|e| IndexError::Parse(format!("line {} parse error: {}", i + 1, e)))?;
        out.push(row);
    }

    debug!("Loaded {} corpus rows", out.len());
    Ok(out)
}
