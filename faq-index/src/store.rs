//! On-disk artifact pair: bincode index blob + JSON lookup table.
//!
//! The two files are written together or not at all: both are staged as
//! sibling `*.tmp` files, fsynced, then renamed into place. Loading checks
//! that they still describe the same corpus.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::IndexError;
use crate::index::SimilarityIndex;
use crate::record::{EmbeddingInput, FaqEntry};

/// Bumped whenever the blob layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// Metadata stored in front of the vectors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub format_version: u32,
    pub dim: usize,
    pub len: usize,
    pub embedding_input: EmbeddingInput,
    pub embedding_model: String,
    /// blake3 hex digest of the lookup file bytes.
    pub lookup_checksum: String,
}

#[derive(Serialize)]
struct IndexBlobRef<'a> {
    header: &'a IndexHeader,
    vectors: &'a [f32],
}

#[derive(Deserialize)]
struct IndexBlob {
    header: IndexHeader,
    vectors: Vec<f32>,
}

/// Loaded, immutable FAQ store: similarity index plus aligned lookup table.
#[derive(Clone, Debug)]
pub struct FaqStore {
    header: IndexHeader,
    index: SimilarityIndex,
    lookup: Vec<FaqEntry>,
}

impl FaqStore {
    /// Pairs an index with its lookup table.
    ///
    /// # Errors
    /// [`IndexError::IndexCorrupt`] if the two are not the same length.
    pub fn new(
        index: SimilarityIndex,
        lookup: Vec<FaqEntry>,
        embedding_input: EmbeddingInput,
        embedding_model: impl Into<String>,
    ) -> Result<Self, IndexError> {
        if index.len() != lookup.len() {
            return Err(size_mismatch(index.len(), lookup.len()));
        }
        let header = IndexHeader {
            format_version: FORMAT_VERSION,
            dim: index.dim(),
            len: index.len(),
            embedding_input,
            embedding_model: embedding_model.into(),
            lookup_checksum: checksum(&lookup_bytes(&lookup)?),
        };
        Ok(Self {
            header,
            index,
            lookup,
        })
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn lookup(&self) -> &[FaqEntry] {
        &self.lookup
    }

    pub fn entry(&self, i: usize) -> Option<&FaqEntry> {
        self.lookup.get(i)
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.index.dim()
    }

    /// Loads and cross-checks both artifacts.
    ///
    /// # Errors
    /// - [`IndexError::IndexNotFound`] if either file is absent.
    /// - [`IndexError::IndexCorrupt`] on decode failure, size mismatch,
    ///   header disagreement, or checksum mismatch.
    pub fn load(index_path: &Path, lookup_path: &Path) -> Result<Self, IndexError> {
        for p in [index_path, lookup_path] {
            if !p.exists() {
                return Err(IndexError::IndexNotFound(p.to_path_buf()));
            }
        }

        let index_bytes = fs::read(index_path)?;
        let lookup_raw = fs::read(lookup_path)?;

        let blob: IndexBlob = bincode::deserialize(&index_bytes)
            .map_err(|e| IndexError::IndexCorrupt(format!("index blob: {e}")))?;
        let header = blob.header;
        if header.format_version != FORMAT_VERSION {
            return Err(IndexError::IndexCorrupt(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                header.format_version
            )));
        }

        let index = SimilarityIndex::from_flat(header.dim, blob.vectors)?;
        if index.len() != header.len {
            return Err(IndexError::IndexCorrupt(format!(
                "header records {} vectors but blob holds {}",
                header.len,
                index.len()
            )));
        }

        let lookup: Vec<FaqEntry> = serde_json::from_slice(&lookup_raw)
            .map_err(|e| IndexError::IndexCorrupt(format!("lookup table: {e}")))?;
        if lookup.len() != index.len() {
            return Err(size_mismatch(index.len(), lookup.len()));
        }
        if checksum(&lookup_raw) != header.lookup_checksum {
            return Err(IndexError::IndexCorrupt(
                "lookup table checksum does not match the index header".into(),
            ));
        }

        info!(
            entries = lookup.len(),
            dim = header.dim,
            embedding_input = %header.embedding_input,
            model = %header.embedding_model,
            "FAQ index loaded"
        );
        Ok(Self {
            header,
            index,
            lookup,
        })
    }

    /// Writes both artifacts atomically (both or neither).
    ///
    /// # Errors
    /// I/O or encoding failures; in that case no new artifact is left behind.
    pub fn persist(&self, index_path: &Path, lookup_path: &Path) -> Result<(), IndexError> {
        let lookup_raw = lookup_bytes(&self.lookup)?;
        let index_raw = bincode::serialize(&IndexBlobRef {
            header: &self.header,
            vectors: self.index.as_flat(),
        })
        .map_err(|e| IndexError::Parse(format!("encode index blob: {e}")))?;

        let index_tmp = tmp_path(index_path);
        let lookup_tmp = tmp_path(lookup_path);

        let result = write_pair(
            (index_tmp.as_path(), index_raw.as_slice(), index_path),
            (lookup_tmp.as_path(), lookup_raw.as_slice(), lookup_path),
        );
        if let Err(e) = &result {
            warn!(error = %e, "persist failed; removing staged artifacts");
            let _ = fs::remove_file(&index_tmp);
            let _ = fs::remove_file(&lookup_tmp);
        } else {
            info!(
                index = ?index_path,
                lookup = ?lookup_path,
                entries = self.len(),
                "FAQ index persisted"
            );
        }
        result
    }
}

type Staged<'a> = (&'a Path, &'a [u8], &'a Path);

fn write_pair(index: Staged<'_>, lookup: Staged<'_>) -> Result<(), IndexError> {
    for (tmp, bytes, dest) in [index, lookup] {
        if let Some(dir) = dest.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        write_synced(tmp, bytes)?;
    }

    fs::rename(lookup.0, lookup.2)?;
    if let Err(e) = fs::rename(index.0, index.2) {
        // Do not leave a lookup table next to a stale index.
        let _ = fs::remove_file(lookup.2);
        return Err(e.into());
    }
    debug!("artifacts renamed into place");
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), IndexError> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

fn lookup_bytes(lookup: &[FaqEntry]) -> Result<Vec<u8>, IndexError> {
    serde_json::to_vec_pretty(lookup).map_err(|e| IndexError::Parse(e.to_string()))
}

fn checksum(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

fn size_mismatch(vectors: usize, entries: usize) -> IndexError {
    IndexError::IndexCorrupt(format!(
        "index holds {vectors} vectors but lookup table holds {entries} entries"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> FaqStore {
        let mut idx = SimilarityIndex::new(2);
        idx.add(&[0.1, 0.2]).unwrap();
        idx.add(&[0.3, 0.4]).unwrap();
        let lookup = vec![
            FaqEntry {
                question: "What is COVID-19?".into(),
                answer: "A viral respiratory illness.".into(),
            },
            FaqEntry {
                question: "How does it spread?".into(),
                answer: "Through respiratory droplets.".into(),
            },
        ];
        FaqStore::new(idx, lookup, EmbeddingInput::QuestionAndAnswer, "test-model").unwrap()
    }

    #[test]
    fn persist_then_load_keeps_alignment() {
        let dir = tempdir().unwrap();
        let ip = dir.path().join("data/faq_index.bin");
        let lp = dir.path().join("data/faq_data.json");

        let store = sample();
        store.persist(&ip, &lp).unwrap();
        assert!(!tmp_path(&ip).exists());
        assert!(!tmp_path(&lp).exists());

        let loaded = FaqStore::load(&ip, &lp).unwrap();
        assert_eq!(loaded.len(), loaded.index().len());
        assert_eq!(loaded.header(), store.header());
        assert_eq!(loaded.index(), store.index());
        assert_eq!(loaded.entry(1).unwrap().question, "How does it spread?");
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let dir = tempdir().unwrap();
        let ip = dir.path().join("faq_index.bin");
        let lp = dir.path().join("faq_data.json");
        sample().persist(&ip, &lp).unwrap();
        fs::remove_file(&lp).unwrap();

        let err = FaqStore::load(&ip, &lp).unwrap_err();
        assert!(matches!(err, IndexError::IndexNotFound(p) if p == lp));
    }

    #[test]
    fn shortened_lookup_is_corrupt() {
        let dir = tempdir().unwrap();
        let ip = dir.path().join("faq_index.bin");
        let lp = dir.path().join("faq_data.json");
        let store = sample();
        store.persist(&ip, &lp).unwrap();

        let one = serde_json::to_vec_pretty(&store.lookup()[..1]).unwrap();
        fs::write(&lp, one).unwrap();
        let err = FaqStore::load(&ip, &lp).unwrap_err();
        assert!(matches!(err, IndexError::IndexCorrupt(msg) if msg.contains("2 vectors")));
    }

    #[test]
    fn edited_lookup_fails_checksum() {
        let dir = tempdir().unwrap();
        let ip = dir.path().join("faq_index.bin");
        let lp = dir.path().join("faq_data.json");
        let store = sample();
        store.persist(&ip, &lp).unwrap();

        let mut edited = store.lookup().to_vec();
        edited[0].answer = "Something else.".into();
        fs::write(&lp, serde_json::to_vec_pretty(&edited).unwrap()).unwrap();
        let err = FaqStore::load(&ip, &lp).unwrap_err();
        assert!(matches!(err, IndexError::IndexCorrupt(msg) if msg.contains("checksum")));
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let dir = tempdir().unwrap();
        let ip = dir.path().join("faq_index.bin");
        let lp = dir.path().join("faq_data.json");
        sample().persist(&ip, &lp).unwrap();

        let bytes = fs::read(&ip).unwrap();
        fs::write(&ip, &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(
            FaqStore::load(&ip, &lp),
            Err(IndexError::IndexCorrupt(_))
        ));
    }

    #[test]
    fn failed_persist_leaves_nothing() {
        let dir = tempdir().unwrap();
        // A directory where the index file should go makes the final rename fail.
        let ip = dir.path().join("faq_index.bin");
        fs::create_dir_all(ip.join("occupied")).unwrap();
        let lp = dir.path().join("faq_data.json");

        assert!(sample().persist(&ip, &lp).is_err());
        assert!(!lp.exists());
        assert!(!tmp_path(&ip).exists());
        assert!(!tmp_path(&lp).exists());
    }

    #[test]
    fn new_rejects_unaligned_pair() {
        let idx = SimilarityIndex::new(2);
        let lookup = vec![FaqEntry {
            question: "q".into(),
            answer: "a".into(),
        }];
        assert!(FaqStore::new(idx, lookup, EmbeddingInput::Question, "m").is_err());
    }
}
