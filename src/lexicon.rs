//! Pronunciation lexicon loaded from a directory of plain-text files.
//!
//! Each line is `<word-or-phrase> <phonetic-code>`: the last whitespace
//! delimited field is the code, everything before it is joined with single
//! spaces and lower-cased to form the key.

use crate::error::{MausError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Which definition survives when two entries share a key.
///
/// Files are always read in sorted file-name order, so either policy is
/// reproducible across platforms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// A later line (or a later file) overwrites an earlier definition.
    #[default]
    LastWins,
    /// The first definition is kept; later ones are ignored.
    FirstWins,
}

/// Mapping from normalized orthography to a single phonetic code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexicon {
    entries: HashMap<String, String>,
    collisions: usize,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every regular, non-hidden file directly inside `dir`.
    pub fn load(dir: &Path, policy: MergePolicy) -> Result<Self> {
        let files = lexicon_files(dir)?;
        let mut lexicon = Self::new();

        for path in &files {
            let file = fs::File::open(path)?;
            let before = lexicon.len();
            lexicon.merge_reader(file, &path.display().to_string(), policy)?;
            tracing::debug!(
                file = %path.display(),
                added = lexicon.len() - before,
                "loaded lexicon file"
            );
        }

        tracing::debug!(
            dir = %dir.display(),
            files = files.len(),
            entries = lexicon.len(),
            collisions = lexicon.collisions,
            "lexicon ready"
        );
        Ok(lexicon)
    }

    /// Build a lexicon from a single reader, e.g. an in-memory buffer.
    ///
    /// `source` only appears in error messages.
    pub fn from_reader<R: Read>(reader: R, source: &str, policy: MergePolicy) -> Result<Self> {
        let mut lexicon = Self::new();
        lexicon.merge_reader(reader, source, policy)?;
        Ok(lexicon)
    }

    fn merge_reader<R: Read>(&mut self, reader: R, source: &str, policy: MergePolicy) -> Result<()> {
        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line.map_err(|e| {
                if e.kind() == std::io::ErrorKind::InvalidData {
                    MausError::LexiconEncoding {
                        path: source.to_string(),
                        line: idx + 1,
                    }
                } else {
                    MausError::Io(e)
                }
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let (key, code) = parse_line(&line).ok_or_else(|| MausError::LexiconMalformed {
                path: source.to_string(),
                line: idx + 1,
                content: line.clone(),
            })?;
            self.merge_entry(key, code, policy);
        }
        Ok(())
    }

    fn merge_entry(&mut self, key: String, code: String, policy: MergePolicy) {
        match self.entries.get_mut(&key) {
            Some(existing) => {
                self.collisions += 1;
                tracing::debug!(key = %key, kept = ?policy, "lexicon key collision");
                if policy == MergePolicy::LastWins {
                    *existing = code;
                }
            }
            None => {
                self.entries.insert(key, code);
            }
        }
    }

    /// Insert or replace an entry. The key is normalized like a file entry.
    pub fn insert(&mut self, key: &str, code: impl Into<String>) {
        self.entries.insert(normalize_key(key), code.into());
    }

    /// Look up an already-normalized token.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of duplicate keys seen while loading.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Tokens without an entry, in order of first appearance, without repeats.
    pub fn missing<'a, I>(&self, tokens: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut missing: Vec<String> = Vec::new();
        for token in tokens {
            if !self.contains(token) && !missing.iter().any(|m| m == token) {
                missing.push(token.to_string());
            }
        }
        missing
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Lexicon {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut lexicon = Self::new();
        for (key, code) in iter {
            lexicon.insert(key.as_ref(), code);
        }
        lexicon
    }
}

/// Split a lexicon line into `(key, code)`; `None` with fewer than two fields.
fn parse_line(line: &str) -> Option<(String, String)> {
    let mut fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return None;
    }
    let code = fields.pop()?.to_string();
    Some((fields.join(" ").to_lowercase(), code))
}

fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Regular non-hidden files in `dir`, sorted by file name.
fn lexicon_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MausError::LexiconNotFound {
                path: dir.display().to_string(),
            }
        } else {
            MausError::Io(e)
        }
    })?;

    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        // fs::metadata follows symlinks, so a link to a file counts as a file
        if fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
