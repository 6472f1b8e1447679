//! Transcript to BPF compilation.
//!
//! A BPF document as consumed by MAUS here is two blocks of records:
//!
//! ```text
//! ORT: 0 hello
//! ORT: 1 world
//! KAN: 0 h6`l@}
//! KAN: 1 w3:ld
//! ```
//!
//! The ORT block lists the orthographic words and the KAN block their
//! canonical pronunciations, both indexed from zero in transcript order.

use crate::error::{MausError, Result};
use crate::lexicon::Lexicon;
use std::fmt;

/// Characters that separate words besides whitespace.
const WORD_SEPARATORS: &[char] = &['.', ',', '!', '?', '"', '-'];

/// Split a transcript into lower-cased word tokens.
///
/// Splits on whitespace and `. , ! ? " -`, dropping empty pieces.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || WORD_SEPARATORS.contains(&c))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// One transcript token with its pronunciation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BpfEntry {
    pub word: String,
    pub pronunciation: String,
}

/// A compiled BPF document. Entry position is the BPF index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BpfDocument {
    entries: Vec<BpfEntry>,
}

impl BpfDocument {
    /// Look up every token in `lexicon`. Fails on the first missing token.
    pub fn build<S: AsRef<str>>(tokens: &[S], lexicon: &Lexicon) -> Result<Self> {
        let entries = tokens
            .iter()
            .map(|token| {
                let word = token.as_ref();
                lexicon
                    .get(word)
                    .map(|pronunciation| BpfEntry {
                        word: word.to_string(),
                        pronunciation: pronunciation.to_string(),
                    })
                    .ok_or_else(|| MausError::IncompleteLexicon {
                        word: word.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[BpfEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for BpfDocument {
    /// ORT block, one newline, KAN block. No trailing newline; an empty
    /// document renders as a single newline.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ort: Vec<String> = self
            .entries
            .iter()
            .enumerate()
            .map(|(n, e)| format!("ORT: {} {}", n, e.word))
            .collect();
        let kan: Vec<String> = self
            .entries
            .iter()
            .enumerate()
            .map(|(n, e)| format!("KAN: {} {}", n, e.pronunciation))
            .collect();

        write!(f, "{}\n{}", ort.join("\n"), kan.join("\n"))
    }
}

/// Tokenize `text` and render it as BPF using `lexicon`.
///
/// All-or-nothing: a token without a lexicon entry yields
/// `MausError::IncompleteLexicon` and no output.
pub fn compile(text: &str, lexicon: &Lexicon) -> Result<String> {
    let tokens = tokenize(text);
    let doc = BpfDocument::build(&tokens, lexicon)?;
    Ok(doc.to_string())
}
