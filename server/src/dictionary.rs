//! Word selection for new rounds

use log::{info, warn};
use rand::seq::SliceRandom;
use shared::MAX_WORD;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read dictionary {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dictionary {path} contains no usable words")]
    Empty { path: PathBuf },
}

/// Source of target words. Implementations never run dry: once every word
/// has been handed out they start over.
pub trait WordSource: Send {
    fn next_word(&mut self) -> String;
}

/// In-memory word list that rewinds when exhausted
#[derive(Debug)]
pub struct WordList {
    words: Vec<String>,
    cursor: usize,
    shuffle: bool,
}

impl WordList {
    /// Loads one word per line, shuffled.
    ///
    /// Blank lines, words with anything but ASCII letters and words longer
    /// than `MAX_WORD` are skipped. Upper case is folded so every word can
    /// be guessed with lowercase letters.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| DictionaryError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let words = parse_words(&contents);
        if words.is_empty() {
            return Err(DictionaryError::Empty {
                path: path.to_path_buf(),
            });
        }

        info!("Loaded {} words from {}", words.len(), path.display());
        let mut list = Self {
            words,
            cursor: 0,
            shuffle: true,
        };
        list.rewind();
        Ok(list)
    }

    /// Hands out `words` in the given order, cycling forever
    pub fn sequential<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
            cursor: 0,
            shuffle: false,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        if self.shuffle {
            self.words.shuffle(&mut rand::thread_rng());
        }
    }
}

impl WordSource for WordList {
    fn next_word(&mut self) -> String {
        if self.cursor >= self.words.len() {
            self.rewind();
        }
        match self.words.get(self.cursor) {
            Some(word) => {
                self.cursor += 1;
                word.clone()
            }
            // Only reachable through `sequential` with no words at all
            None => String::new(),
        }
    }
}

fn parse_words(contents: &str) -> Vec<String> {
    let mut skipped = 0;
    let words: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let usable = line.len() <= MAX_WORD && line.bytes().all(|b| b.is_ascii_alphabetic());
            if usable {
                Some(line.to_ascii_lowercase())
            } else {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        warn!("Skipped {} unusable dictionary entries", skipped);
    }
    words
}
