use std::{collections::HashSet, fs, path::Path};

use anyhow::{Context, Result};

/// Text transform applied to user-authored text before it leaves the client.
pub trait ProfanityFilter: Send + Sync {
    fn clean(&self, text: &str) -> String;
}

pub struct PassthroughFilter;

impl ProfanityFilter for PassthroughFilter {
    fn clean(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Masks whole words found in a word list, one `*` per character.
#[derive(Debug, Clone, Default)]
pub struct WordListFilter {
    words: HashSet<String>,
}

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        Self { words }
    }

    /// One word per line; blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read word list {}", path.display()))?;
        Ok(Self::new(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        ))
    }

    fn flush_word(&self, word: &mut String, out: &mut String) {
        if word.is_empty() {
            return;
        }
        if self.words.contains(&word.to_lowercase()) {
            out.extend(std::iter::repeat('*').take(word.chars().count()));
        } else {
            out.push_str(word);
        }
        word.clear();
    }
}

impl ProfanityFilter for WordListFilter {
    fn clean(&self, text: &str) -> String {
        if self.words.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut word = String::new();
        for ch in text.chars() {
            if ch.is_alphanumeric() {
                word.push(ch);
            } else {
                self.flush_word(&mut word, &mut out);
                out.push(ch);
            }
        }
        self.flush_word(&mut word, &mut out);
        out
    }
}
