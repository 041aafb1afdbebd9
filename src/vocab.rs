//! The vocabulary file: an ordered `token count` list, one line per word,
//! most frequent first. Building this file from raw text is an external
//! collaborator's job; this module only loads it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, TrainerError};

pub struct Vocabulary {
    words: Vec<String>,
}

impl Vocabulary {
    /// Load `token<SP>count` lines from `path`. Fails if any line is
    /// malformed, or if the vocabulary contains the literal token `<unk>`
    /// (reserved for the synthesized unknown-word entry at export time).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Vocabulary> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TrainerError::io(path, e))?;
        Self::load_from_reader(BufReader::new(file), path)
    }

    pub(crate) fn load_from_reader(reader: impl BufRead, path: &Path) -> Result<Vocabulary> {
        let mut words = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| TrainerError::io(path, e))?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let word = parts.next().ok_or_else(|| {
                TrainerError::format(path, format!("line {}: missing token", line_no + 1))
            })?;
            let count = parts.next().ok_or_else(|| {
                TrainerError::format(path, format!("line {}: missing count", line_no + 1))
            })?;
            count.parse::<u64>().map_err(|_| {
                TrainerError::format(
                    path,
                    format!(
                        "line {}: count '{count}' is not a non-negative integer",
                        line_no + 1
                    ),
                )
            })?;

            if word == "<unk>" {
                return Err(TrainerError::format(
                    path,
                    "vocabulary must not contain the reserved token '<unk>'",
                ));
            }

            words.push(word.to_string());
        }

        if words.is_empty() {
            return Err(TrainerError::format(path, "vocabulary is empty"));
        }

        Ok(Vocabulary { words })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Look up a word by its 1-based frequency rank.
    pub fn word(&self, id: u32) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.words.get(id as usize - 1).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn load(text: &str) -> Result<Vocabulary> {
        Vocabulary::load_from_reader(text.as_bytes(), &PathBuf::from("<test>"))
    }

    #[test]
    fn loads_words_in_file_order() {
        let vocab = load("the 100\ncat 50\n").unwrap();
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.word(1), Some("the"));
        assert_eq!(vocab.word(2), Some("cat"));
    }

    #[test]
    fn rejects_unk_token() {
        let err = load("<unk> 1\n").unwrap_err();
        assert!(matches!(err, TrainerError::Format { .. }));
    }

    #[test]
    fn ignores_blank_lines() {
        let vocab = load("the 100\n\ncat 50\n").unwrap();
        assert_eq!(vocab.len(), 2);
    }

    #[test]
    fn rejects_missing_count() {
        let err = load("the\n").unwrap_err();
        assert!(matches!(err, TrainerError::Format { .. }));
    }
}
