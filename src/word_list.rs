//! Load and preprocess the word list.
//!
//! A word-list file holds one candidate word per line. Lines are trimmed,
//! blank lines and `#` comments are skipped, and lines containing anything
//! other than ASCII letters are skipped as well. Words are lowercased,
//! deduplicated, and sorted by length first, then alphabetically, so that
//! domain initialization and the solver's value ordering always see the same
//! input regardless of how the file was written.

/// A processed, ready-to-use word list.
#[derive(Debug, Clone)]
pub struct WordList {
    /// Lowercase words, deduplicated, sorted by (length, alphabetical).
    pub words: Vec<String>,
}

impl WordList {
    /// Parse a raw word list from an in-memory string.
    ///
    /// Parsing is total: malformed lines are skipped, never fatal.
    #[must_use]
    pub fn parse_from_str(contents: &str) -> WordList {
        let mut words: Vec<String> = contents
            .lines()
            .filter_map(|raw_line| {
                let line = raw_line.trim();
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }
                if !line.chars().all(|c| c.is_ascii_alphabetic()) {
                    log::debug!("skipping non-alphabetic word list line: {line:?}");
                    return None;
                }
                Some(line.to_ascii_lowercase())
            })
            .collect();

        // dedup() only removes adjacent duplicates, so sort alphabetically
        // first, then re-sort into the final (length, alphabetical) order.
        words.sort();
        words.dedup();
        words.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        WordList { words }
    }

    /// Read a word list from a file path and parse it.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if unable to read a file at `path`.
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> std::io::Result<WordList> {
        let path_ref = path.as_ref();
        let data = std::fs::read_to_string(path_ref).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("failed to read word list from '{}': {}", path_ref.display(), e),
            )
        })?;
        Ok(Self::parse_from_str(&data))
    }
}
