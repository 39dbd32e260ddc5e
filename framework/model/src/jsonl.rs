use std::io::BufRead as _;

/// Reads JSON Lines input, one value per non-blank line.
///
/// Used for replaying recorded collector payloads and for loading views written by the JSONL
/// reporter.
#[derive(Debug, Default)]
pub struct JsonlReader;

impl JsonlReader {
    pub fn parse<R, T>(&self, reader: R) -> Result<Vec<T>, JsonlError>
    where
        R: std::io::Read,
        T: serde::de::DeserializeOwned,
    {
        let mut results = Vec::new();
        for (index, line) in std::io::BufReader::new(reader).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value = serde_json::from_str(&line).map_err(|source| JsonlError::Entry {
                line: index + 1,
                source,
            })?;
            results.push(value);
        }
        Ok(results)
    }

    pub fn parse_from_file<P, T>(&self, path: P) -> Result<Vec<T>, JsonlError>
    where
        P: AsRef<std::path::Path>,
        T: serde::de::DeserializeOwned,
    {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let entries: Vec<T> = self.parse(file)?;
        log::debug!("Read {} entries from {}", entries.len(), path.display());
        Ok(entries)
    }
}

/// An error type for [`JsonlReader::parse`].
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid entry on line {line}: {source}")]
    Entry {
        line: usize,
        source: serde_json::Error,
    },
}
