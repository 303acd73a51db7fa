use crate::error::OllamaApiError;
use crate::payload::GenerateChunk;

/// Incremental parser for newline-delimited JSON generate streams.
///
/// Bytes arrive in arbitrary slices; `feed` buffers partial lines and drains
/// every record whose line is complete. A malformed complete record is a
/// decode failure, terminal for the stream: callers must not feed further
/// bytes after an error.
#[derive(Debug, Default)]
pub struct NdjsonStreamParser {
    buffer: String,
}

impl NdjsonStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete records.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<GenerateChunk>, OllamaApiError> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut chunks = Vec::new();

        while let Some(split) = self.buffer.find('\n') {
            let line = self.buffer[..split].trim().to_string();
            self.buffer.drain(0..=split);

            if line.is_empty() {
                continue;
            }

            chunks.push(decode_record(&line)?);
        }

        Ok(chunks)
    }

    /// Drain a trailing record whose line was never newline-terminated.
    pub fn finish(&mut self) -> Result<Option<GenerateChunk>, OllamaApiError> {
        let line = std::mem::take(&mut self.buffer);
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        decode_record(line).map(Some)
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn decode_record(line: &str) -> Result<GenerateChunk, OllamaApiError> {
    serde_json::from_str::<GenerateChunk>(line).map_err(|source| OllamaApiError::Decode {
        record: line.to_string(),
        source,
    })
}
