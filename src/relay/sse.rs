//! SSE line handling for the agent-service stream.
//!
//! Each event arrives as a `data: <json>` line. Blank lines and lines
//! without the marker are ignored, and a malformed line is skipped without
//! ending the stream - one bad event must not abort the whole relay.

use serde::Deserialize;

/// One streamed message chunk from the agent service.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageChunk {
    /// True while the turn is still in progress; finalized turns repeat the
    /// accumulated text and are not re-emitted.
    #[serde(default)]
    pub partial: bool,
    #[serde(default)]
    pub content: ChunkContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkContent {
    #[serde(default)]
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextPart {
    pub text: String,
}

impl MessageChunk {
    /// The chunk's text fragments, in order.
    pub fn into_texts(self) -> impl Iterator<Item = String> {
        self.content.parts.into_iter().map(|part| part.text)
    }
}

/// Parse one event line. Returns `None` for blanks, non-`data:` lines and
/// malformed JSON.
pub fn parse_event_line(line: &str) -> Option<MessageChunk> {
    let payload = line.trim().strip_prefix("data:")?;
    serde_json::from_str(payload.trim()).ok()
}

/// Incremental splitter turning arbitrary byte chunks into complete lines.
///
/// Handles lines spanning chunk boundaries and CRLF endings. A trailing
/// unterminated line is surfaced by [`LineDecoder::take_remainder`] when the
/// stream ends.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes; returns every line completed by it.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Take whatever is left after the stream ends, if anything.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_chunk() {
        let chunk = parse_event_line(
            r#"data: {"partial": true, "content": {"parts": [{"text": "你好"}, {"text": "！"}]}}"#,
        )
        .unwrap();
        assert!(chunk.partial);
        let texts: Vec<String> = chunk.into_texts().collect();
        assert_eq!(texts, vec!["你好", "！"]);
    }

    #[test]
    fn test_parse_final_chunk_not_partial() {
        let chunk = parse_event_line(
            r#"data: {"partial": false, "content": {"parts": [{"text": "done"}]}}"#,
        )
        .unwrap();
        assert!(!chunk.partial);
    }

    #[test]
    fn test_parse_ignores_blank_and_unmarked_lines() {
        assert!(parse_event_line("").is_none());
        assert!(parse_event_line("   ").is_none());
        assert!(parse_event_line("event: message").is_none());
        assert!(parse_event_line(": keep-alive").is_none());
    }

    #[test]
    fn test_parse_swallows_malformed_json() {
        assert!(parse_event_line("data: {not json").is_none());
        assert!(parse_event_line("data:").is_none());
    }

    #[test]
    fn test_parse_missing_fields_default() {
        // A chunk without partial/content parses but emits nothing
        let chunk = parse_event_line(r#"data: {}"#).unwrap();
        assert!(!chunk.partial);
        assert_eq!(chunk.into_texts().count(), 0);
    }

    #[test]
    fn test_line_decoder_simple_lines() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push_chunk(b"one\ntwo\n");
        assert_eq!(lines, vec!["one", "two"]);
        assert!(decoder.take_remainder().is_none());
    }

    #[test]
    fn test_line_decoder_spanning_chunks() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push_chunk(b"data: {\"par").is_empty());
        let lines = decoder.push_chunk(b"tial\": true}\ndata:");
        assert_eq!(lines, vec!["data: {\"partial\": true}"]);
        assert_eq!(decoder.take_remainder().as_deref(), Some("data:"));
    }

    #[test]
    fn test_line_decoder_crlf() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push_chunk(b"alpha\r\nbeta\r\n");
        assert_eq!(lines, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_line_decoder_blank_lines_preserved() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push_chunk(b"data: {}\n\ndata: {}\n");
        assert_eq!(lines, vec!["data: {}", "", "data: {}"]);
    }

    #[test]
    fn test_malformed_middle_line_does_not_stop_parsing() {
        let input = [
            r#"data: {"partial": true, "content": {"parts": [{"text": "a"}]}}"#,
            r#"data: {broken"#,
            r#"data: {"partial": true, "content": {"parts": [{"text": "b"}]}}"#,
        ];

        let fragments: Vec<String> = input
            .iter()
            .filter_map(|line| parse_event_line(line))
            .filter(|chunk| chunk.partial)
            .flat_map(|chunk| chunk.into_texts())
            .collect();

        assert_eq!(fragments, vec!["a", "b"]);
    }
}
