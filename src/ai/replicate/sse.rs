//! Server-sent event framing for prediction output streams.

/// Maximum bytes buffered without a frame delimiter before the stream is
/// treated as malformed.
pub(crate) const MAX_SSE_BUFFER_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Accumulates raw bytes and yields complete frames.
///
/// Bytes are buffered until a blank line so multi-byte characters split
/// across network chunks decode correctly.
#[derive(Debug, Default)]
pub(crate) struct SseBuffer {
    buffer: Vec<u8>,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Append a chunk and drain every complete event it finishes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend(chunk.iter().filter(|b| **b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_frame_end(&self.buffer) {
            let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&frame[..end]);
            if let Some(event) = parse_sse_frame(&text) {
                events.push(event);
            }
        }
        events
    }

    /// Parse whatever remains once the underlying stream has ended.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest);
        if text.trim().is_empty() {
            return None;
        }
        parse_sse_frame(&text)
    }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Parse one frame such as:
/// ```text
/// event: output
/// data: Hello
/// ```
///
/// Only the single space following a field colon is removed, so leading
/// whitespace that belongs to a token survives. A frame without an `event`
/// field is a `message` event.
pub(crate) fn parse_sse_frame(frame: &str) -> Option<SseEvent> {
    let mut event = String::new();
    let mut data_lines: Vec<&str> = Vec::new();

    for line in frame.split('\n') {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = value.to_string(),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if event.is_empty() && data_lines.is_empty() {
        return None;
    }
    if event.is_empty() {
        event = "message".to_string();
    }

    Some(SseEvent {
        event,
        data: data_lines.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sse_frame_basic() {
        let event = parse_sse_frame("event: output\ndata: Hello").unwrap();
        assert_eq!(event.event, "output");
        assert_eq!(event.data, "Hello");
    }

    #[test]
    fn test_parse_sse_frame_keeps_token_whitespace() {
        let event = parse_sse_frame("event: output\ndata:  world").unwrap();
        assert_eq!(event.data, " world");
    }

    #[test]
    fn test_parse_sse_frame_multiline_data() {
        let event = parse_sse_frame("event: output\ndata: line one\ndata: line two").unwrap();
        assert_eq!(event.data, "line one\nline two");
    }

    #[test]
    fn test_parse_sse_frame_empty_data_line_is_newline() {
        let event = parse_sse_frame("event: output\ndata:\ndata:").unwrap();
        assert_eq!(event.data, "\n");
    }

    #[test]
    fn test_parse_sse_frame_comments_and_ids_ignored() {
        let event = parse_sse_frame(": keepalive\nid: 1\nevent: done\ndata: {}").unwrap();
        assert_eq!(event.event, "done");
        assert_eq!(event.data, "{}");
        assert!(parse_sse_frame(": keepalive").is_none());
    }

    #[test]
    fn test_buffer_handles_split_frames_and_utf8() {
        let mut buffer = SseBuffer::new();
        let bytes = "event: output\ndata: caf\u{e9}\n\n".as_bytes();
        let (first, second) = bytes.split_at(bytes.len() - 3);

        assert!(buffer.push(first).is_empty());
        let events = buffer.push(second);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "caf\u{e9}");
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_buffer_crlf_and_trailing_frame() {
        let mut buffer = SseBuffer::new();
        let events = buffer.push(b"event: output\r\ndata: a\r\n\r\nevent: done\r\ndata: {}");
        assert_eq!(events.len(), 1);
        let last = buffer.finish().unwrap();
        assert_eq!(last.event, "done");
        assert!(buffer.finish().is_none());
    }
}
