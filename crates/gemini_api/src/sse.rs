use crate::response::GenerateContentResponse;

/// Incremental parser for SSE reply streams.
///
/// Network chunk boundaries do not align with frame boundaries, so bytes are
/// buffered until a blank-line separator completes a frame. Both `\n\n` and
/// `\r\n\r\n` separators occur in the wild.
#[derive(Debug, Default)]
pub struct SseStreamParser {
    buffer: String,
}

impl SseStreamParser {
    /// Feed arbitrary bytes into the parser and drain complete events.
    ///
    /// Frames whose payload is not a decodable `GenerateContentResponse` are
    /// skipped; the Gemini stream carries no other payload kinds.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<GenerateContentResponse> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut events = Vec::new();

        while let Some((split, separator_len)) = frame_boundary(&self.buffer) {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + separator_len);

            if let Some(payload) = extract_data_payload(&frame) {
                if let Ok(event) = serde_json::from_str::<GenerateContentResponse>(&payload) {
                    events.push(event);
                }
            }
        }

        events
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(input: &str) -> Vec<GenerateContentResponse> {
        let mut parser = Self::default();
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn frame_boundary(buffer: &str) -> Option<(usize, usize)> {
    let lf = buffer.find("\n\n").map(|index| (index, 2));
    let crlf = buffer.find("\r\n\r\n").map(|index| (index, 4));

    match (lf, crlf) {
        (Some(lf), Some(crlf)) => {
            if crlf.0 < lf.0 {
                Some(crlf)
            } else {
                Some(lf)
            }
        }
        (lf, crlf) => lf.or(crlf),
    }
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}
