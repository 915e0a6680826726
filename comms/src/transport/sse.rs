use thiserror::Error;

const DEFAULT_EVENT_TYPE: &str = "message";
const BYTE_ORDER_MARK: char = '\u{feff}';

/// Longest line the decoder keeps waiting for the end of, 1 MiB
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SseError {
    #[error("event stream line exceeds {limit} bytes without a line break")]
    LineTooLong { limit: usize },
}

/// [SseDecoder] turns the chunks of a `text/event-stream` body into the data of the dispatched events.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere, the decoder keeps the incomplete
/// tail until the next chunk arrives. Only events without an `event` field or with the
/// `message` type are delivered, `id` and `retry` fields are ignored. A byte order mark at the
/// very start of the stream is skipped.
#[derive(Debug)]
pub struct SseDecoder {
    /// Bytes of the line which is not terminated yet
    buffer: Vec<u8>,
    /// Data lines of the event being built
    data: Vec<String>,
    /// Type of the event being built
    event_type: Option<String>,
    /// Whether the first line of the stream has been decoded
    started: bool,
    max_line_length: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            buffer: Vec::new(),
            data: Vec::new(),
            event_type: None,
            started: false,
            max_line_length,
        }
    }

    /// Feeds a chunk of the body, returning the data of every event completed by it.
    ///
    /// Once the unterminated tail grows past the line length limit, the pending bytes are
    /// dropped and an error follows the completed events. The stream should not be fed anymore.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<String, SseError>> {
        self.buffer.extend_from_slice(chunk);

        let mut dispatched = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&line[..line_end]);
            let mut line = line.strip_suffix('\r').unwrap_or(&line);

            if !self.started {
                self.started = true;
                line = line.strip_prefix(BYTE_ORDER_MARK).unwrap_or(line);
            }

            if let Some(data) = self.process_line(line) {
                dispatched.push(Ok(data));
            }
        }

        if self.buffer.len() > self.max_line_length {
            self.buffer = Vec::new();
            dispatched.push(Err(SseError::LineTooLong {
                limit: self.max_line_length,
            }));
        }

        dispatched
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }

        // comment line, used by servers as keep alive
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event_type = Some(value.to_string()),
            _ => (),
        }

        None
    }

    fn dispatch(&mut self) -> Option<String> {
        let event_type = self.event_type.take();

        if self.data.is_empty() {
            return None;
        }

        let data = std::mem::take(&mut self.data).join("\n");

        match event_type.as_deref() {
            None | Some("") | Some(DEFAULT_EVENT_TYPE) => Some(data),
            Some(_) => None,
        }
    }
}
