use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Request sent by the page agent when the mirror button is pressed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DownloadRequest {
    /// Numeric beatmapset identifier, kept as text the way it was scraped.
    pub id: String,
    /// Pre-sanitized candidate filename, used when the mirror sends none.
    #[serde(rename = "fallbackName", default)]
    pub fallback_name: String,
}

impl DownloadRequest {
    pub fn new(id: impl Into<String>, fallback_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fallback_name: fallback_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgressEvent {
    /// Cumulative bytes received so far
    pub received: u64,
    /// Expected size, 0 when the mirror did not announce one
    pub total: u64,
    pub filename: String,
}

impl ProgressEvent {
    /// Completion percentage clamped to `[0, 100]`; unknown totals read as 0.
    pub fn percent(&self) -> f64 {
        percent(self.received, self.total)
    }
}

pub fn percent(received: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (received as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Every message exchanged between the page agent and the fetch relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Download(DownloadRequest),
    Progress(ProgressEvent),
    Complete { filename: String },
    Failed,
}

impl Message {
    /// `complete` and `failed` end a request; nothing may follow them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Message::Complete { .. } | Message::Failed)
    }
}

/// Body chunks of one transfer, kept in arrival order.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Bytes>,
    received: u64,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the chunk and returns the cumulative byte count.
    pub fn push(&mut self, chunk: Bytes) -> u64 {
        self.received += chunk.len() as u64;
        self.chunks.push(chunk);
        self.received
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Concatenates every chunk into one contiguous buffer.
    pub fn into_contiguous(self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.received as usize);
        for chunk in &self.chunks {
            data.extend_from_slice(chunk);
        }
        data
    }
}

/// How a download ended, from the page's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(10, 0), 0.0);
        assert_eq!(percent(300, 200), 100.0);
        assert_eq!(percent(0, 200), 0.0);
    }

    #[test]
    fn test_wire_shape() {
        let request = Message::Download(DownloadRequest::new("12345", "beatmapset-12345.osz"));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"type": "download", "id": "12345", "fallbackName": "beatmapset-12345.osz"})
        );

        let progress = Message::Progress(ProgressEvent {
            received: 10,
            total: 0,
            filename: "a.osz".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&progress).unwrap(),
            json!({"type": "progress", "received": 10, "total": 0, "filename": "a.osz"})
        );

        assert_eq!(
            serde_json::to_value(Message::Failed).unwrap(),
            json!({"type": "failed"})
        );
    }

    #[test]
    fn test_parse_page_message() {
        let msg = serde_json::from_str::<Message>(r#"{"type":"complete","filename":"Foo Bar.osz"}"#).unwrap();
        assert!(msg.is_terminal());
        assert_eq!(
            msg,
            Message::Complete {
                filename: "Foo Bar.osz".to_string()
            }
        );

        let msg = serde_json::from_str::<Message>(r#"{"type":"download","id":"7"}"#).unwrap();
        assert_eq!(msg, Message::Download(DownloadRequest::new("7", "")));
        assert!(!msg.is_terminal());

        assert!(serde_json::from_str::<Message>(r#"{"type":"paused"}"#).is_err());
    }

    #[test]
    fn test_chunk_buffer_keeps_arrival_order() {
        let chunks: Vec<&[u8]> = vec![&b"osu"[..], &b""[..], &b"!"[..], &b"direct"[..], &b"\x00\xff\x07"[..]];
        let mut buffer = ChunkBuffer::new();
        let mut expected = Vec::new();
        for chunk in &chunks {
            buffer.push(Bytes::copy_from_slice(chunk));
            expected.extend_from_slice(chunk);
        }

        assert_eq!(buffer.chunk_count(), 5);
        assert_eq!(buffer.received(), expected.len() as u64);
        let data = buffer.into_contiguous();
        assert_eq!(data.len(), chunks.iter().map(|c| c.len()).sum::<usize>());
        assert_eq!(data, expected);
    }

    #[test]
    fn test_chunk_buffer_push_reports_running_total() {
        let mut buffer = ChunkBuffer::new();
        assert_eq!(buffer.push(Bytes::from_static(b"abcd")), 4);
        assert_eq!(buffer.push(Bytes::from_static(b"ef")), 6);
        assert!(ChunkBuffer::new().into_contiguous().is_empty());
    }
}
