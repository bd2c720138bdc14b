//! Network transports feeding the latency sink
//!
//! [`stream`] runs a TCP session against the chat server and measures round
//! trips of its own echoed messages. [`multicast`] joins the UDP feed and
//! measures one-way delivery.

pub mod multicast;
pub mod stream;

pub use multicast::{ListenerReport, MulticastListener, MulticastPublisher};
pub use stream::{SessionReport, StreamOptions, StreamSession};

use crate::clock;
use crate::codec;
use crate::sink::LatencySink;
use std::io;

/// Decode one payload and record its latency in the sink.
///
/// Returns the recorded sample. Payloads that do not decode and messages
/// stamped in the receiver's future are only counted.
pub(crate) fn record_payload(payload: &[u8], sink: &LatencySink) -> Option<u64> {
    let Some(message) = codec::decode(payload) else {
        sink.note_malformed();
        return None;
    };

    match clock::latency_since(message.timestamp_us) {
        Some(latency_us) => {
            sink.record(latency_us);
            Some(latency_us)
        }
        None => {
            sink.note_skewed();
            None
        }
    }
}

/// Errors meaning the peer went away rather than something unexpected
pub(crate) fn is_disconnect(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_payload_past_timestamp() {
        let sink = LatencySink::new();
        let stamp = clock::now_us();
        let payload = codec::encode(1, 0, stamp);

        let latency = record_payload(&payload, &sink);
        assert!(latency.is_some());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_record_payload_with_unreadable_sender_id() {
        let sink = LatencySink::new();
        let payload = format!("bot-x:2:{}", clock::now_us());

        assert!(record_payload(payload.as_bytes(), &sink).is_some());
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.dropped().malformed, 0);
    }

    #[test]
    fn test_record_payload_counts_drops() {
        let sink = LatencySink::new();

        assert!(record_payload(b"abc", &sink).is_none());
        assert!(record_payload(b"1:2", &sink).is_none());
        let future = codec::encode(1, 0, clock::now_us() + 60_000_000);
        assert!(record_payload(&future, &sink).is_none());

        assert!(sink.is_empty());
        let dropped = sink.dropped();
        assert_eq!(dropped.malformed, 2);
        assert_eq!(dropped.skewed, 1);
    }

    #[test]
    fn test_disconnect_kinds() {
        assert!(is_disconnect(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(is_disconnect(&io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(!is_disconnect(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }
}
