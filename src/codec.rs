//! Wire codec for timestamped chat messages
//!
//! A message is the UTF-8 text `sender_id:sequence:timestamp_us`. With
//! [`Framing::Raw`] nothing else is put on the wire and every read is
//! treated as one message; with [`Framing::Line`] each message is followed
//! by `\n` and the receive side reassembles frames across reads.

use crate::clock;
use crate::models::{ReceivedMessage, TimestampedMessage};
use crate::types::Framing;

pub const FIELD_SEPARATOR: char = ':';
pub const FRAME_TERMINATOR: u8 = b'\n';

/// Encode a message as `sender_id:sequence:timestamp_us`, no terminator.
pub fn encode(sender_id: u64, sequence: u64, timestamp_us: u64) -> Vec<u8> {
    format!("{sender_id}{FIELD_SEPARATOR}{sequence}{FIELD_SEPARATOR}{timestamp_us}").into_bytes()
}

/// Encode a message stamped with the current monotonic time.
pub fn encode_now(sender_id: u64, sequence: u64) -> Vec<u8> {
    encode(sender_id, sequence, clock::now_us())
}

/// Encode a message for the given stream framing.
pub fn encode_framed(message: &TimestampedMessage, framing: Framing) -> Vec<u8> {
    let mut bytes = encode(message.sender_id, message.sequence, message.timestamp_us);
    if framing == Framing::Line {
        bytes.push(FRAME_TERMINATOR);
    }
    bytes
}

/// Decode a message. Needs at least three colon-separated fields with an
/// integer third field; sender id and sequence are kept only when they
/// parse. Callers drop `None` payloads without logging.
pub fn decode(bytes: &[u8]) -> Option<ReceivedMessage> {
    let text = std::str::from_utf8(bytes).ok()?.trim();
    let mut fields = text.split(FIELD_SEPARATOR);

    let sender_id = fields.next()?;
    let sequence = fields.next()?;
    let timestamp_us = fields.next()?.parse().ok()?;

    Some(ReceivedMessage {
        sender_id: sender_id.parse().ok(),
        sequence: sequence.parse().ok(),
        timestamp_us,
    })
}

/// Splits received bytes into message payloads according to the framing.
#[derive(Debug)]
pub enum FrameReader {
    Raw,
    Line(LineFramer),
}

impl FrameReader {
    pub fn new(framing: Framing, max_frame_len: usize) -> Self {
        match framing {
            Framing::Raw => FrameReader::Raw,
            Framing::Line => FrameReader::Line(LineFramer::new(max_frame_len)),
        }
    }

    /// Feed one read's worth of bytes, calling `on_frame` for every
    /// complete payload found.
    pub fn feed<F>(&mut self, chunk: &[u8], mut on_frame: F)
    where
        F: FnMut(&[u8]),
    {
        match self {
            FrameReader::Raw => on_frame(chunk),
            FrameReader::Line(framer) => framer.feed(chunk, on_frame),
        }
    }

    /// Bytes discarded because no terminator arrived in time
    pub fn discarded_bytes(&self) -> usize {
        match self {
            FrameReader::Raw => 0,
            FrameReader::Line(framer) => framer.discarded_bytes,
        }
    }
}

/// Newline frame reassembly over a byte stream
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    max_frame_len: usize,
    discarded_bytes: usize,
}

impl LineFramer {
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_frame_len),
            max_frame_len,
            discarded_bytes: 0,
        }
    }

    pub fn feed<F>(&mut self, chunk: &[u8], mut on_frame: F)
    where
        F: FnMut(&[u8]),
    {
        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|&b| b == FRAME_TERMINATOR) {
            let frame: Vec<u8> = self.buffer.drain(..=pos).collect();
            on_frame(&frame[..pos]);
        }

        // A partial frame longer than any valid message is garbage.
        if self.buffer.len() > self.max_frame_len {
            self.discarded_bytes += self.buffer.len();
            self.buffer.clear();
        }
    }

    /// Bytes of an incomplete frame still waiting for its terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
