//! Scripted transport for exercising workflows without hardware

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;

use zfm_core::{Packet, DEFAULT_ADDRESS, FRAME_PREFIX_SIZE};
use zfm_transport::{Error, Result, Transport};

enum Reply {
    Bytes(Vec<u8>),
    Silence,
}

/// Shared record of every instruction code the device sent
#[derive(Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<u8>>>);

impl CommandLog {
    /// Instruction codes in the order they went out on the wire
    pub fn instruction_codes(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }

    fn record(&self, frame: &[u8]) {
        if frame.len() > FRAME_PREFIX_SIZE {
            self.0.lock().unwrap().push(frame[FRAME_PREFIX_SIZE]);
        }
    }
}

/// A transport that replays a scripted sequence of replies
///
/// Each `send` records the outgoing instruction code; each `receive` pops
/// the next scripted reply. An exhausted script behaves like a silent
/// device (read timeout).
pub struct MockTransport {
    replies: VecDeque<Reply>,
    log: CommandLog,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: VecDeque::new(),
            log: CommandLog::default(),
        }
    }

    /// Handle for asserting on the command sequence after the device has
    /// been consumed
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    /// Queue a well-formed acknowledgement frame
    pub fn push_ack(&mut self, status: u8, extra: &[u8]) {
        let mut payload = vec![status];
        payload.extend_from_slice(extra);
        let frame = Packet::ack(DEFAULT_ADDRESS, payload).encode();
        self.push_raw(frame.to_vec());
    }

    /// Queue raw bytes (partial frames, garbage, non-ack packets)
    pub fn push_raw(&mut self, bytes: Vec<u8>) {
        self.replies.push_back(Reply::Bytes(bytes));
    }

    /// Queue one read's worth of silence
    pub fn push_silence(&mut self) {
        self.replies.push_back(Reply::Silence);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_open(&self) -> bool {
        true
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.log.record(data);
        Ok(())
    }

    async fn receive(&mut self, _timeout: Duration) -> Result<BytesMut> {
        match self.replies.pop_front() {
            Some(Reply::Bytes(bytes)) => Ok(BytesMut::from(bytes.as_slice())),
            Some(Reply::Silence) | None => Err(Error::ReadTimeout),
        }
    }

    fn port_name(&self) -> String {
        "mock".to_string()
    }
}
