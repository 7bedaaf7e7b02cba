//! Asynchronous push-channel reader.
//!
//! A background thread drains the push socket for the lifetime of the
//! connection, reassembles `<json>...<\json>` framed payloads, classifies
//! each by its first top-level key, deserializes it and publishes it to the
//! session's payload slots. A payload that fails to classify or decode is
//! logged and dropped; the loop itself only ends when the socket closes.
use std::collections::HashMap;
use std::io::Read;
use std::net::TcpStream;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use super::transport::RECV_CHUNK;
use crate::payload::{Payload, PayloadKind, classify, decode};

pub const OPEN_TAG: &str = "<json>";
pub const CLOSE_TAG: &str = r"<\json>";

/// Legacy framing recognised only to be discarded.
pub const LEGACY_OPEN_TAG: &str = "<data>";
pub const LEGACY_CLOSE_TAG: &str = r"<\data>";

const READ_ERROR_BACKOFF: Duration = Duration::from_millis(250);

/// Latest payload per kind plus the armed one-shot waiters.
///
/// The demultiplexer thread is the only publisher; the session side arms and
/// disarms around a single dispatch, one outstanding arm per kind.
#[derive(Debug, Default)]
pub struct PayloadSlots {
    latest: Mutex<HashMap<PayloadKind, Payload>>,
    waiters: Mutex<HashMap<PayloadKind, SyncSender<Payload>>>,
}

impl PayloadSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a fresh one-shot waiter for `kind`, returning its receiving end.
    ///
    /// Re-arming a kind that is already armed replaces the stale waiter;
    /// concurrent waiters on one kind are not supported.
    pub fn arm(&self, kind: PayloadKind) -> Receiver<Payload> {
        let (tx, rx) = sync_channel(1);
        if self.waiters.lock().unwrap().insert(kind, tx).is_some() {
            warn!("replacing stale {kind:?} waiter; overlapping requests are not supported");
        }
        rx
    }

    /// Tear down the waiter for `kind`, if any.
    pub fn disarm(&self, kind: PayloadKind) {
        self.waiters.lock().unwrap().remove(&kind);
    }

    /// Replace the latest payload of its kind and signal an armed waiter.
    pub fn publish(&self, payload: Payload) {
        let kind = payload.kind();
        self.latest
            .lock()
            .unwrap()
            .insert(kind, payload.clone());

        if let Some(waiter) = self.waiters.lock().unwrap().remove(&kind) {
            // The receiver may already be gone if the caller timed out.
            if waiter.try_send(payload).is_err() {
                debug!("{kind:?} waiter vanished before handoff");
            }
        }
    }

    /// Most recent payload of `kind`, if one has ever arrived.
    pub fn latest(&self, kind: PayloadKind) -> Option<Payload> {
        self.latest.lock().unwrap().get(&kind).cloned()
    }
}

/// Extract every complete frame out of the buffer, in arrival order.
///
/// Legacy `<data>` frames are consumed and dropped. A closing tag with no
/// matching opening tag discards the entire pending buffer rather than
/// looping forever on garbage.
pub fn drain_frames(buffer: &mut String) -> Vec<String> {
    let mut batch = Vec::new();

    while buffer.contains(CLOSE_TAG) || buffer.contains(LEGACY_CLOSE_TAG) {
        let json_at = buffer.find(OPEN_TAG);
        let legacy_at = buffer.find(LEGACY_OPEN_TAG);

        let (open_at, open_tag, close_tag, legacy) = match (json_at, legacy_at) {
            (Some(j), Some(d)) if d < j => (d, LEGACY_OPEN_TAG, LEGACY_CLOSE_TAG, true),
            (Some(j), _) => (j, OPEN_TAG, CLOSE_TAG, false),
            (None, Some(d)) => (d, LEGACY_OPEN_TAG, LEGACY_CLOSE_TAG, true),
            (None, None) => {
                warn!("closing tag without opening tag; discarding {} buffered bytes", buffer.len());
                buffer.clear();
                break;
            }
        };

        let interior_start = open_at + open_tag.len();
        match buffer[interior_start..].find(close_tag) {
            Some(rel) => {
                let interior = buffer[interior_start..interior_start + rel].to_string();
                buffer.drain(..interior_start + rel + close_tag.len());
                if legacy {
                    debug!("discarding legacy data frame ({} bytes)", interior.len());
                } else {
                    batch.push(interior);
                }
            }
            None => {
                // A close tag of the other framing appeared before this
                // frame completed; the stream is out of step.
                warn!("mismatched frame tags; discarding {} buffered bytes", buffer.len());
                buffer.clear();
                break;
            }
        }
    }

    batch
}

/// Decode every complete UTF-8 character out of `pending`, leaving behind a
/// trailing sequence a read boundary cut short so the next chunk can finish
/// it. Genuinely invalid bytes become replacement characters.
pub fn drain_complete_utf8(pending: &mut Vec<u8>) -> String {
    let mut out = String::new();
    loop {
        match std::str::from_utf8(pending) {
            Ok(text) => {
                out.push_str(text);
                pending.clear();
                return out;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                out.push_str(&String::from_utf8_lossy(&pending[..valid]));
                match e.error_len() {
                    Some(bad) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid + bad);
                    }
                    // Incomplete multibyte character at the end; hold it.
                    None => {
                        pending.drain(..valid);
                        return out;
                    }
                }
            }
        }
    }
}

/// The push-channel reader loop.
pub struct Demultiplexer {
    stream: TcpStream,
    slots: Arc<PayloadSlots>,
    pending: Vec<u8>,
    buffer: String,
}

impl Demultiplexer {
    /// Spawn the reader thread for one push connection.
    pub fn spawn(stream: TcpStream, slots: Arc<PayloadSlots>) -> JoinHandle<()> {
        let demux = Self {
            stream,
            slots,
            pending: Vec::new(),
            buffer: String::new(),
        };
        thread::spawn(move || demux.run())
    }

    fn run(mut self) {
        let mut chunk = [0u8; RECV_CHUNK];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    info!("push channel closed by host");
                    return;
                }
                Ok(n) => {
                    self.pending.extend_from_slice(&chunk[..n]);
                    self.buffer.push_str(&drain_complete_utf8(&mut self.pending));
                    for frame in drain_frames(&mut self.buffer) {
                        self.process(&frame);
                    }
                }
                Err(e) => {
                    warn!("push channel read error: {e}");
                    thread::sleep(READ_ERROR_BACKOFF);
                }
            }
        }
    }

    fn process(&self, frame: &str) {
        match classify(frame) {
            Some(kind) => match decode(kind, frame) {
                Ok(payload) => {
                    debug!("received {kind:?} payload");
                    self.slots.publish(payload);
                }
                Err(e) => warn!("failed to decode {kind:?} payload: {e}"),
            },
            None => warn!("unrecognized payload dropped: {frame}"),
        }
    }
}
