//! Host communication protocol.
//!
//! This module implements the bidirectional protocol spoken with the
//! measurement host over two TCP connections: a synchronous command channel
//! and an asynchronous push channel.
//!
//! # Overview
//!
//! Commands are ASCII text terminated by a single NUL byte. Responses are
//! ASCII text carrying an optional leading error sentinel and an optional
//! `{key=value;key=value}` block, framed by a short read or a trailing NUL;
//! there is no length prefix. The push channel is a continuous byte stream
//! of `<json>...<\json>` framed JSON payloads that arrive independently of
//! any command/response pair.
//!
//! # Key Components
//!
//! - [`CommandChannel`]: NUL-terminated send and chunked receive on the
//!   command socket.
//! - [`Dispatcher`]: one blocking command/response transaction, feeding the
//!   session-wide return-value store and raising on host-reported failure.
//! - [`Demultiplexer`]: the background reader that reassembles, classifies
//!   and publishes async payloads.
//! - [`PayloadSlots`]: latest payload per kind plus the armed one-shot
//!   waiters that hand payloads to blocked callers.
//!
//! # Ordering
//!
//! The command channel is strictly one-at-a-time; async payloads carry no
//! correlation ID and may arrive before, during or after the command that
//! triggered them. Callers must arm the waiter for the expected payload kind
//! before dispatching the command.
mod demux;
mod dispatch;
mod transport;

pub use demux::{
    CLOSE_TAG, Demultiplexer, LEGACY_CLOSE_TAG, LEGACY_OPEN_TAG, OPEN_TAG, PayloadSlots,
    drain_complete_utf8, drain_frames,
};
pub use dispatch::{COMMAND_NAME_KEY, Dispatcher, ERROR_MESSAGE_KEY};
pub use transport::{CONNECT_RETRY, CommandChannel, RECV_CHUNK, TERMINATOR, connect_with_retry};
