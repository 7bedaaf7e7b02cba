//! Socket plumbing for the two host connections.
//!
//! The command channel is a blocking request/response stream: each command is
//! the ASCII text plus a single NUL terminator, and each response is read in
//! fixed-size chunks until a short read or a trailing NUL. The async channel
//! is connected here but only ever read, by the demultiplexer.
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use log::info;

/// Chunk size for response reads.
pub const RECV_CHUNK: usize = 2048;

/// End-of-command / end-of-response sentinel byte.
pub const TERMINATOR: u8 = 0;

/// Interval between connection attempts.
pub const CONNECT_RETRY: Duration = Duration::from_millis(250);

/// Open both host connections, retrying indefinitely.
///
/// The async channel listens on the port directly above the command port.
/// Blocks until both sockets connect, logging a waiting notice at second
/// granularity.
pub fn connect_with_retry(host: &str, command_port: u16) -> (TcpStream, TcpStream) {
    let started = Instant::now();
    let mut last_notice = 0;

    loop {
        match try_connect_pair(host, command_port) {
            Ok(pair) => return pair,
            Err(_) => {
                let waited = started.elapsed().as_secs();
                if waited > last_notice {
                    last_notice = waited;
                    info!("waiting to connect to {host}:{command_port} ({waited}s)");
                }
                thread::sleep(CONNECT_RETRY);
            }
        }
    }
}

fn try_connect_pair(host: &str, command_port: u16) -> io::Result<(TcpStream, TcpStream)> {
    let command = TcpStream::connect((host, command_port))?;
    let push = TcpStream::connect((host, command_port + 1))?;
    Ok((command, push))
}

/// The synchronous command channel.
///
/// Generic over the stream so framing can be tested against in-memory
/// readers and writers.
pub struct CommandChannel<S> {
    pub(crate) stream: S,
}

impl<S: Read + Write> CommandChannel<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Send one command, terminated by a single NUL byte.
    pub fn send(&mut self, text: &str) -> io::Result<()> {
        self.stream.write_all(text.as_bytes())?;
        self.stream.write_all(&[TERMINATOR])?;
        self.stream.flush()
    }

    /// Read one full response.
    ///
    /// There is no length prefix; end-of-message is a chunk shorter than
    /// [`RECV_CHUNK`] or an accumulated buffer ending in the terminator. The
    /// trailing terminator, when present, is stripped.
    pub fn receive(&mut self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; RECV_CHUNK];

        loop {
            let n = self.stream.read(&mut chunk)?;
            buffer.extend_from_slice(&chunk[..n]);

            if n < RECV_CHUNK || buffer.ends_with(&[TERMINATOR]) {
                break;
            }
        }

        if buffer.ends_with(&[TERMINATOR]) {
            buffer.pop();
        }
        Ok(buffer)
    }
}
