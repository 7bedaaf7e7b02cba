//! Command/response transactions.
//!
//! Every remote operation is a blocking round trip on the command channel:
//! send the rendered command, read the full response, merge it into the
//! return-value store and surface a host-reported failure as an error. The
//! host is stateful and sequential, so a failed command must never be
//! swallowed; downstream commands assume the prior step succeeded.
use std::io::{Read, Write};

use log::{debug, warn};

use super::transport::CommandChannel;
use crate::command::Command;
use crate::error::LinkError;
use crate::values::{EXECUTION_STATUS, ReturnValueStore, STATUS_FAILED, Value};
use crate::version::ECHO_AND_ERROR_LOG;

/// Response key carrying the echoed command name on newer hosts.
pub const COMMAND_NAME_KEY: &str = "v.commandName";

/// Response key carrying the host's free-text error message.
pub const ERROR_MESSAGE_KEY: &str = "v.errorMessage";

/// One synchronous command channel plus the session-wide return-value store.
pub struct Dispatcher<S> {
    channel: CommandChannel<S>,
    store: ReturnValueStore,
    host_version: u64,
    last_failed: bool,
}

impl<S: Read + Write> Dispatcher<S> {
    pub fn new(channel: CommandChannel<S>) -> Self {
        Self {
            channel,
            store: ReturnValueStore::new(),
            host_version: 0,
            last_failed: false,
        }
    }

    /// Record the encoded host version once it is known; gates the echo
    /// check and error-log forwarding.
    pub fn set_host_version(&mut self, version: u64) {
        self.host_version = version;
    }

    pub fn host_version(&self) -> u64 {
        self.host_version
    }

    /// Whether the most recent command reported a host-side failure.
    pub fn last_failed(&self) -> bool {
        self.last_failed
    }

    pub fn store(&self) -> &ReturnValueStore {
        &self.store
    }

    pub fn execute(&mut self, command: &Command) -> Result<(), LinkError> {
        self.execute_text(&command.render(), command.name())
    }

    /// Run one transaction: send, receive, parse, check, raise on failure.
    pub fn execute_text(&mut self, text: &str, name: &str) -> Result<(), LinkError> {
        debug!("dispatching {name}");
        self.channel.send(text)?;
        let response = self.channel.receive()?;
        self.store.parse(&response);

        let failed = self.store.get(EXECUTION_STATUS) == Some(&Value::Int(STATUS_FAILED));

        if self.host_version >= ECHO_AND_ERROR_LOG {
            if let Ok(echoed) = self.store.get_str(COMMAND_NAME_KEY) {
                // Observability signal only; the transaction stands.
                if echoed != name {
                    warn!("host echoed command '{echoed}', expected '{name}'");
                }
            }
        }

        self.last_failed = failed;
        if failed {
            let message = self
                .store
                .get_str(ERROR_MESSAGE_KEY)
                .unwrap_or("host reported an error without a message")
                .to_string();
            self.forward_error_to_host_log(&message);
            return Err(LinkError::Host(message));
        }
        Ok(())
    }

    /// Hand the error message back to the host's own script log so it shows
    /// up next to the command that failed. Fire-and-forget; a failure here
    /// must not mask the original error, and the raw transaction bypasses
    /// the store so the parsed failure state stays intact.
    fn forward_error_to_host_log(&mut self, message: &str) {
        if self.host_version < ECHO_AND_ERROR_LOG {
            return;
        }
        let command = Command::new("ScriptErrorToLog").arg("message", message);
        if self
            .channel
            .send(&command.render())
            .and_then(|()| self.channel.receive())
            .is_err()
        {
            debug!("could not forward error message to host log");
        }
    }
}
