//! Error taxonomy for the SDK.
//!
//! Transport failures, host-reported command failures and async-payload
//! timeouts are distinct variants so scripts can tell "the pipe broke" from
//! "the host rejected the command" from "the payload never arrived".
use std::io;

use thiserror::Error;

use crate::payload::PayloadKind;

/// List of possible errors surfaced to a calling script.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("transport IO error: {0}")]
    Io(#[from] io::Error),

    #[error("host reported command failure: {0}")]
    Host(String),

    #[error("timed out waiting for {kind:?} payload")]
    PayloadTimeout { kind: PayloadKind },

    #[error("host version {version} does not publish {kind:?} payloads")]
    UnsupportedPayload { kind: PayloadKind, version: u64 },

    #[error("return value '{key}' holds {found}, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("return value '{0}' not found")]
    MissingValue(String),

    #[error("session is not connected; call connect() first")]
    NotConnected,

    #[error("failed to decode payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("invalid transformation matrix: {0}")]
    InvalidTransform(String),
}
