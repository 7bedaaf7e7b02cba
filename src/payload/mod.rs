//! Typed payloads carried on the asynchronous push channel.
//!
//! Each payload is a JSON object with exactly one top-level key naming its
//! type. Classification is a cheap sniff on that first key, not a schema
//! validation; see [`classify`].
mod cloud;
mod compare;
mod matrix;
mod picture;
mod scalebars;

pub use cloud::{Cloud, ObjectPoint};
pub use compare::ProjectCompareStats;
pub use matrix::Matrix;
pub use picture::{ImagePoint, Picture};
pub use scalebars::{ScaleBar, ScaleBars, ScaleDistance};

use crate::error::LinkError;

/// The fixed set of payload shapes the host publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Cloud,
    Picture,
    CompareStats,
    Matrix,
    ScaleBars,
}

impl PayloadKind {
    pub const ALL: [PayloadKind; 5] = [
        PayloadKind::Cloud,
        PayloadKind::Picture,
        PayloadKind::CompareStats,
        PayloadKind::Matrix,
        PayloadKind::ScaleBars,
    ];

    /// Top-level JSON key naming this payload kind on the wire.
    pub fn envelope_key(self) -> &'static str {
        match self {
            PayloadKind::Cloud => "GCloud",
            PayloadKind::Picture => "GPicture",
            PayloadKind::CompareStats => "GPhotogrammetryProjectCompareStats",
            PayloadKind::Matrix => "GMatrix",
            PayloadKind::ScaleBars => "scalebars",
        }
    }
}

/// A decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Cloud(Cloud),
    Picture(Picture),
    CompareStats(ProjectCompareStats),
    Matrix(Matrix),
    ScaleBars(ScaleBars),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Cloud(_) => PayloadKind::Cloud,
            Payload::Picture(_) => PayloadKind::Picture,
            Payload::CompareStats(_) => PayloadKind::CompareStats,
            Payload::Matrix(_) => PayloadKind::Matrix,
            Payload::ScaleBars(_) => PayloadKind::ScaleBars,
        }
    }
}

/// Sniff a payload's kind from its first top-level key.
///
/// The kind name must appear strictly between the first and second `{` of
/// the text (or between the first `{` and the end when no second brace
/// exists, as for an empty list payload). The kind names are pairwise
/// non-substrings, so at most one matches.
pub fn classify(text: &str) -> Option<PayloadKind> {
    let first = text.find('{')?;
    let window = match text[first + 1..].find('{') {
        Some(offset) => &text[first + 1..first + 1 + offset],
        None => &text[first + 1..],
    };

    PayloadKind::ALL
        .into_iter()
        .find(|kind| window.contains(kind.envelope_key()))
}

/// Decode a classified payload into its typed object.
pub fn decode(kind: PayloadKind, text: &str) -> Result<Payload, LinkError> {
    Ok(match kind {
        PayloadKind::Cloud => Payload::Cloud(Cloud::from_payload(text)?),
        PayloadKind::Picture => Payload::Picture(Picture::from_payload(text)?),
        PayloadKind::CompareStats => {
            Payload::CompareStats(ProjectCompareStats::from_payload(text)?)
        }
        PayloadKind::Matrix => Payload::Matrix(Matrix::from_payload(text)?),
        PayloadKind::ScaleBars => Payload::ScaleBars(ScaleBars::from_payload(text)?),
    })
}
