//! Host version parsing and feature gating.
//!
//! The host reports a dotted version string at session start. It is folded
//! into a single monotonically-comparable integer so feature gates are plain
//! numeric comparisons:
//!
//! `value = dev + hotfix * 10^4 + revision * 10^7 + minor * 10^10 + major * 10^13`
//!
//! `"4.9.4-1"` encodes to `40_090_040_010_000`. Three-part strings carry an
//! optional `-hotfix` suffix on the revision; four-part strings name the
//! hotfix as the fourth component, optionally followed by `-dev`. Anything
//! else encodes to `0`, which disables every gated behavior.

/// Hosts at or above this version echo the command name back in the response
/// and accept script error messages for their own log.
pub const ECHO_AND_ERROR_LOG: u64 = encode(4, 9, 4, 1, 0);

/// Hosts at or above this version publish matrix and scale-bar payloads on
/// the async channel.
pub const ASYNC_MATRIX_AND_SCALEBARS: u64 = encode(4, 9, 6, 0, 0);

const fn encode(major: u64, minor: u64, revision: u64, hotfix: u64, dev: u64) -> u64 {
    dev + hotfix * 10_000 + revision * 10_000_000 + minor * 10_000_000_000 + major * 10_000_000_000_000
}

/// Fold a dotted version string into its numeric encoding.
///
/// Malformed strings encode to `0` rather than erroring; an unknown host
/// version simply behaves like the oldest supported one.
pub fn encode_version(text: &str) -> u64 {
    let parts: Vec<&str> = text.trim().split('.').collect();

    let (major, minor, revision, hotfix, dev): (&str, &str, &str, &str, &str) =
        match parts.as_slice() {
            [major, minor, revision] => {
                let (revision, hotfix) = split_dash(revision);
                (*major, *minor, revision, hotfix, "0")
            }
            [major, minor, revision, hotfix] => {
                let (hotfix, dev) = split_dash(hotfix);
                (*major, *minor, *revision, hotfix, dev)
            }
            _ => return 0,
        };

    let fields = [major, minor, revision, hotfix, dev].map(|f| f.parse::<u64>());
    match fields {
        [Ok(major), Ok(minor), Ok(revision), Ok(hotfix), Ok(dev)] => {
            encode(major, minor, revision, hotfix, dev)
        }
        _ => 0,
    }
}

fn split_dash(part: &str) -> (&str, &str) {
    match part.split_once('-') {
        Some((head, tail)) => (head, tail),
        None => (part, "0"),
    }
}
