//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets and ranges (source of truth)
//! - `reader`: safe byte access and protocol conventions
//! - `parser`: domain-level decoding (no direct byte indexing)
//! - `error`: explicit, actionable errors
//!
//! `ds485` covers the bus-level structures, `daemon` the TCP daemon-socket
//! encapsulation built on top of them, and `names` the symbolic tables both
//! use for display. Parsers are pure and contain no I/O.

pub(crate) mod common;
pub mod daemon;
pub mod ds485;
pub mod names;

pub use common::hex::{from_hex, to_hex};
