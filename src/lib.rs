//! rf2-vcr - Decoder for rFactor 2 `.vcr` replay files
//!
//! Turns a replay buffer into an immutable [`ReplayModel`]: session info,
//! driver roster, per-tick vehicle telemetry and race events. Damaged or
//! newer-than-known files decode as far as possible, with every recovery
//! recorded as a [`model::Diagnostic`].
//!
//! ```no_run
//! use rf2_vcr::source::ReplaySource;
//! use rf2_vcr::ReplayDecoder;
//!
//! # fn main() -> rf2_vcr::Result<()> {
//! let source = ReplaySource::open("race.vcr".as_ref())?;
//! let replay = source.decode(&ReplayDecoder::default())?;
//! for frame in replay.frames() {
//!     println!("{}: {} cars", frame.timestamp, frame.active_vehicles());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::field_reassign_with_default,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod fingerprint;
pub mod format;
pub mod header;
pub mod model;
pub mod sections;
pub mod source;

pub use config::DecoderConfig;
pub use decoder::{decode, ReplayDecoder};
pub use error::{DecodeError, Result, VcrError};
pub use model::ReplayModel;
