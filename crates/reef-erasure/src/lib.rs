//! Reed-Solomon erasure coding over GF(256).
//!
//! This crate provides:
//! - [`field`]: GF(2^8) arithmetic from process-wide immutable tables.
//! - [`Matrix`] and [`build_encoding_matrix`]: the Vandermonde-derived
//!   encoding matrix, any `k` rows of which are invertible.
//! - [`ReedSolomon`]: parity generation and reconstruction of missing rows.
//! - [`ErasureEncoder`]: frames a payload and splits it into `k + m` shards.
//! - [`decode`]: recovers the payload from any `k` of the `k + m` shards.
//!
//! Payloads carry a 4-byte big-endian length header (see [`payload`]), so
//! decoding needs nothing but the shards themselves.

mod codec;
mod decoder;
mod encoder;
mod error;
pub mod field;
mod matrix;
pub mod payload;
mod presence;

pub use codec::ReedSolomon;
pub use decoder::{decode, reconstruct_all};
pub use encoder::{EncodedObject, ErasureEncoder, Shard};
pub use error::ErasureError;
pub use matrix::{Matrix, build_encoding_matrix, validate_config};
pub use presence::PresenceBitmap;
