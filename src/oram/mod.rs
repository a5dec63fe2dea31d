//! Path-ORAM-style Oblivious Storage Engine
//!
//! A client ([`Client`]) stores small fixed-length data blocks on an
//! untrusted [`Server`] such that the server's view of which buckets are
//! touched is statistically indistinguishable regardless of which logical
//! ID the client is actually operating on.

mod client;
mod crypto;
mod error;
mod node;
mod server;
mod tree;

pub use client::Client;
pub use error::OramError;
pub use node::{BucketSlot, Node};
pub use server::Server;
pub use tree::PerfectTree;

/// Fixed capacity of every bucket, at every node, at all times.
pub const BUCKET_SIZE: usize = 4;
/// Fixed length, in bytes, of a stored data block.
pub const DATA_LEN: usize = 4;
/// Length, in bytes, of a dummy entry's random plaintext key.
pub const DUMMY_LEN: usize = 3;
/// Sentinel first byte of a dummy entry's plaintext value (`'0'`).
pub const DUM_VAL: u8 = b'0';

/// A stored data block: exactly [`DATA_LEN`] bytes.
pub type BlockData = [u8; DATA_LEN];
