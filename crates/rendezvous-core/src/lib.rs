//! rendezvous-core — shared types, cookie codec, and cryptographic primitives.
//! The store and the daemon both depend on this one.

pub mod clock;
pub mod config;
pub mod cookie;
pub mod crypto;
pub mod registration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::Nonce;
pub use registration::{PeerId, Registration, Seq};
