//! StriveX progression engine.
//!
//! Converts completed exercises into XP and levels for a single local hunter profile.
//! All state lives in a [`store::KeyValueStore`]; the engine reads a snapshot, computes
//! the next one and writes it back.

pub mod clock;
pub mod completion;
pub mod engine;
pub mod error;
pub mod hydration;
pub mod models;
pub mod plan;
pub mod progression;
pub mod store;
pub mod xp;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::Engine;
pub use error::EngineError;
pub use store::{KeyValueStore, MemoryStore, StoreError};
