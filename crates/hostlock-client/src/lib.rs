//! Hostlock Client - launcher automation for the shared save
//!
//! Wraps a game session in the lock protocol: fetch the save (taking the
//! lock), run the game, submit the save back (releasing the lock). When
//! someone else already hosts, the game runs without the save and nothing
//! is submitted afterwards.

pub mod http;
pub mod workflow;

pub use http::{FetchOutcome, SaveClient, SaveClientConfig};
