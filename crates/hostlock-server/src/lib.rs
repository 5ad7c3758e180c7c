//! Hostlock Server - HTTP surface for the save lock protocol
//!
//! Two operations drive the protocol: fetching the save acquires the lock,
//! submitting a new save releases it. A read-only status endpoint rounds
//! out the API. Every mutating request passes the shared-secret gate.

pub mod api;
pub mod model;
pub mod startup;

pub use hostlock_common::error;
