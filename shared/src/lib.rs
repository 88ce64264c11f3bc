//! Shared types for the Masa ordering platform
//!
//! Domain types used across the server and client crates: order and menu
//! models, the order status state machine, request/response DTOs, the
//! unified error system, and small utilities.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
