//! # sigil-core
//!
//! Core types, traits, and abstractions for the sigil template service.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other sigil crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod token;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use token::generate_recipient_token;
pub use traits::*;
pub use uuid_utils::new_v7;
