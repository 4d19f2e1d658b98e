//! Common utilities and types shared across opcheck crates.

pub mod error;

pub use error::{Error, Result};
