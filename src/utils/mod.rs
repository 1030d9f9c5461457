//! Shared utilities and error types

mod debounce;
pub mod error;

pub use debounce::Debouncer;
pub use error::{FetchError, HintError, NavError, Result};
