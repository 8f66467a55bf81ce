//! # ostmix Common Library
//!
//! Shared code for the ostmix binaries:
//! - Error type shared by the library crates
//! - TOML configuration and root folder resolution
//! - Chapter timestamp formatting
//! - Fade curve definitions

pub mod config;
pub mod error;
pub mod fade_curves;
pub mod human_time;

pub use error::{Error, Result};
pub use fade_curves::FadeCurve;
