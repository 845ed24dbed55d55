//! Nano Banana Studio - generate and iteratively edit images with Gemini
//!
//! The library holds the interaction controller that owns the session
//! (current image, history, status, last error) and the remote image API
//! client it drives. Presentation layers sit on top of [`session::Studio`].

pub mod ai;
pub mod error;
pub mod models;
pub mod prompts;
pub mod session;

pub use error::{Error, Result};
