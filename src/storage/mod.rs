//! Local media storage module
//!
//! Handles story uploads written to disk and served under the public URL.

mod media;

pub use media::MediaStorage;
