//! AKPK sound bank extraction
//!
//! Game audio ships packed in AKPK (`.pck`) containers of encoded `.wem`
//! streams. This crate reads the container index, writes each stream to
//! `<id>.wem` and optionally transcodes it to `<id>.wav`, the layout
//! expected by `ostmix-compile`.

pub mod error;
pub mod extract;
pub mod index;
pub mod transcode;

pub use error::{PckError, Result};
pub use extract::extract;
pub use index::{PckEntry, PckIndex};
pub use transcode::Transcoder;
