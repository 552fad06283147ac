pub mod checksum;
pub mod error;
pub mod manifest;
pub mod naming;
pub mod path_safety;
pub mod reassemble;
pub mod record;
pub mod split;
pub mod verify;

pub use error::{ChunkError, Result};
