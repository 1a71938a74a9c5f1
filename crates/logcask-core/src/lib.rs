pub mod entry;
pub mod error;

pub use entry::{Entry, FRAME_OVERHEAD};
pub use error::{Error, Result};
