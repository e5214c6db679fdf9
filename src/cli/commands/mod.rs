//! Command implementations.

mod process;
mod serve;

pub use process::process;
pub use serve::serve;
