//! Import source implementations.

mod fs;
mod warc;

pub use fs::FileSystemSource;
pub use warc::WarcSource;
