//! Host adapters: command execution and file access

pub mod files;
pub mod process;

pub use files::LocalFs;
pub use process::{Privilege, ProcessRunner};
