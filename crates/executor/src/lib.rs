//! Process execution primitive shared by every local command tool.
//!
//! A raw command string is split on whitespace and executed directly. There is
//! no shell in between: quoting, escaping, pipes and globbing are not
//! interpreted, so an argument containing a space cannot be expressed.

pub mod command_executor;

pub use command_executor::{CommandExecutor, CommandLine, ExecutorError};
