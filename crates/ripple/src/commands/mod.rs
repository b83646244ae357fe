//! Command implementations that don't need an initialized workspace.

pub mod init;
