//! Utilities shared by the Tefuda server binary and library.

pub mod logger;
pub mod time;
