//! Tefuda server: room-based card voting over WebSocket.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
