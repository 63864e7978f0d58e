//! Gather Server
//!
//! REST backend for a community platform: groups with role-based
//! membership, channels with chats, scheduled live events and direct
//! messages.

pub mod api;
pub mod auth;
pub mod channels;
pub mod config;
pub mod conversations;
pub mod db;
pub mod error;
pub mod events;
pub mod groups;
pub mod permissions;
