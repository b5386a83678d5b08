//! Types shared between the knitting server and its clients.

pub mod config;
pub mod protocol;
pub mod team;
pub mod vec2;
