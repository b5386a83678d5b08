//! Knitting arena server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod blueprint;
pub mod config;
pub mod craft;
pub mod game_loop;
pub mod geometry;
pub mod player;
pub mod protocol;
pub mod state;
pub mod territory;
pub mod trail;
pub mod ws;

pub use knitting_shared::{team, vec2};
