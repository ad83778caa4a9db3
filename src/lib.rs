//! Terminal Space Invaders.
//!
//! The library holds the whole simulation (entities, barriers, the swarm,
//! collision resolution) plus asset, audio and configuration plumbing.  The
//! binary adds the crossterm renderer and the frame loop.

pub mod assets;
pub mod audio;
pub mod barrier;
pub mod compute;
pub mod config;
pub mod entities;
pub mod geometry;
pub mod swarm;
pub mod synth;
