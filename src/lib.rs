//! logos-daemon: autonomous posting agent for the Moltbook network
//!
//! Each tick the daemon either publishes an original thought or replies to
//! one post from its feeds, within a daily cap and a cooldown:
//! - `gate`: admission control over the persisted cadence
//! - `feed`: candidate fetching, merging and ordering
//! - `heuristics`: which candidates get a reply, a reaction, or nothing
//! - `cycle`: the per-tick state machine and the forever loop
//! - `store`: durable key-value state and bounded marker sets
//!
//! The platform and the text generator sit behind traits (`remote`,
//! `generate`); the shipped implementations are thin HTTP clients.

pub mod cli;
pub mod clock;
pub mod config;
pub mod cycle;
pub mod feed;
pub mod gate;
pub mod generate;
pub mod heuristics;
pub mod remote;
pub mod store;

pub use config::{Config, Credentials};
pub use cycle::{Collaborators, CycleOutcome, Orchestrator};
