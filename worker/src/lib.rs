//! # Combat Worker Library
//!
//! The authoritative combat-resolution core. It runs isolated from the
//! transport-facing coordinator and shares nothing with it: every piece of
//! state it needs arrives as a message, and the only thing it sends back is a
//! hit notification.
//!
//! ## Core Responsibilities
//!
//! ### Registry Mirroring
//! Keeps a copy of the coordinator's character map, rebuilt from full
//! snapshots and single-character upserts. The coordinator stays authoritative
//! for positions; the worker never pushes registry state back.
//!
//! ### Attack Queueing
//! Attack intents are turned into axis-aligned hitboxes with the same
//! derivation the coordinator uses for its broadcast, then queued. Diagonal
//! directions produce no hitbox and are dropped.
//!
//! ### Collision Resolution
//! On every tick each queued attack is tested against every mirrored
//! character. Hits remove the victim and notify the coordinator; misses are
//! silent. Each attack is resolved exactly once.
//!
//! ## Architecture Design
//!
//! ### Single-Task Event Loop
//! Messages and timer ticks are handled one at a time on a single task, so
//! the registry and queue need no locks. Inbound messages and ticks
//! interleave; an attack can be resolved against a position that is one
//! update stale.
//!
//! ### Fixed Tick Rate
//! The loop ticks every 20ms (50Hz). A late tick is skipped rather than
//! replayed.
//!
//! ## Module Organization
//!
//! ### Registry Module (`registry`)
//! The mirrored character map.
//!
//! ### Engine Module (`engine`)
//! Message application and the per-tick collision pass.
//!
//! ### Scheduler Module (`scheduler`)
//! The tick loop, its control handle and the events it consumes.
//!
//! ### Channel Module (`channel`)
//! Line-framed reader and writer tasks for running the worker as a separate
//! process over stdio.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use shared::{AttackIntent, Character, Direction, Message};
//! use worker::scheduler::{default_tick_period, Worker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut handle = Worker::spawn(default_tick_period());
//!
//!     handle.send(Message::snapshot(&[
//!         Character::new("h1", 0.0, 0.0),
//!         Character::new("h2", 0.0, 150.0),
//!     ]));
//!     handle.send(Message::AttackSubmit(AttackIntent {
//!         attacker_id: "h1".to_string(),
//!         x: 0.0,
//!         y: 0.0,
//!         direction: Direction::Down,
//!     }));
//!
//!     // Resolved on the next tick
//!     if let Some(Message::HitNotification(victim)) = handle.recv().await {
//!         println!("{} was hit", victim);
//!     }
//! }
//! ```

pub mod channel;
pub mod engine;
pub mod registry;
pub mod scheduler;
