//! # Coordinator Library
//!
//! The coordinator's side of combat: it owns the authoritative character
//! roster, relays attack requests, and talks to the isolated combat worker.
//! Session transport and identity generation live elsewhere; this crate takes
//! character ids from its caller.
//!
//! ## Module Organization
//!
//! ### Roster Module (`roster`)
//! Character map plus the messages that keep the worker's mirror in sync:
//! a full snapshot after joins, leaves and movement, or a single upsert.
//! Attack requests are derived here with the same hitbox function the worker
//! uses, so the broadcast rectangle always matches the authoritative one.
//!
//! ### Link Module (`link`)
//! Channel to the worker, either a child process over stdio or a tokio task.
//! Reports hits and, once, the worker's exit. There is no restart.
//!
//! ### Command Module (`command`)
//! Text commands driving the `coordinator` binary.

pub mod command;
pub mod link;
pub mod roster;
