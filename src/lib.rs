//! Parley: multi-agent conversation orchestration.
//!
//! Coordinates a conversation between a human user and a dynamic set of
//! LLM-backed participants: a turn loop decides who speaks next and when
//! the conversation ends, a resilient client bridges turns to remote agent
//! services over a duplex channel, and a durable rendezvous lets an
//! autonomous run pause for human input across transport boundaries.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use parley::bridge::HitlBridge;
//! use parley::store::MemorySlotStore;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let bridge = HitlBridge::new(Arc::new(MemorySlotStore::new()));
//! // an inbound request handler deposits the user's answer:
//! bridge.provide_input("conv-1", "yes, proceed").await?;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod decision;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod participant;
pub mod prelude;
pub mod remote;
pub mod secret;
pub mod store;
pub mod types;
pub mod util;
