//! Muster Core Library
//!
//! Role catalog, party model, registry, roster transition logic, close
//! authorization, and auto-close policy for the Muster party-formation
//! service. Everything here is platform-agnostic; rendering and delivery
//! live behind the event stream.

mod autoclose;
pub mod catalog;
pub mod event;
pub mod invariants;
pub mod models;
pub mod outcome;
pub mod policy;
pub mod registry;
pub mod roster;
pub mod service;

pub use catalog::{Role, CLOSE_TOKEN, MAX_PARTY_SIZE};
pub use event::PartyEvent;
pub use models::*;
pub use outcome::{CloseOutcome, JoinOutcome, LeaveOutcome, RemoveOutcome};
pub use registry::PartyRegistry;
pub use service::PartyService;
