//! Muster gateway - protocol and transport between the party service and
//! its platform adapters

pub mod client;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod server;

pub use client::AdapterClient;
pub use error::{Error, Result};
pub use protocol::{Message, RoleSlot, RosterView, ViewKind};
pub use server::{AdapterEvent, Gateway};
