//! Async Runtime Module
//!
//! Tokio plumbing that turns the synchronous engine into a live session:
//! real timers, a host command channel and broadcast events.

pub mod driver;

pub use driver::{DriverError, HostCommand, SessionDriver, SessionHandle, EVENT_CHANNEL_CAPACITY};
