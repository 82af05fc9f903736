//! Outbound adapters implementing domain ports.
//!
//! - **http**: reqwest-backed gateways for the LogiTrack backend
//! - **storage**: file-backed durable session storage
//! - **notifications**: terminal notifier
//!
//! Adapters translate between domain types and transport representations;
//! they hold no business rules.

pub mod http;
pub mod notifications;
pub mod storage;
