//! Session-keyed notification engine for Frent.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `token` | Bearer credential validation (and issuance for login) |
//! | `session` | Identity → live connection handle registry |
//! | `connection` | `on_connect` / `on_disconnect` hooks for the transport |
//! | `dispatch` | Targeted and broadcast delivery, dead-handle eviction |
//! | `sweep` | Overdue auto-return and due-soon warnings, plus the scheduler |
//! | `availability` | Wishlist notifications on availability and price changes |
//!
//! ## Data flow
//!
//! transport → `connection` (validate, register) → `session`.
//! `sweep` / `availability` → `dispatch` → `session` lookup → handle write.

pub mod availability;
pub mod connection;
pub mod dispatch;
pub mod session;
pub mod sweep;
pub mod token;

#[cfg(test)]
mod testutil;

pub use availability::AvailabilityNotifier;
pub use connection::{Connection, ConnectionManager};
pub use dispatch::{BroadcastSummary, Delivery, NotificationDispatcher};
pub use session::{SessionHandle, SessionRegistry};
pub use sweep::{RentalLifecycleSweeper, SweepReport, spawn_sweep_scheduler};
pub use token::{Claims, SigningKey, TokenError, TokenIssuer, TokenValidator};
