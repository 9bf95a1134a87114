//! Route handlers, one module per resource.

pub mod auth;
pub mod movies;
pub mod notifications;
pub mod rentals;
pub mod wishlist;
pub mod ws;
