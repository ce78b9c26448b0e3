//! Application services: counting policies over the counter store capability.

pub mod clock;
pub mod error;
pub mod store;
pub mod views;
pub mod visits;
