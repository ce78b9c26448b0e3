//! Page-view and site-visit counters for a server-rendered blog.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
