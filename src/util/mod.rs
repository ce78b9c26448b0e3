pub mod lock;
pub mod timezone;
