pub mod api;
pub mod events;
pub mod filter;
pub mod models;
pub mod validate;
