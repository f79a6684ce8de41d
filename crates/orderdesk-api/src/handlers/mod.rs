//! Route handlers, one module per resource

pub mod auth;
pub mod items;
pub mod orders;
pub mod products;
pub mod suppliers;
pub mod system;
pub mod users;
