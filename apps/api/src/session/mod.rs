pub mod context;
pub mod flows;
pub mod handlers;
pub mod resolver;
pub mod store;
