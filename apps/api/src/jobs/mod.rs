pub mod discovery;
pub mod handlers;
