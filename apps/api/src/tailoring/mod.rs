pub mod flows;
pub mod handlers;
pub mod pipeline;
