pub mod fixtures;
pub mod service;

pub use fixtures::*;
pub use service::*;
