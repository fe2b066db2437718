pub mod cache;
pub mod service_ids;
pub mod token;
