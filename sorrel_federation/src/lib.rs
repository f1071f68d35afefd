pub mod addresses;
pub mod agent;
pub mod constants;
pub mod deliver;
pub mod deserialization;
pub mod fetch;
pub mod http_client;
pub mod http_signatures;
pub mod jrd;
pub mod utils;
