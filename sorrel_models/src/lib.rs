pub mod attachments;
pub mod background_jobs;
pub mod database;
pub mod posts;
pub mod profiles;
pub mod relationships;
pub mod users;
