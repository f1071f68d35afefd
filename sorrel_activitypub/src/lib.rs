pub mod actors;
pub mod adapters;
pub mod agent;
pub mod authentication;
pub mod builders;
pub mod contexts;
pub mod deliverer;
pub mod errors;
pub mod handlers;
pub mod identifiers;
pub mod importers;
pub mod microsyntax;
pub mod queues;
pub mod vocabulary;
