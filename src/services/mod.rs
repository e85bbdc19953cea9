//! Business logic: store queries plus the pure reducers they feed.

pub mod analytics;
pub mod audit;
pub mod dashboards;
pub mod predictions;
pub mod retention;
pub mod security;
pub mod session;
pub mod teams;
pub mod usage;
pub mod users;
pub mod wallet;
