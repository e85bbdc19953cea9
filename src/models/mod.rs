//! Stored document models and API DTOs for all domain entities.

pub mod audit;
pub mod billing;
pub mod dashboard;
pub mod event;
pub mod job;
pub mod mindmap;
pub mod pagination;
pub mod range;
pub mod security;
pub mod user;
pub mod workspace;
