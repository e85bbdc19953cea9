//! Request guards: session authentication, role gates, CSRF.

pub mod auth;
pub mod csrf;
pub mod rbac;
