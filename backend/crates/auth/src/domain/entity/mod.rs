//! Entities

pub mod auth;
pub mod auth_session;
pub mod permission_grant;
pub mod user;
