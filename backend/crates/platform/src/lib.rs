//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC-signed tokens, Base64)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie management and client fingerprinting
//! - Environment configuration helpers
//! - Response normalization middleware

pub mod client;
pub mod config;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod response;
