// src/handlers/mod.rs
pub mod error;
pub mod import;
pub mod session;
