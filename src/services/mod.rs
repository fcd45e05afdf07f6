// src/services/mod.rs
pub mod calculations;
pub mod comparison;
pub mod indices;
pub mod market_history;
pub mod normalizer;
pub mod profile;
pub mod returns;
pub mod session;
pub mod storage;
pub mod year_range;
