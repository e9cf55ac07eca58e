// src/core/mod.rs

pub mod help;
pub mod maker;
pub mod output;
pub mod registry;
pub mod target;
