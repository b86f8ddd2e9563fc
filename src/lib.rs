// Library exports for the Simherd fleet supervisor

pub mod capacity;
pub mod cli;
pub mod config;
pub mod error;
pub mod fleet;
pub mod logs;
pub mod provision;
