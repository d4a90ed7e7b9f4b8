// Library exports for the bikefit CLI
// This allows testing of internal modules

pub mod capture;
pub mod commands;
pub mod config;
pub mod storage;
pub mod ui;
