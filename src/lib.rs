pub mod app;
pub mod capability;
pub mod config;
pub mod control;
pub mod export;
pub mod prefs;
pub mod render;
pub mod shading;
pub mod telemetry;
pub mod terminal;
