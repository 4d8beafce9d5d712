// Host-facing surface: component hook adapter and logging setup.

pub mod host;
pub mod logging;

pub use host::HostAdapter;
pub use logging::init_tracing;
