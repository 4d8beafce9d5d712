// Engine orchestration: session lifecycle, anchor binding and per-frame dispatch.

pub mod dispatch;
pub mod events;
pub mod registry;
pub mod resize;
pub mod session;
pub mod stats;
pub mod status;
pub mod system;
pub mod warmup;
