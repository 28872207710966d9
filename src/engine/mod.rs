// Engine orchestration: polling session lifecycle and status-change detection.

pub mod controller;
pub mod detector;
pub mod session;
pub mod stats;
