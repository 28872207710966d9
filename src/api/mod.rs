// Outward-facing surface: collaborator traits, terminal views, logging setup.

pub mod logging;
pub mod observers;
pub mod terminal;
