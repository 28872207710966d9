// Fetch backends: the tracking endpoint client and its wire schema.

pub mod http_source;
pub mod traits;
pub mod wire;
