// Adapters layer: concrete implementations for external systems (vision service, meal storage).

pub mod http;
pub mod storage;
