// Adapters layer: concrete implementations for external systems (files, http, processes).

pub mod http;
pub mod launcher;
pub mod readers;
