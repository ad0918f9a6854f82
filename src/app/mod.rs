pub mod pipelines;
pub mod registry;
