pub mod candidates;
pub mod consistency;
pub mod join;
pub mod metrics;
