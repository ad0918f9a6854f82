pub mod engine;

pub use crate::domain::model::{AnnotationItem, AnnotationTarget, RawRecord};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
