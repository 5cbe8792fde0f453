pub mod aggregate;
pub mod etl;
pub mod matcher;
pub mod normalize;

pub use crate::domain::model::{AggregatedLine, OrderLine, PageRecord};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
