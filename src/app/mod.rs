pub mod pipelines;

pub use pipelines::{LabelPipeline, SortPipeline};
