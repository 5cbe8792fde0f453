pub mod label_pipeline;
pub mod sort_pipeline;

pub use label_pipeline::LabelPipeline;
pub use sort_pipeline::SortPipeline;
