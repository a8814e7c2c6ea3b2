mod pipeline;

pub use pipeline::{BeliefPipeline, PipelineReport};
