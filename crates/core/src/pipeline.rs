//! Request-pipeline assembly surface
//!
//! The engine does not run requests; it only assembles the ordered stage
//! sequence that startup contributions configure during the pipeline phase.
//! The surrounding framework owns what a stage actually does.

use std::sync::Arc;

/// One stage of the request-handling pipeline
pub trait RequestStage: Send + Sync {
    /// Stage name, for diagnostics
    fn name(&self) -> &'static str;
}

/// Ordered accumulation of request-handling stages
#[derive(Default)]
pub struct PipelineBuilder {
    stages: Vec<Arc<dyn RequestStage>>,
}

impl PipelineBuilder {
    /// Create a new, empty pipeline builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage to the end of the pipeline
    pub fn add_stage(&mut self, stage: Arc<dyn RequestStage>) -> &mut Self {
        self.stages.push(stage);
        self
    }

    /// The assembled stages, in configuration order
    pub fn stages(&self) -> &[Arc<dyn RequestStage>] {
        &self.stages
    }

    /// Stage names, in configuration order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Number of assembled stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check whether the pipeline has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("stages", &self.stage_names())
            .finish()
    }
}
