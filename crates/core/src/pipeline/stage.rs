use std::fmt;

use serde::Serialize;

/// States of a single pipeline run.
///
/// Runs move forward through the stages in declaration order and end in
/// either `Done` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    LoadingReferences,
    Parsing,
    Enriching,
    Partitioning,
    Persisting,
    Finalizing,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::LoadingReferences => "loading_references",
            PipelineStage::Parsing => "parsing",
            PipelineStage::Enriching => "enriching",
            PipelineStage::Partitioning => "partitioning",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Finalizing => "finalizing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
