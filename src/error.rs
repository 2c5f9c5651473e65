use thiserror::Error;

/// Failures of the analysis core. Row-level problems never show up here; they
/// are recorded as [`crate::match_table::DropReason`] instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("no valid matches left after cleaning")]
    EmptyDataset,
    #[error("need at least {required} qualifying teams, found {found}")]
    InsufficientQualifyingTeams { found: usize, required: usize },
    #[error("paired samples differ in length ({left} vs {right})")]
    MismatchedSamples { left: usize, right: usize },
    #[error("sample has zero variance; {0} is undefined")]
    DegenerateSample(&'static str),
}
