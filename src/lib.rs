mod analyzer;
mod cache;
mod classfile;
mod endpoints;
mod error;
mod report;
mod signals;
mod walker;
#[cfg(test)]
mod test_harness;

pub use analyzer::{
    AnalyzeOptions, StageTimings, analyze, analyze_with_options, analyze_with_timings,
};
pub use endpoints::mapping::HttpVerb;
pub use error::AnalysisError;
pub use report::{
    AnalysisSummary, ApiEndpoint, MethodDetails, Report, TransactionAttributes, VerbDistribution,
};
