use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cache::DecodeCache;
use crate::classfile::ClassView;
use crate::endpoints::discovery;
use crate::endpoints::mapping::{self, ClassMapping, MethodMapping};
use crate::endpoints::validation;
use crate::error::AnalysisError;
use crate::report::{self, ApiEndpoint, MethodDetails, Report, TransactionAttributes};
use crate::signals::transaction::transaction_flags;
use crate::signals::{MutationClassifier, SignalContext};
use crate::walker::ArchiveWalker;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Knobs for one analysis run.
#[derive(Clone, Debug)]
pub struct AnalyzeOptions {
    /// Wall-clock budget, enforced at class-entry granularity.
    pub timeout: Duration,
    /// Cooperative cancellation flag, checked at class-entry granularity.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cancel: None,
        }
    }
}

/// Stage breakdown for `--timing` output.
#[derive(Clone, Copy, Debug, Default)]
pub struct StageTimings {
    pub walk_ms: u128,
    pub decode_ms: u128,
    pub endpoints_ms: u128,
    pub report_ms: u128,
    pub class_count: usize,
    pub endpoint_count: usize,
}

/// Analyze a WAR archive with default options.
pub fn analyze(archive_path: &Path) -> Result<Report, AnalysisError> {
    analyze_with_options(archive_path, &AnalyzeOptions::default())
}

pub fn analyze_with_options(
    archive_path: &Path,
    options: &AnalyzeOptions,
) -> Result<Report, AnalysisError> {
    analyze_with_timings(archive_path, options).map(|(report, _)| report)
}

pub fn analyze_with_timings(
    archive_path: &Path,
    options: &AnalyzeOptions,
) -> Result<(Report, StageTimings), AnalysisError> {
    let run_started = Instant::now();
    let deadline = run_started + options.timeout;

    let walk_started = Instant::now();
    let walker = ArchiveWalker::open(archive_path)?;
    let mut entries = Vec::new();
    for entry in walker {
        check_granule(options, deadline)?;
        entries.push(entry);
    }
    let walk_ms = walk_started.elapsed().as_millis();
    let class_count = entries.len();

    // Decode in parallel; the indexed collect preserves archive order so
    // endpoint emission stays deterministic. Workers bail out early once
    // the run is cancelled or past its deadline.
    let decode_started = Instant::now();
    let cache = DecodeCache::new();
    let views: Vec<Option<Arc<ClassView>>> = entries
        .par_iter()
        .map(|entry| {
            if cancel_requested(options) || Instant::now() >= deadline {
                return None;
            }
            match cache.get_or_decode(entry) {
                Ok(view) => Some(view),
                Err(err) => {
                    warn!(
                        origin = %entry.origin,
                        entry = entry.path.as_str(),
                        %err,
                        "skipping undecodable class entry"
                    );
                    None
                }
            }
        })
        .collect();
    check_granule(options, deadline)?;
    drop(entries);
    let decode_ms = decode_started.elapsed().as_millis();

    let endpoints_started = Instant::now();
    let apis = derive_endpoints(views.into_iter().flatten());
    let endpoints_ms = endpoints_started.elapsed().as_millis();

    let report_started = Instant::now();
    let war_file_name = archive_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| archive_path.display().to_string());
    let report = report::assemble(war_file_name, apis);
    let report_ms = report_started.elapsed().as_millis();

    let timings = StageTimings {
        walk_ms,
        decode_ms,
        endpoints_ms,
        report_ms,
        class_count,
        endpoint_count: report.total_apis,
    };
    Ok((report, timings))
}

fn derive_endpoints(views: impl Iterator<Item = Arc<ClassView>>) -> Vec<ApiEndpoint> {
    let classifier = MutationClassifier::new();
    let mut apis = Vec::new();
    for view in views {
        if !discovery::is_handler_class(&view) {
            continue;
        }
        let class_mapping = ClassMapping::from_class(&view);
        let controller_class = view.dotted_name();
        for handler in discovery::handler_methods(&view) {
            let mut seen = HashSet::new();
            for (annotation, kind) in &handler.mappings {
                let method_mapping = MethodMapping::from_annotation(annotation, *kind);
                let produces = override_or(&method_mapping.produces, &class_mapping.produces);
                let consumes = override_or(&method_mapping.consumes, &class_mapping.consumes);
                for (path, verb) in mapping::compose(&class_mapping, &method_mapping) {
                    if !seen.insert((path.clone(), verb)) {
                        continue;
                    }
                    let verdict = classifier.classify(&SignalContext {
                        class: &view,
                        method: handler.method,
                        verbs: &[verb],
                    });
                    debug!(
                        class = controller_class.as_str(),
                        method = handler.method.name.as_str(),
                        descriptor = handler.method.descriptor.as_str(),
                        %verb,
                        alters_state = verdict.alters_state,
                        confidence = verdict.confidence,
                        fired = ?verdict.fired,
                        "classified endpoint"
                    );
                    let (is_transactional, read_only) = transaction_flags(&view, handler.method);
                    apis.push(ApiEndpoint {
                        api_url: if path.is_empty() { "/".to_string() } else { path },
                        http_method: verb,
                        controller_class: controller_class.clone(),
                        controller_method: handler.method.name.clone(),
                        alters_state: verdict.alters_state,
                        validation: validation::collect(handler.method),
                        method_details: MethodDetails {
                            return_type: handler.method.signature.return_type.to_string(),
                            parameter_types: handler
                                .method
                                .signature
                                .parameters
                                .iter()
                                .map(|parameter| parameter.to_string())
                                .collect(),
                            annotations: handler
                                .method
                                .annotations
                                .iter()
                                .map(|annotation| annotation.display_form())
                                .collect(),
                            transaction_attributes: TransactionAttributes {
                                is_transactional,
                                read_only,
                            },
                            produces: produces.clone(),
                            consumes: consumes.clone(),
                        },
                    });
                }
            }
        }
    }
    apis
}

fn override_or(method_level: &[String], class_level: &[String]) -> Vec<String> {
    if method_level.is_empty() {
        class_level.to_vec()
    } else {
        method_level.to_vec()
    }
}

fn cancel_requested(options: &AnalyzeOptions) -> bool {
    options
        .cancel
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

fn check_granule(options: &AnalyzeOptions, deadline: Instant) -> Result<(), AnalysisError> {
    if cancel_requested(options) {
        return Err(AnalysisError::AnalysisCancelled);
    }
    if Instant::now() >= deadline {
        return Err(AnalysisError::AnalysisTimeout {
            limit: options.timeout,
        });
    }
    Ok(())
}
