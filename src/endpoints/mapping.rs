use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::classfile::{AnnotationUse, AnnotationValue, ClassView};

use super::markers::{self, MappingKind};

/// The seven canonical HTTP methods.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpVerb {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(rename = "PATCH")]
    Patch,
    #[serde(rename = "OPTIONS")]
    Options,
    #[serde(rename = "HEAD")]
    Head,
}

impl HttpVerb {
    pub const ALL: [HttpVerb; 7] = [
        HttpVerb::Get,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Delete,
        HttpVerb::Patch,
        HttpVerb::Options,
        HttpVerb::Head,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Options => "OPTIONS",
            HttpVerb::Head => "HEAD",
        }
    }

    /// POST, PUT, DELETE and PATCH imply state mutation on their own.
    pub(crate) fn is_mutating(self) -> bool {
        matches!(
            self,
            HttpVerb::Post | HttpVerb::Put | HttpVerb::Delete | HttpVerb::Patch
        )
    }

    /// Map a `RequestMethod` enum constant. Anything outside the seven
    /// canonical verbs (e.g. `TRACE`) is dropped.
    fn from_request_method(constant: &str) -> Option<Self> {
        HttpVerb::ALL
            .into_iter()
            .find(|verb| verb.as_str() == constant)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MappingKind {
    /// Verb implied by a verb-specific mapping annotation with no
    /// explicit `method` attribute. The generic mapping implies nothing.
    fn default_verb(self) -> Option<HttpVerb> {
        match self {
            MappingKind::Request => None,
            MappingKind::Get => Some(HttpVerb::Get),
            MappingKind::Post => Some(HttpVerb::Post),
            MappingKind::Put => Some(HttpVerb::Put),
            MappingKind::Delete => Some(HttpVerb::Delete),
            MappingKind::Patch => Some(HttpVerb::Patch),
        }
    }
}

/// Base mapping declared on the controller class, all sets possibly empty.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClassMapping {
    pub(crate) paths: Vec<String>,
    pub(crate) verbs: Vec<HttpVerb>,
    pub(crate) produces: Vec<String>,
    pub(crate) consumes: Vec<String>,
}

impl ClassMapping {
    /// Extract the class-level generic request mapping, if present.
    pub(crate) fn from_class(class: &ClassView) -> Self {
        class
            .annotations
            .iter()
            .find(|annotation| markers::mapping_kind(annotation) == Some(MappingKind::Request))
            .map(|annotation| {
                let parts = MappingParts::extract(annotation);
                Self {
                    paths: parts.paths,
                    verbs: parts.verbs,
                    produces: parts.produces,
                    consumes: parts.consumes,
                }
            })
            .unwrap_or_default()
    }
}

/// Mapping declared on one handler-method annotation.
#[derive(Clone, Debug)]
pub(crate) struct MethodMapping {
    pub(crate) paths: Vec<String>,
    pub(crate) verbs: Vec<HttpVerb>,
    pub(crate) produces: Vec<String>,
    pub(crate) consumes: Vec<String>,
}

impl MethodMapping {
    pub(crate) fn from_annotation(annotation: &AnnotationUse, kind: MappingKind) -> Self {
        let parts = MappingParts::extract(annotation);
        let mut verbs = parts.verbs;
        if verbs.is_empty()
            && let Some(default) = kind.default_verb()
        {
            verbs.push(default);
        }
        Self {
            paths: parts.paths,
            verbs,
            produces: parts.produces,
            consumes: parts.consumes,
        }
    }
}

struct MappingParts {
    paths: Vec<String>,
    verbs: Vec<HttpVerb>,
    produces: Vec<String>,
    consumes: Vec<String>,
}

impl MappingParts {
    fn extract(annotation: &AnnotationUse) -> Self {
        let paths = annotation
            .element("value")
            .or_else(|| annotation.element("path"))
            .map(string_list)
            .unwrap_or_default()
            .into_iter()
            .map(|path| normalize_leading_slash(&path))
            .collect();
        let verbs = annotation
            .element("method")
            .map(verb_list)
            .unwrap_or_default();
        let produces = annotation
            .element("produces")
            .map(string_list)
            .unwrap_or_default();
        let consumes = annotation
            .element("consumes")
            .map(string_list)
            .unwrap_or_default();
        Self {
            paths,
            verbs,
            produces,
            consumes,
        }
    }
}

fn string_list(value: &AnnotationValue) -> Vec<String> {
    match value.expect_sequence() {
        Ok(values) => values
            .iter()
            .filter_map(|value| value.expect_str().ok())
            .map(str::to_string)
            .collect(),
        Err(_) => value
            .expect_str()
            .ok()
            .map(|text| vec![text.to_string()])
            .unwrap_or_default(),
    }
}

fn verb_list(value: &AnnotationValue) -> Vec<HttpVerb> {
    match value.expect_sequence() {
        Ok(values) => values
            .iter()
            .filter_map(|value| value.expect_enum_constant().ok())
            .filter_map(HttpVerb::from_request_method)
            .collect(),
        Err(_) => value
            .expect_enum_constant()
            .ok()
            .and_then(HttpVerb::from_request_method)
            .map(|verb| vec![verb])
            .unwrap_or_default(),
    }
}

fn normalize_leading_slash(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Join base and tail with exactly one separating slash. An empty side
/// yields the other side verbatim.
fn join_paths(base: &str, tail: &str) -> String {
    if base.is_empty() {
        return tail.to_string();
    }
    if tail.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        tail.trim_start_matches('/')
    )
}

/// Compose class and method mappings into concrete `(path, verb)` pairs:
/// Cartesian product of paths, method verbs over class verbs over the
/// documented `GET` fallback. Duplicates collapse, first occurrence wins.
pub(crate) fn compose(class: &ClassMapping, method: &MethodMapping) -> Vec<(String, HttpVerb)> {
    let verbs: &[HttpVerb] = if !method.verbs.is_empty() {
        &method.verbs
    } else if !class.verbs.is_empty() {
        &class.verbs
    } else {
        &[HttpVerb::Get]
    };

    let paths: Vec<String> = match (class.paths.is_empty(), method.paths.is_empty()) {
        (true, true) => vec![String::new()],
        (false, true) => class.paths.clone(),
        (true, false) => method.paths.clone(),
        (false, false) => class
            .paths
            .iter()
            .flat_map(|base| method.paths.iter().map(|tail| join_paths(base, tail)))
            .collect(),
    };

    let mut seen = HashSet::new();
    let mut pairs = Vec::new();
    for path in &paths {
        for verb in verbs {
            if seen.insert((path.clone(), *verb)) {
                pairs.push((path.clone(), *verb));
            }
        }
    }
    pairs
}
