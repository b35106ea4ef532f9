use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::endpoints::mapping::HttpVerb;

/// Analysis result returned to the caller. Field names are part of the
/// serialized contract.
#[derive(Serialize, Clone, Debug)]
pub struct Report {
    pub war_file_name: String,
    /// ISO-8601 timestamp of the analysis.
    pub analysis_date: String,
    pub total_apis: usize,
    pub analysis_summary: AnalysisSummary,
    pub apis: Vec<ApiEndpoint>,
}

#[derive(Serialize, Clone, Debug)]
pub struct AnalysisSummary {
    pub state_altering_apis: usize,
    pub read_only_apis: usize,
    pub validated_apis: usize,
    pub controller_classes: usize,
    pub http_methods_distribution: VerbDistribution,
}

/// Endpoint counts over the seven canonical verbs.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct VerbDistribution {
    #[serde(rename = "GET")]
    pub get: usize,
    #[serde(rename = "POST")]
    pub post: usize,
    #[serde(rename = "PUT")]
    pub put: usize,
    #[serde(rename = "DELETE")]
    pub delete: usize,
    #[serde(rename = "PATCH")]
    pub patch: usize,
    #[serde(rename = "OPTIONS")]
    pub options: usize,
    #[serde(rename = "HEAD")]
    pub head: usize,
}

impl VerbDistribution {
    fn increment(&mut self, verb: HttpVerb) {
        match verb {
            HttpVerb::Get => self.get += 1,
            HttpVerb::Post => self.post += 1,
            HttpVerb::Put => self.put += 1,
            HttpVerb::Delete => self.delete += 1,
            HttpVerb::Patch => self.patch += 1,
            HttpVerb::Options => self.options += 1,
            HttpVerb::Head => self.head += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.get + self.post + self.put + self.delete + self.patch + self.options + self.head
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct ApiEndpoint {
    pub api_url: String,
    pub http_method: HttpVerb,
    /// Dotted fully-qualified controller class name.
    pub controller_class: String,
    pub controller_method: String,
    pub alters_state: bool,
    pub validation: Vec<String>,
    pub method_details: MethodDetails,
}

#[derive(Serialize, Clone, Debug)]
pub struct MethodDetails {
    pub return_type: String,
    pub parameter_types: Vec<String>,
    /// Method annotations in `@SimpleName` form, declaration order.
    pub annotations: Vec<String>,
    pub transaction_attributes: TransactionAttributes,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
}

#[derive(Serialize, Clone, Copy, Debug, Default)]
pub struct TransactionAttributes {
    pub is_transactional: bool,
    pub read_only: bool,
}

/// Roll the emitted endpoints up into a report, preserving emission order.
pub(crate) fn assemble(war_file_name: String, apis: Vec<ApiEndpoint>) -> Report {
    let mut distribution = VerbDistribution::default();
    let mut state_altering_apis = 0;
    let mut validated_apis = 0;
    let mut controllers = BTreeSet::new();
    for api in &apis {
        distribution.increment(api.http_method);
        if api.alters_state {
            state_altering_apis += 1;
        }
        if !api.validation.is_empty() {
            validated_apis += 1;
        }
        controllers.insert(api.controller_class.as_str());
    }
    let controller_classes = controllers.len();
    Report {
        war_file_name,
        analysis_date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        total_apis: apis.len(),
        analysis_summary: AnalysisSummary {
            state_altering_apis,
            read_only_apis: apis.len() - state_altering_apis,
            validated_apis,
            controller_classes,
            http_methods_distribution: distribution,
        },
        apis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(verb: HttpVerb, alters_state: bool, validation: &[&str]) -> ApiEndpoint {
        ApiEndpoint {
            api_url: "/api/users".to_string(),
            http_method: verb,
            controller_class: "com.ex.UserController".to_string(),
            controller_method: "handle".to_string(),
            alters_state,
            validation: validation.iter().map(|entry| entry.to_string()).collect(),
            method_details: MethodDetails {
                return_type: "void".to_string(),
                parameter_types: Vec::new(),
                annotations: Vec::new(),
                transaction_attributes: TransactionAttributes::default(),
                produces: Vec::new(),
                consumes: Vec::new(),
            },
        }
    }

    #[test]
    fn summary_counts_sum_to_the_total() {
        let report = assemble(
            "app.war".to_string(),
            vec![
                endpoint(HttpVerb::Get, false, &[]),
                endpoint(HttpVerb::Post, true, &["@Valid on parameter 'param0'"]),
                endpoint(HttpVerb::Delete, true, &[]),
            ],
        );

        let summary = &report.analysis_summary;
        assert_eq!(report.total_apis, report.apis.len());
        assert_eq!(
            summary.state_altering_apis + summary.read_only_apis,
            report.total_apis
        );
        assert_eq!(summary.validated_apis, 1);
        assert!(summary.validated_apis <= report.total_apis);
        assert_eq!(summary.controller_classes, 1);
        assert_eq!(summary.http_methods_distribution.total(), report.total_apis);
    }

    #[test]
    fn serialized_shape_uses_the_contract_field_names() {
        let report = assemble(
            "app.war".to_string(),
            vec![endpoint(HttpVerb::Get, false, &[])],
        );

        let value = serde_json::to_value(&report).expect("serialize report");

        assert_eq!(value["war_file_name"], "app.war");
        assert!(value["analysis_date"].is_string());
        assert_eq!(value["total_apis"], 1);
        let summary = &value["analysis_summary"];
        assert_eq!(summary["state_altering_apis"], 0);
        assert_eq!(summary["read_only_apis"], 1);
        assert_eq!(summary["http_methods_distribution"]["GET"], 1);
        assert_eq!(summary["http_methods_distribution"]["HEAD"], 0);
        let api = &value["apis"][0];
        assert_eq!(api["api_url"], "/api/users");
        assert_eq!(api["http_method"], "GET");
        assert_eq!(api["controller_class"], "com.ex.UserController");
        assert_eq!(api["method_details"]["transaction_attributes"]["is_transactional"], false);
    }

    #[test]
    fn empty_reports_are_well_formed() {
        let report = assemble("empty.war".to_string(), Vec::new());

        assert_eq!(report.total_apis, 0);
        assert_eq!(report.analysis_summary.read_only_apis, 0);
        assert_eq!(report.analysis_summary.http_methods_distribution.total(), 0);
    }

    #[test]
    fn analysis_date_is_iso_8601() {
        let report = assemble("app.war".to_string(), Vec::new());

        assert!(
            chrono::DateTime::parse_from_rfc3339(&report.analysis_date).is_ok(),
            "{}",
            report.analysis_date
        );
    }
}
