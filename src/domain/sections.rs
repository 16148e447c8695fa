//! Typed views of the JSON sub-sections embedded in an [`Analysis`].
//!
//! The backend stores each section as a JSON string. A section that is
//! missing, blank or does not parse is simply absent: nothing is rendered for
//! it and no error is raised.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::models::Analysis;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SymptomAnalysis {
    pub issue_type: String,
    pub affected_components: Vec<String>,
    pub severity_assessment: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataCorrelation {
    pub metric: String,
    pub observation: String,
    pub baseline: String,
    pub significance: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RootCauseAnalysis {
    pub primary_cause: String,
    pub contributing_factors: Vec<String>,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemediationStep {
    pub action: String,
    pub risk_level: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImmediateRemediation {
    pub steps: Vec<RemediationStep>,
    pub estimated_impact: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreventionRecommendations {
    pub short_term: Vec<String>,
    pub long_term: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimilarTicket {
    pub ticket_id: String,
    pub resolution: String,
    pub relevance: String,
}

/// All sub-sections of one analysis, each present only if it parsed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisSections {
    pub symptoms: Option<SymptomAnalysis>,
    pub correlations: Option<Vec<DataCorrelation>>,
    pub root_cause: Option<RootCauseAnalysis>,
    pub remediation: Option<ImmediateRemediation>,
    pub prevention: Option<PreventionRecommendations>,
    pub similar_tickets: Option<Vec<SimilarTicket>>,
}

/// Parses an optional JSON string, treating anything unusable as absent.
pub fn parse_section<T: DeserializeOwned>(raw: Option<&str>) -> Option<T> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}

/// True when `raw` is blank or valid JSON. Used to flag editor input.
pub fn is_valid_section_json(raw: &str) -> bool {
    raw.trim().is_empty() || serde_json::from_str::<serde_json::Value>(raw).is_ok()
}

impl AnalysisSections {
    pub fn parse(analysis: &Analysis) -> Self {
        Self {
            symptoms: parse_section(analysis.symptom_analysis_json.as_deref()),
            correlations: parse_section(analysis.data_correlations_json.as_deref()),
            root_cause: parse_section(analysis.root_cause_analysis_json.as_deref()),
            remediation: parse_section(analysis.immediate_remediation_json.as_deref()),
            prevention: parse_section(analysis.prevention_recommendations_json.as_deref()),
            similar_tickets: parse_section(analysis.similar_tickets_json.as_deref()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
