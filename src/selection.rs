//! Classification results
//!
//! What the classifier decided for one query: either a methodology with
//! parameters, or a request for more information. Never both.

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::methodology::Methodology;

/// Free-text question plus the artifact it follows up on, if any
#[derive(Debug, Clone, Copy)]
pub struct ResearchQuery<'a> {
    pub text: &'a str,
    pub prior: Option<&'a Artifact>,
}

impl<'a> ResearchQuery<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, prior: None }
    }

    pub fn follow_up(text: &'a str, prior: &'a Artifact) -> Self {
        Self {
            text,
            prior: Some(prior),
        }
    }
}

/// Inputs the executor and plan builder need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchParameters {
    pub audience: String,
    pub research_question: String,
    /// Two or more entries turn a survey into a side-by-side comparison
    #[serde(default)]
    pub segments: Vec<String>,
    #[serde(default)]
    pub sample_size: Option<u32>,
}

impl ResearchParameters {
    pub fn new(audience: impl Into<String>, research_question: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            research_question: research_question.into(),
            segments: Vec::new(),
            sample_size: None,
        }
    }

    pub fn with_segments(mut self, segments: Vec<String>) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_sample_size(mut self, sample_size: u32) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    /// Segments only count once there are at least two of them
    pub fn comparison_segments(&self) -> Option<&[String]> {
        (self.segments.len() >= 2).then_some(self.segments.as_slice())
    }
}

/// Whether a follow-up revises the prior artifact or starts a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpAction {
    Update,
    #[default]
    New,
}

impl FollowUpAction {
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("update") {
            Self::Update
        } else {
            Self::New
        }
    }
}

/// Request for user clarification when the backend explicitly asks for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarificationRequest {
    pub missing_info: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Result of classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum MethodologySelection {
    Methodology {
        methodology: Methodology,
        parameters: ResearchParameters,
        #[serde(default, rename = "followUp")]
        follow_up: FollowUpAction,
    },
    Clarification(ClarificationRequest),
}

impl MethodologySelection {
    /// Survey of the default audience asking the original query
    pub fn default_survey(query: &str, audience: &str) -> Self {
        Self::Methodology {
            methodology: Methodology::Survey,
            parameters: ResearchParameters::new(audience, query.trim()),
            follow_up: FollowUpAction::New,
        }
    }

    pub fn is_clarification(&self) -> bool {
        matches!(self, Self::Clarification(_))
    }

    pub fn methodology(&self) -> Option<Methodology> {
        match self {
            Self::Methodology { methodology, .. } => Some(*methodology),
            Self::Clarification(_) => None,
        }
    }

    pub fn parameters(&self) -> Option<&ResearchParameters> {
        match self {
            Self::Methodology { parameters, .. } => Some(parameters),
            Self::Clarification(_) => None,
        }
    }

    pub fn follow_up(&self) -> FollowUpAction {
        match self {
            Self::Methodology { follow_up, .. } => *follow_up,
            Self::Clarification(_) => FollowUpAction::New,
        }
    }

    pub fn as_clarification(&self) -> Option<&ClarificationRequest> {
        match self {
            Self::Clarification(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_survey() {
        let sel = MethodologySelection::default_survey("  coffee  ", "General Population");
        assert_eq!(sel.methodology(), Some(Methodology::Survey));
        let params = sel.parameters().unwrap();
        assert_eq!(params.audience, "General Population");
        assert_eq!(params.research_question, "coffee");
        assert_eq!(sel.follow_up(), FollowUpAction::New);
        assert!(!sel.is_clarification());
    }

    #[test]
    fn test_comparison_segments_need_two() {
        let params = ResearchParameters::new("Adults", "q").with_segments(vec!["A".into()]);
        assert!(params.comparison_segments().is_none());
        let params = params.with_segments(vec!["A".into(), "B".into()]);
        assert_eq!(params.comparison_segments().unwrap().len(), 2);
    }

    #[test]
    fn test_clarification_has_no_methodology() {
        let sel = MethodologySelection::Clarification(ClarificationRequest {
            missing_info: "Which market?".to_string(),
            suggestions: vec!["US".to_string()],
        });
        assert!(sel.is_clarification());
        assert!(sel.methodology().is_none());
        assert!(sel.parameters().is_none());
    }

    #[test]
    fn test_follow_up_lenient() {
        assert_eq!(FollowUpAction::parse_lenient("UPDATE"), FollowUpAction::Update);
        assert_eq!(FollowUpAction::parse_lenient("refine"), FollowUpAction::New);
    }
}
