//! Canonical research artifact
//!
//! The immutable record one research turn produces. The presentation layer
//! calls it a "Canvas". Both generated and offline artifacts use exactly
//! these types, so consumers never need to know which path produced one.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::methodology::MethodologyType;
use crate::plan_builder::StudyPlan;

/// Value key used when a question has no segments
pub const DEFAULT_SEGMENT: &str = "default";

/// One answer option with a value per segment
///
/// All options in one question share identical keys. Values are
/// percentages but are not required to sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalOption {
    pub label: String,
    pub values: BTreeMap<String, f64>,
}

impl CanonicalOption {
    /// Single-audience option
    pub fn single(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            values: BTreeMap::from([(DEFAULT_SEGMENT.to_string(), value)]),
        }
    }

    /// Value for the default segment, or 0.0
    pub fn value(&self) -> f64 {
        self.segment_value(DEFAULT_SEGMENT)
    }

    pub fn segment_value(&self, segment: &str) -> f64 {
        self.values.get(segment).copied().unwrap_or(0.0)
    }

    pub fn segment_keys(&self) -> BTreeSet<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub id: String,
    pub title: String,
    pub question_text: String,
    pub respondent_count: u32,
    pub options: Vec<CanonicalOption>,
    /// Empty for single-audience questions
    #[serde(default)]
    pub segments: Vec<String>,
}

impl QuestionResult {
    pub fn is_segmented(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Keys every option of this question must carry
    pub fn expected_keys(&self) -> BTreeSet<&str> {
        if self.segments.is_empty() {
            BTreeSet::from([DEFAULT_SEGMENT])
        } else {
            self.segments.iter().map(String::as_str).collect()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl Sentiment {
    /// Lenient parse of a generated sentiment label; unknown labels are neutral
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            "mixed" => Self::Mixed,
            _ => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub attribution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeTheme {
    pub id: String,
    pub topic: String,
    pub sentiment: Sentiment,
    pub summary: String,
    pub quotes: Vec<Quote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    pub id: String,
    pub name: String,
}

impl Audience {
    /// Audience with a slug id derived from its name
    pub fn named(name: &str) -> Self {
        let name = name.trim().trim_start_matches('@').trim();
        let slug = name
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        Self {
            id: if slug.is_empty() {
                "audience".to_string()
            } else {
                slug
            },
            name: name.to_string(),
        }
    }
}

/// Pipeline output for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: Uuid,
    pub title: String,
    pub methodology_type: MethodologyType,
    pub audience: Audience,
    pub respondent_count: u32,
    #[serde(rename = "abstract")]
    pub summary: String,
    #[serde(default)]
    pub questions: Vec<QuestionResult>,
    #[serde(default)]
    pub themes: Vec<QualitativeTheme>,
    pub study_plan: StudyPlan,
    pub created_at: DateTime<Utc>,
}

/// Broken artifact invariant
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactViolation {
    #[error("quantitative artifact has no questions")]
    MissingQuestions,

    #[error("qualitative artifact has no themes")]
    MissingThemes,

    #[error("artifact carries both questions and themes")]
    MixedContent,

    #[error("question '{question}' has no options")]
    EmptyOptions { question: String },

    #[error("option '{option}' of question '{question}' has segment keys {found:?}, expected {expected:?}")]
    SegmentKeyMismatch {
        question: String,
        option: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl Artifact {
    /// Check the structural invariants every returned artifact must satisfy
    pub fn validate(&self) -> Result<(), ArtifactViolation> {
        match self.methodology_type {
            MethodologyType::Quantitative => {
                if !self.themes.is_empty() {
                    return Err(ArtifactViolation::MixedContent);
                }
                if self.questions.is_empty() {
                    return Err(ArtifactViolation::MissingQuestions);
                }
            }
            MethodologyType::Qualitative => {
                if !self.questions.is_empty() {
                    return Err(ArtifactViolation::MixedContent);
                }
                if self.themes.is_empty() {
                    return Err(ArtifactViolation::MissingThemes);
                }
            }
        }

        for question in &self.questions {
            if question.options.is_empty() {
                return Err(ArtifactViolation::EmptyOptions {
                    question: question.id.clone(),
                });
            }
            let expected = question.expected_keys();
            for option in &question.options {
                let found = option.segment_keys();
                if found != expected {
                    return Err(ArtifactViolation::SegmentKeyMismatch {
                        question: question.id.clone(),
                        option: option.label.clone(),
                        expected: expected.iter().map(|s| s.to_string()).collect(),
                        found: found.iter().map(|s| s.to_string()).collect(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn summary_for_follow_up(&self) -> PriorArtifactSummary {
        PriorArtifactSummary {
            id: self.id,
            title: self.title.clone(),
            methodology_type: self.methodology_type,
        }
    }
}

/// What the classifier is told about the artifact a follow-up refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorArtifactSummary {
    pub id: Uuid,
    pub title: String,
    pub methodology_type: MethodologyType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methodology::Methodology;
    use crate::plan_builder::StudyPlanBuilder;
    use crate::selection::ResearchParameters;

    fn plan() -> StudyPlan {
        StudyPlanBuilder::build(
            Methodology::Survey,
            &ResearchParameters::new("Parents", "How do parents pick snacks?"),
        )
    }

    fn question(options: Vec<CanonicalOption>, segments: Vec<String>) -> QuestionResult {
        QuestionResult {
            id: "q1".to_string(),
            title: "Snack Choice".to_string(),
            question_text: "Which snack?".to_string(),
            respondent_count: 500,
            options,
            segments,
        }
    }

    fn artifact(questions: Vec<QuestionResult>, themes: Vec<QualitativeTheme>) -> Artifact {
        Artifact {
            id: Uuid::new_v4(),
            title: "Parents Snack Study".to_string(),
            methodology_type: MethodologyType::Quantitative,
            audience: Audience::named("Parents"),
            respondent_count: 500,
            summary: String::new(),
            questions,
            themes,
            study_plan: plan(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_audience_slug() {
        let audience = Audience::named("@gen-z Coffee Drinkers");
        assert_eq!(audience.id, "gen-z-coffee-drinkers");
        assert_eq!(audience.name, "gen-z Coffee Drinkers");
        assert_eq!(Audience::named("  ").id, "audience");
    }

    #[test]
    fn test_valid_single_audience() {
        let a = artifact(
            vec![question(
                vec![
                    CanonicalOption::single("Fruit", 40.0),
                    CanonicalOption::single("Chips", 60.0),
                ],
                vec![],
            )],
            vec![],
        );
        assert_eq!(a.validate(), Ok(()));
    }

    #[test]
    fn test_missing_questions() {
        let a = artifact(vec![], vec![]);
        assert_eq!(a.validate(), Err(ArtifactViolation::MissingQuestions));
    }

    #[test]
    fn test_mismatched_segment_keys() {
        let segments = vec!["A".to_string(), "B".to_string()];
        let good = CanonicalOption {
            label: "Yes".to_string(),
            values: BTreeMap::from([("A".to_string(), 10.0), ("B".to_string(), 20.0)]),
        };
        let bad = CanonicalOption {
            label: "No".to_string(),
            values: BTreeMap::from([("A".to_string(), 10.0)]),
        };
        let a = artifact(vec![question(vec![good, bad], segments)], vec![]);
        assert!(matches!(
            a.validate(),
            Err(ArtifactViolation::SegmentKeyMismatch { .. })
        ));
    }

    #[test]
    fn test_serialized_shape() {
        let a = artifact(
            vec![question(vec![CanonicalOption::single("Fruit", 40.0)], vec![])],
            vec![],
        );
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["methodologyType"], "quantitative");
        assert!(json.get("abstract").is_some());
        assert_eq!(json["questions"][0]["options"][0]["values"]["default"], 40.0);
        assert_eq!(json["studyPlan"]["methodologyId"], "survey");
    }

    #[test]
    fn test_sentiment_lenient() {
        assert_eq!(Sentiment::parse_lenient("Positive"), Sentiment::Positive);
        assert_eq!(Sentiment::parse_lenient("ambivalent"), Sentiment::Neutral);
    }
}
