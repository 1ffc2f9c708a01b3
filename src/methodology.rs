//! Research methodologies
//!
//! The fixed set of research approaches the classifier can choose from.
//! Dispatch to an execution path is deterministic on the variant.

use serde::{Deserialize, Serialize};

/// A research approach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Methodology {
    /// Quantitative questionnaire, optionally split by segment
    Survey,
    /// Qualitative moderated discussion
    FocusGroup,
    /// Legacy standalone segment comparison (one survey fanned out per segment)
    Comparison,
    /// Attribute-by-segment grid
    Heatmap,
    /// Sentiment distribution
    Sentiment,
}

/// Shape of the canonical artifact a methodology produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodologyType {
    Quantitative,
    Qualitative,
}

/// Which generation routine handles a methodology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPath {
    Survey,
    FocusGroup,
    LegacyComparison,
}

impl Methodology {
    pub const ALL: [Methodology; 5] = [
        Methodology::Survey,
        Methodology::FocusGroup,
        Methodology::Comparison,
        Methodology::Heatmap,
        Methodology::Sentiment,
    ];

    /// Stable identifier used in plans and process-step lookups
    pub fn id(&self) -> &'static str {
        match self {
            Self::Survey => "survey",
            Self::FocusGroup => "focus_group",
            Self::Comparison => "comparison",
            Self::Heatmap => "heatmap",
            Self::Sentiment => "sentiment",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Survey => "Survey",
            Self::FocusGroup => "Focus Group",
            Self::Comparison => "Segment Comparison",
            Self::Heatmap => "Heatmap",
            Self::Sentiment => "Sentiment Analysis",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let normalized = id.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|m| m.id() == normalized)
    }

    pub fn methodology_type(&self) -> MethodologyType {
        match self {
            Self::FocusGroup => MethodologyType::Qualitative,
            _ => MethodologyType::Quantitative,
        }
    }

    /// Heatmap and sentiment are served by the survey generator.
    pub fn execution_path(&self) -> ExecutionPath {
        match self {
            Self::Survey | Self::Heatmap | Self::Sentiment => ExecutionPath::Survey,
            Self::FocusGroup => ExecutionPath::FocusGroup,
            Self::Comparison => ExecutionPath::LegacyComparison,
        }
    }

    /// Name of the classification tool that selects this methodology
    pub fn selection_tool(&self) -> &'static str {
        match self {
            Self::Survey => "select_survey",
            Self::FocusGroup => "select_focus_group",
            Self::Comparison => "select_comparison",
            Self::Heatmap => "select_heatmap",
            Self::Sentiment => "select_sentiment",
        }
    }

    pub fn from_selection_tool(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.selection_tool() == name)
    }

    /// Quick-start tag that forces this methodology offline
    pub fn quick_tag(&self) -> Option<&'static str> {
        match self {
            Self::Survey => Some("#survey"),
            Self::FocusGroup => Some("#focus-group"),
            Self::Comparison => Some("#comparison"),
            Self::Heatmap | Self::Sentiment => None,
        }
    }
}

impl std::fmt::Display for Methodology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
