//! Progress labels shown while a turn runs
//!
//! Pure lookup; the presentation layer animates through these in order.

use crate::methodology::Methodology;

const SURVEY_STEPS: &[&str] = &[
    "Understanding your question",
    "Defining the target audience",
    "Drafting survey questions",
    "Fielding simulated respondents",
    "Tabulating responses",
    "Preparing results",
];

const FOCUS_GROUP_STEPS: &[&str] = &[
    "Understanding your question",
    "Recruiting participants",
    "Moderating the discussion",
    "Coding themes",
    "Selecting representative quotes",
];

const COMPARISON_STEPS: &[&str] = &[
    "Understanding your question",
    "Identifying segments",
    "Drafting shared questions",
    "Fielding each segment",
    "Comparing segment results",
    "Preparing results",
];

const HEATMAP_STEPS: &[&str] = &[
    "Understanding your question",
    "Selecting attributes",
    "Fielding simulated respondents",
    "Scoring attribute intensity",
    "Rendering the grid",
];

const SENTIMENT_STEPS: &[&str] = &[
    "Understanding your question",
    "Gathering simulated reactions",
    "Scoring sentiment",
    "Grouping by tone",
    "Preparing results",
];

/// Ordered stage labels for a methodology
pub fn process_steps(methodology: Methodology) -> &'static [&'static str] {
    match methodology {
        Methodology::Survey => SURVEY_STEPS,
        Methodology::FocusGroup => FOCUS_GROUP_STEPS,
        Methodology::Comparison => COMPARISON_STEPS,
        Methodology::Heatmap => HEATMAP_STEPS,
        Methodology::Sentiment => SENTIMENT_STEPS,
    }
}

/// Lookup by methodology id; unknown keys get the survey list
pub fn process_steps_for_key(key: &str) -> &'static [&'static str] {
    Methodology::from_id(key)
        .map(process_steps)
        .unwrap_or(SURVEY_STEPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_methodology_has_five_or_six_steps() {
        for m in Methodology::ALL {
            let n = process_steps(m).len();
            assert!((5..=6).contains(&n), "{} has {} steps", m, n);
        }
    }

    #[test]
    fn test_unknown_key_defaults_to_survey() {
        assert_eq!(process_steps_for_key("delphi_panel"), SURVEY_STEPS);
        assert_eq!(process_steps_for_key("focus_group"), FOCUS_GROUP_STEPS);
    }
}
