//! Tool schemas
//!
//! Classification offers one `select_*` tool per methodology plus
//! `request_clarification`. Generation forces exactly one of the
//! `generate_*` tools. The per-segment survey schema is built from the
//! segment list so it can be tested without a backend.

use research_llm::ToolDefinition;
use serde_json::{json, Map, Value};

use crate::methodology::Methodology;

pub const CLARIFICATION_TOOL: &str = "request_clarification";
pub const SURVEY_TOOL: &str = "generate_survey";
pub const SEGMENT_SURVEY_TOOL: &str = "generate_segment_survey";
pub const FOCUS_GROUP_TOOL: &str = "generate_focus_group";

/// Questions per generated survey
pub const SURVEY_QUESTION_COUNT: usize = 3;

fn selection_parameters() -> Value {
    json!({
        "type": "object",
        "properties": {
            "audience": {
                "type": "string",
                "description": "Who is being studied. Infer it from the request; use 'General Population' when nothing narrower is implied."
            },
            "researchQuestion": {
                "type": "string",
                "description": "The research question restated as one clear sentence."
            },
            "segments": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Named sub-audiences to compare side by side. Leave empty unless two or more are named."
            },
            "sampleSize": {
                "type": "integer",
                "minimum": 50,
                "description": "Respondents per segment. Omit to use the default."
            },
            "followUpAction": {
                "type": "string",
                "enum": ["update", "new"],
                "description": "Only for follow-ups: 'update' revises the prior artifact, 'new' starts a separate study."
            }
        },
        "required": ["audience", "researchQuestion"]
    })
}

/// Closed tool set offered to the classifier
pub fn classification_tools() -> Vec<ToolDefinition> {
    let describe = |m: Methodology| match m {
        Methodology::Survey => "Run a quantitative survey. The default choice for almost every question. Pass two or more segments to compare groups within one survey.",
        Methodology::FocusGroup => "Run a qualitative focus group. Only when the user explicitly wants discussion, reasons, feelings in their own words or quotes.",
        Methodology::Comparison => "Run a standalone segment comparison. Only when the user explicitly asks for this comparison format.",
        Methodology::Heatmap => "Score attributes across the audience as a heatmap.",
        Methodology::Sentiment => "Measure sentiment toward a topic.",
    };

    let mut tools: Vec<ToolDefinition> = Methodology::ALL
        .into_iter()
        .map(|m| ToolDefinition::new(m.selection_tool(), describe(m), selection_parameters()))
        .collect();

    tools.push(ToolDefinition::new(
        CLARIFICATION_TOOL,
        "Ask the user for missing information. Last resort: prefer acting on a reasonable inference.",
        json!({
            "type": "object",
            "properties": {
                "missingInfo": {"type": "string", "description": "What is missing, phrased as a question to the user."},
                "suggestions": {"type": "array", "items": {"type": "string"}, "description": "Two to four example answers."}
            },
            "required": ["missingInfo"]
        }),
    ));

    tools
}

fn survey_envelope(option_schema: Value, sample_description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string", "description": "Short study title."},
            "abstract": {"type": "string", "description": "Two or three sentence summary of the findings."},
            "audience": {"type": "string"},
            "sampleSize": {"type": "integer", "minimum": 1, "description": sample_description},
            "questions": {
                "type": "array",
                "minItems": SURVEY_QUESTION_COUNT,
                "maxItems": SURVEY_QUESTION_COUNT,
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "Two to four word chart title."},
                        "questionText": {"type": "string"},
                        "options": {
                            "type": "array",
                            "minItems": 3,
                            "maxItems": 6,
                            "items": option_schema
                        }
                    },
                    "required": ["title", "questionText", "options"]
                }
            }
        },
        "required": ["title", "abstract", "audience", "sampleSize", "questions"]
    })
}

/// Single-audience survey
pub fn survey_tool() -> ToolDefinition {
    let option = json!({
        "type": "object",
        "properties": {
            "label": {"type": "string"},
            "percentage": {"type": "number", "minimum": 0, "maximum": 100}
        },
        "required": ["label", "percentage"]
    });
    ToolDefinition::new(
        SURVEY_TOOL,
        "Return simulated survey results.",
        survey_envelope(option, "Number of respondents."),
    )
}

/// Option schema with one numeric property per segment
pub fn segment_option_schema(segments: &[String]) -> Value {
    let mut properties = Map::new();
    properties.insert("label".to_string(), json!({"type": "string"}));
    let mut required = vec![Value::String("label".to_string())];

    for segment in segments {
        properties.insert(
            segment.clone(),
            json!({
                "type": "number",
                "minimum": 0,
                "maximum": 100,
                "description": format!("Percentage of {} choosing this option.", segment)
            }),
        );
        required.push(Value::String(segment.clone()));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Survey with side-by-side segment columns
pub fn segment_survey_tool(segments: &[String]) -> ToolDefinition {
    ToolDefinition::new(
        SEGMENT_SURVEY_TOOL,
        format!(
            "Return simulated survey results broken down by segment: {}.",
            segments.join(", ")
        ),
        survey_envelope(
            segment_option_schema(segments),
            "Respondents per segment.",
        ),
    )
}

pub fn focus_group_tool() -> ToolDefinition {
    ToolDefinition::new(
        FOCUS_GROUP_TOOL,
        "Return a simulated focus group summary.",
        json!({
            "type": "object",
            "properties": {
                "title": {"type": "string"},
                "abstract": {"type": "string"},
                "audience": {"type": "string"},
                "participantCount": {"type": "integer", "minimum": 4, "maximum": 12},
                "themes": {
                    "type": "array",
                    "minItems": 3,
                    "maxItems": 4,
                    "items": {
                        "type": "object",
                        "properties": {
                            "topic": {"type": "string", "description": "Standalone 2-4 word header, readable without context."},
                            "sentiment": {"type": "string", "enum": ["positive", "negative", "neutral", "mixed"]},
                            "summary": {"type": "string"},
                            "quotes": {
                                "type": "array",
                                "minItems": 2,
                                "maxItems": 3,
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "text": {"type": "string"},
                                        "attribution": {"type": "string", "description": "First name and age, e.g. 'Maya, 29'."}
                                    },
                                    "required": ["text", "attribution"]
                                }
                            }
                        },
                        "required": ["topic", "sentiment", "summary", "quotes"]
                    }
                }
            },
            "required": ["title", "abstract", "audience", "participantCount", "themes"]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_tools_cover_every_methodology() {
        let tools = classification_tools();
        assert_eq!(tools.len(), Methodology::ALL.len() + 1);
        for m in Methodology::ALL {
            assert!(tools.iter().any(|t| t.name == m.selection_tool()));
        }
        assert!(tools.iter().any(|t| t.name == CLARIFICATION_TOOL));
    }

    #[test]
    fn test_segment_schema_has_one_property_per_segment() {
        let segments: Vec<String> = vec!["Gen Z".into(), "Millennials".into(), "Boomers".into()];
        let schema = segment_option_schema(&segments);
        let props = schema["properties"].as_object().unwrap();
        assert_eq!(props.len(), 4);
        for s in &segments {
            assert_eq!(props[s]["type"], "number");
        }
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(required, vec!["label", "Gen Z", "Millennials", "Boomers"]);
    }

    #[test]
    fn test_segment_survey_tool_nests_option_schema() {
        let segments: Vec<String> = vec!["A".into(), "B".into()];
        let tool = segment_survey_tool(&segments);
        assert_eq!(tool.name, SEGMENT_SURVEY_TOOL);
        let option = &tool.parameters["properties"]["questions"]["items"]["properties"]["options"]["items"];
        assert_eq!(option, &segment_option_schema(&segments));
    }

    #[test]
    fn test_schemas_compile() {
        let segments = vec!["X".to_string(), "Y".to_string()];
        for tool in [survey_tool(), focus_group_tool(), segment_survey_tool(&segments)] {
            assert!(jsonschema::validator_for(&tool.parameters).is_ok(), "{}", tool.name);
        }
    }
}
