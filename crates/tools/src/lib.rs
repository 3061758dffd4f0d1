//! Lookup-table tools for the LearnCoach agents.
//!
//! Each agent exposes a fixed tool set to the model. Every tool is a pure
//! keyed lookup over static tables with a default branch: unknown topics,
//! levels or difficulties fall back to generic content instead of failing.
//! The only error a tool reports is an argument it cannot read.

pub mod assessment;
pub mod curriculum;
pub mod practice;
pub mod progress;
pub mod teaching;

use learncoach_core::error::ToolError;
use learncoach_core::tool::ToolRegistry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Tools for the assessment agent, profiling for `subject` unless the model
/// names another.
pub fn assessment_registry(subject: &str) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(assessment::AssessLearningProfileTool::new(subject)));
    registry.register(Box::new(assessment::AnalyzeStudentInputTool));
    registry.register(Box::new(assessment::AssessWithCodeSampleTool));
    registry
}

/// Tools for the curriculum agent.
pub fn curriculum_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(curriculum::GenerateCurriculumTool));
    registry
}

/// Tools for the teaching agent.
pub fn teaching_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(teaching::TeachConceptTool));
    registry
}

/// Tools for the practice agent.
pub fn practice_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(practice::GenerateExerciseTool));
    registry
}

/// Tools for the progress agent.
pub fn progress_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(progress::TrackProgressTool));
    registry.register(Box::new(progress::ProgressReportTool));
    registry.register(Box::new(progress::SuggestNextStepsTool));
    registry
}

/// The tool set for an agent by name.
pub fn registry_for(agent: &str, subject: &str) -> Option<ToolRegistry> {
    match agent {
        "assessment" => Some(assessment_registry(subject)),
        "curriculum" => Some(curriculum_registry()),
        "teaching" => Some(teaching_registry()),
        "practice" => Some(practice_registry()),
        "progress" => Some(progress_registry()),
        _ => None,
    }
}

/// Deserialize tool arguments, naming the tool on failure.
pub(crate) fn parse_args<T: DeserializeOwned>(
    tool_name: &str,
    arguments: serde_json::Value,
) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool_name: tool_name.to_string(),
        reason: e.to_string(),
    })
}

/// Models send counts as integers, floats or strings.
pub(crate) fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let count = match &value {
        serde_json::Value::Number(n) => {
            n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
        }
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.max(0.0) as u64),
        serde_json::Value::Null => Some(0),
        _ => None,
    };
    count
        .map(|c| c.min(u32::MAX as u64) as u32)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a count, got {value}")))
}

/// Lists arrive either as a comma-separated string or a JSON array.
pub(crate) fn lenient_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let items = match value {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::String(s) => s.split(',').map(str::to_string).collect(),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        other => return Err(serde::de::Error::custom(format!("expected a list, got {other}"))),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
