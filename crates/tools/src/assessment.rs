//! Assessment tools: learning profile, self-description and code-sample heuristics.
//!
//! [`analyze_student_input`] and [`assess_code_sample`] are also used outside
//! the tool loop to infer a skill level from a raw message.

use async_trait::async_trait;
use learncoach_core::error::ToolError;
use learncoach_core::tool::Tool;
use serde::{Deserialize, Serialize};

use crate::parse_args;

struct LevelProfile {
    level: &'static str,
    score: u8,
    pace: &'static str,
    depth: &'static str,
    topics: [&'static str; 4],
}

const LEVEL_PROFILES: [LevelProfile; 3] = [
    LevelProfile {
        level: "beginner",
        score: 1,
        pace: "slow",
        depth: "fundamentals",
        topics: ["variables", "data types", "basic operators", "if/else"],
    },
    LevelProfile {
        level: "intermediate",
        score: 2,
        pace: "moderate",
        depth: "concepts",
        topics: ["functions", "OOP", "file I/O", "error handling"],
    },
    LevelProfile {
        level: "advanced",
        score: 3,
        pace: "fast",
        depth: "advanced_topics",
        topics: ["decorators", "generators", "async/await", "metaclasses"],
    },
];

fn profile_for(experience: &str) -> &'static LevelProfile {
    let key = experience.to_lowercase();
    LEVEL_PROFILES
        .iter()
        .find(|p| p.level == key)
        .unwrap_or(&LEVEL_PROFILES[0])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentAnalysis {
    pub detected_experience: &'static str,
    pub detected_learning_style: &'static str,
    pub analysis_complete: bool,
}

/// Keyword heuristics over a student's self-description.
pub fn analyze_student_input(student_input: &str) -> StudentAnalysis {
    let input = student_input.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| input.contains(w));

    let experience = if mentions(&["expert", "advanced", "senior", "years of"]) {
        "advanced"
    } else if mentions(&["intermediate", "some experience", "basic knowledge"]) {
        "intermediate"
    } else {
        "beginner"
    };

    let learning_style = if mentions(&["visual", "see", "watch", "diagram"]) {
        "visual"
    } else if mentions(&["audio", "listen", "hear", "explain"]) {
        "auditory"
    } else if mentions(&["hands-on", "practice", "code", "build"]) {
        "kinesthetic"
    } else {
        "adaptive"
    };

    StudentAnalysis {
        detected_experience: experience,
        detected_learning_style: learning_style,
        analysis_complete: true,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeAssessment {
    pub assessed_level: &'static str,
    pub advanced_indicators: usize,
    pub intermediate_indicators: usize,
    pub beginner_indicators: usize,
}

const ADVANCED_INDICATORS: [&str; 6] = ["def __", "async def", "yield", "@", "metaclass", "lambda"];
const INTERMEDIATE_INDICATORS: [&str; 7] =
    ["def ", "class ", "import ", "return", "self.", "for ", "while "];
const BEGINNER_INDICATORS: [&str; 5] = ["print(", "input(", "if ", "else:", "="];

/// Count language-feature indicators in a code sample.
///
/// Two advanced indicators make it advanced; otherwise three intermediate ones
/// make it intermediate.
pub fn assess_code_sample(code_sample: &str) -> CodeAssessment {
    let code = code_sample.to_lowercase();
    let count = |indicators: &[&str]| indicators.iter().filter(|i| code.contains(*i)).count();

    let advanced = count(&ADVANCED_INDICATORS);
    let intermediate = count(&INTERMEDIATE_INDICATORS);
    let beginner = count(&BEGINNER_INDICATORS);

    let level = if advanced >= 2 {
        "advanced"
    } else if intermediate >= 3 {
        "intermediate"
    } else {
        "beginner"
    };

    CodeAssessment {
        assessed_level: level,
        advanced_indicators: advanced,
        intermediate_indicators: intermediate,
        beginner_indicators: beginner,
    }
}

fn default_style() -> String {
    "adaptive".into()
}
#[derive(Debug, Deserialize)]
struct ProfileArgs {
    experience: String,
    #[serde(default = "default_style")]
    learning_style: String,
    subject: Option<String>,
}

/// Profile tool. `subject` is used when the model does not name one.
pub struct AssessLearningProfileTool {
    subject: String,
}

impl AssessLearningProfileTool {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

impl Default for AssessLearningProfileTool {
    fn default() -> Self {
        Self::new("python")
    }
}

#[async_trait]
impl Tool for AssessLearningProfileTool {
    fn name(&self) -> &str {
        "assess_learning_profile"
    }

    fn description(&self) -> &str {
        "Create a personalized learning profile (pace, depth, recommended topics) for an experience level."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "experience": {
                    "type": "string",
                    "description": "Experience level: beginner, intermediate or advanced"
                },
                "learning_style": {
                    "type": "string",
                    "description": "visual, auditory, kinesthetic or adaptive",
                    "default": "adaptive"
                },
                "subject": { "type": "string", "default": self.subject }
            },
            "required": ["experience"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: ProfileArgs = parse_args(self.name(), arguments)?;
        let profile = profile_for(&args.experience);
        let subject = args.subject.unwrap_or_else(|| self.subject.clone());

        Ok(serde_json::json!({
            "experience_level": args.experience,
            "learning_style": args.learning_style,
            "subject": subject,
            "recommended_pace": profile.pace,
            "learning_depth": profile.depth,
            "assessment_score": profile.score,
            "recommended_topics": profile.topics,
            "next_steps": format!(
                "Start with {} {} level: {}",
                subject,
                args.experience,
                profile.topics[..2].join(", ")
            ),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct StudentInputArgs {
    student_input: String,
}

pub struct AnalyzeStudentInputTool;

#[async_trait]
impl Tool for AnalyzeStudentInputTool {
    fn name(&self) -> &str {
        "analyze_student_input"
    }

    fn description(&self) -> &str {
        "Detect experience level and learning style from a student's description of themselves."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "student_input": {
                    "type": "string",
                    "description": "The student's own words about their background"
                }
            },
            "required": ["student_input"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: StudentInputArgs = parse_args(self.name(), arguments)?;
        Ok(serde_json::json!(analyze_student_input(&args.student_input)))
    }
}

#[derive(Debug, Deserialize)]
struct CodeSampleArgs {
    code_sample: String,
}

pub struct AssessWithCodeSampleTool;

#[async_trait]
impl Tool for AssessWithCodeSampleTool {
    fn name(&self) -> &str {
        "assess_with_code_sample"
    }

    fn description(&self) -> &str {
        "Assess skill level from a Python code sample the student wrote."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code_sample": { "type": "string", "description": "Python source code" }
            },
            "required": ["code_sample"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: CodeSampleArgs = parse_args(self.name(), arguments)?;
        let assessment = assess_code_sample(&args.code_sample);
        Ok(serde_json::json!({
            "assessed_level": assessment.assessed_level,
            "code_complexity": {
                "advanced": assessment.advanced_indicators,
                "intermediate": assessment.intermediate_indicators,
            },
            "has_code_sample": true,
        }))
    }
}
