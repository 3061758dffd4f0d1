//! Curriculum tool: weekly study plans per experience level.

use async_trait::async_trait;
use learncoach_core::error::ToolError;
use learncoach_core::tool::Tool;
use serde::{Deserialize, Serialize};

use crate::{lenient_list, parse_args};

#[derive(Debug, Serialize)]
struct Week {
    week: u8,
    topic: &'static str,
    lessons: &'static [&'static str],
    practice: &'static str,
}

struct Curriculum {
    level: &'static str,
    title: &'static str,
    description: &'static str,
    weekly_plan: &'static [Week],
    resources: &'static [&'static str],
    pace: &'static str,
    milestones: &'static [&'static str],
}

const fn week(
    week: u8,
    topic: &'static str,
    lessons: &'static [&'static str],
    practice: &'static str,
) -> Week {
    Week {
        week,
        topic,
        lessons,
        practice,
    }
}

static CURRICULA: [Curriculum; 3] = [
    Curriculum {
        level: "beginner",
        title: "Python Fundamentals Path (6 Weeks)",
        description: "Perfect for absolute beginners starting their programming journey",
        weekly_plan: &[
            week(
                1,
                "Python Basics & Setup",
                &["Installing Python", "Variables"],
                "Create a simple calculator",
            ),
            week(
                2,
                "Control Structures",
                &["If/Else", "Boolean logic"],
                "Build a number guessing game",
            ),
            week(3, "Loops & Iterations", &["For/While loops"], "Multiplication tables"),
            week(4, "Functions", &["Parameters, Scope"], "Temperature converter"),
            week(5, "Data Structures", &["Lists, Dictionaries"], "Grade tracker"),
            week(6, "Final Project", &["Debugging, Next Steps"], "Todo list app"),
        ],
        resources: &["Python Docs", "Codecademy", "freeCodeCamp"],
        pace: "Slow and steady",
        milestones: &["Week 1: First program", "Week 3: First game", "Week 6: First app"],
    },
    Curriculum {
        level: "intermediate",
        title: "Python Developer Path (8 Weeks)",
        description: "For those with basic knowledge ready to build real apps",
        weekly_plan: &[
            week(1, "OOP", &["Classes, Inheritance"], "Banking system"),
            week(2, "Advanced Data Structures", &["Comprehensions"], "Data processing"),
            week(3, "Error Handling", &["Try/Except"], "Robust file processor"),
            week(4, "File Handling", &["JSON, CSV, SQL"], "Contact manager"),
            week(5, "APIs", &["REST, Requests"], "Weather app"),
            week(6, "Libraries", &["Pandas, Matplotlib"], "Data analysis"),
            week(7, "Testing", &["Pytest, Git"], "Write tests"),
            week(8, "Capstone", &["Deployment"], "Web application"),
        ],
        resources: &["Real Python", "Effective Python"],
        pace: "Moderate",
        milestones: &["Week 4: Database app", "Week 6: API integration", "Week 8: Portfolio"],
    },
    Curriculum {
        level: "advanced",
        title: "Python Mastery Path (6 Weeks)",
        description: "Mastering advanced concepts",
        weekly_plan: &[
            week(1, "Advanced OOP", &["Design Patterns"], "Implement patterns"),
            week(2, "Concurrency", &["Async/Await"], "Concurrent scraper"),
            week(3, "Performance", &["Profiling, Caching"], "Optimize app"),
            week(4, "Frameworks", &["Django/FastAPI/PyTorch"], "Build with framework"),
            week(5, "System Design", &["Microservices"], "Design system"),
            week(6, "Open Source", &["Contributing"], "Contribute to project"),
        ],
        resources: &["Fluent Python", "Architecture Patterns"],
        pace: "Fast-paced",
        milestones: &["Week 3: Tuning", "Week 5: Architecture", "Week 6: Contribution"],
    },
];

fn curriculum_for(level: &str) -> &'static Curriculum {
    let key = level.to_lowercase();
    CURRICULA.iter().find(|c| c.level == key).unwrap_or(&CURRICULA[0])
}

fn default_goals() -> String {
    "general Python proficiency".into()
}

#[derive(Debug, Deserialize)]
struct CurriculumArgs {
    experience_level: String,
    #[serde(default = "default_goals")]
    learning_goals: String,
    #[serde(default, deserialize_with = "lenient_list")]
    focus_areas: Vec<String>,
}

pub struct GenerateCurriculumTool;

#[async_trait]
impl Tool for GenerateCurriculumTool {
    fn name(&self) -> &str {
        "generate_python_curriculum"
    }

    fn description(&self) -> &str {
        "Generate a week-by-week Python learning curriculum for an experience level."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "experience_level": {
                    "type": "string",
                    "description": "beginner, intermediate or advanced"
                },
                "learning_goals": {
                    "type": "string",
                    "default": "general Python proficiency"
                },
                "focus_areas": {
                    "type": "string",
                    "description": "Comma-separated focus areas"
                }
            },
            "required": ["experience_level"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: CurriculumArgs = parse_args(self.name(), arguments)?;
        let curriculum = curriculum_for(&args.experience_level);
        let focus_areas = if args.focus_areas.is_empty() {
            vec!["core programming concepts".to_string()]
        } else {
            args.focus_areas
        };

        Ok(serde_json::json!({
            "curriculum_title": curriculum.title,
            "description": curriculum.description,
            "experience_level": args.experience_level,
            "learning_goals": args.learning_goals,
            "focus_areas": focus_areas,
            "weekly_plan": curriculum.weekly_plan,
            "recommended_resources": curriculum.resources,
            "recommended_pace": curriculum.pace,
            "key_milestones": curriculum.milestones,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn intermediate_path_has_eight_weeks() {
        let out = GenerateCurriculumTool
            .execute(serde_json::json!({"experience_level": "intermediate"}))
            .await
            .unwrap();
        assert_eq!(out["curriculum_title"], "Python Developer Path (8 Weeks)");
        assert_eq!(out["weekly_plan"].as_array().unwrap().len(), 8);
        assert_eq!(out["weekly_plan"][4]["topic"], "APIs");
        assert_eq!(out["focus_areas"][0], "core programming concepts");
        assert_eq!(out["learning_goals"], "general Python proficiency");
    }

    #[tokio::test]
    async fn unknown_level_gets_beginner_path() {
        let out = GenerateCurriculumTool
            .execute(serde_json::json!({
                "experience_level": "expert-ish",
                "focus_areas": "web, data"
            }))
            .await
            .unwrap();
        assert_eq!(out["curriculum_title"], "Python Fundamentals Path (6 Weeks)");
        assert_eq!(out["experience_level"], "expert-ish");
        assert_eq!(out["focus_areas"], serde_json::json!(["web", "data"]));
    }
}
