//! Progress tools: achievement tracking, activity reports and next-step pathways.

use async_trait::async_trait;
use chrono::Utc;
use learncoach_core::error::ToolError;
use learncoach_core::tool::Tool;
use serde::{Deserialize, Serialize};

use crate::{lenient_count, lenient_list, parse_args};

/// Topics the progress tools treat as the core syllabus, in teaching order.
pub const CORE_TOPICS: [&str; 7] = [
    "variables",
    "functions",
    "loops",
    "lists",
    "dictionaries",
    "conditionals",
    "classes",
];

/// Exercises needed for 100% progress.
const EXERCISES_FOR_COMPLETION: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub achievement: &'static str,
    pub badge: &'static str,
    pub velocity: &'static str,
}

/// Badge tier for a number of completed exercises.
pub fn achievement_for(exercises_completed: u32) -> Achievement {
    let (achievement, badge) = match exercises_completed {
        15.. => ("Expert", "🏆 Python Master"),
        10.. => ("Advanced", "⭐ Python Pro"),
        5.. => ("Intermediate", "🎯 Python Learner"),
        _ => ("Beginner", "🌱 Python Starter"),
    };
    let velocity = match exercises_completed {
        10.. => "Fast learner!",
        5.. => "Steady progress.",
        _ => "Getting started.",
    };
    Achievement {
        achievement,
        badge,
        velocity,
    }
}

/// Percentage toward completion, one decimal, capped at 100.
pub fn progress_percentage(exercises_completed: u32) -> f64 {
    let pct = (f64::from(exercises_completed) / EXERCISES_FOR_COMPLETION * 100.0).min(100.0);
    (pct * 10.0).round() / 10.0
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn default_goals() -> Vec<String> {
    vec!["Learn Python fundamentals".into()]
}

#[derive(Debug, Deserialize)]
struct TrackArgs {
    user_id: String,
    #[serde(default, deserialize_with = "lenient_list")]
    topics_learned: Vec<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    exercises_completed: u32,
    current_level: String,
    #[serde(default = "default_goals", deserialize_with = "lenient_list")]
    goals: Vec<String>,
}

pub struct TrackProgressTool;

#[async_trait]
impl Tool for TrackProgressTool {
    fn name(&self) -> &str {
        "track_learning_progress"
    }

    fn description(&self) -> &str {
        "Analyze a learner's stats: progress percentage, achievement badge, strengths and recommended next topics."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "user_id": { "type": "string" },
                "topics_learned": { "type": "string", "description": "Comma-separated topics" },
                "exercises_completed": { "type": "integer" },
                "current_level": { "type": "string" },
                "goals": { "type": "string", "default": "Learn Python fundamentals" }
            },
            "required": ["user_id", "topics_learned", "exercises_completed", "current_level"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: TrackArgs = parse_args(self.name(), arguments)?;
        let exercises = args.exercises_completed;
        let learned: Vec<String> = args.topics_learned.iter().map(|t| t.to_lowercase()).collect();

        let strengths: Vec<&String> = args
            .topics_learned
            .iter()
            .filter(|t| CORE_TOPICS.contains(&t.to_lowercase().as_str()))
            .collect();
        let next_topics: Vec<&str> = CORE_TOPICS
            .iter()
            .copied()
            .filter(|t| !learned.iter().any(|l| l == t))
            .collect();

        let mut recommendations = Vec::new();
        if strengths.len() >= 3 {
            recommendations.push("Great foundation! Ready for small projects.".to_string());
        }
        if strengths.len() >= 5 {
            recommendations.push("Strong skills! Consider building a portfolio.".to_string());
        }
        if !next_topics.is_empty() {
            let upcoming: Vec<&str> = next_topics.iter().take(2).copied().collect();
            recommendations.push(format!("Next topics: {}", upcoming.join(", ")));
        }
        if exercises < 5 {
            recommendations.push("Complete more practice exercises.".to_string());
        } else {
            recommendations.push("Excellent practice habits!".to_string());
        }

        let achievement = achievement_for(exercises);

        Ok(serde_json::json!({
            "user_id": args.user_id,
            "date": today(),
            "goals": args.goals,
            "metrics": {
                "topics": args.topics_learned.len(),
                "exercises": exercises,
                "level": args.current_level,
                "progress": progress_percentage(exercises),
            },
            "gamification": achievement,
            "insights": {
                "strengths": strengths,
                "recommendations": recommendations,
                "next_topics": next_topics.iter().take(3).collect::<Vec<_>>(),
            },
        }))
    }
}

fn default_days_active() -> u32 {
    7
}

#[derive(Debug, Deserialize)]
struct ReportArgs {
    #[serde(default, deserialize_with = "lenient_list")]
    topics_learned: Vec<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    exercises_completed: u32,
    #[serde(default = "default_days_active", deserialize_with = "lenient_count")]
    days_active: u32,
}

pub struct ProgressReportTool;

#[async_trait]
impl Tool for ProgressReportTool {
    fn name(&self) -> &str {
        "generate_progress_report"
    }

    fn description(&self) -> &str {
        "Summarize activity: exercises per day, pace assessment and topics covered."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "user_id": { "type": "string" },
                "topics_learned": { "type": "string", "description": "Comma-separated topics" },
                "exercises_completed": { "type": "integer" },
                "days_active": { "type": "integer", "default": 7 }
            },
            "required": ["user_id", "topics_learned", "exercises_completed"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: ReportArgs = parse_args(self.name(), arguments)?;
        let exercises = args.exercises_completed;
        let avg = f64::from(exercises) / f64::from(args.days_active.max(1));
        let avg = (avg * 10.0).round() / 10.0;

        let pace = if avg >= 2.0 {
            "Excellent pace!"
        } else if avg >= 1.0 {
            "Good consistency."
        } else {
            "Try to practice more often."
        };

        Ok(serde_json::json!({
            "report_date": today(),
            "summary": {
                "topics_count": args.topics_learned.len(),
                "exercises_total": exercises,
                "days_active": args.days_active,
                "avg_daily": avg,
            },
            "analysis": {
                "pace": pace,
                "milestone_status": if exercises >= 15 { "Advanced" } else { "Developing" },
                "topics_covered": args.topics_learned.iter().take(5).collect::<Vec<_>>(),
            },
        }))
    }
}

struct Pathway {
    level: &'static str,
    focus: &'static str,
    steps: &'static [&'static str],
    resources: &'static [&'static str],
}

static PATHWAYS: [Pathway; 3] = [
    Pathway {
        level: "beginner",
        focus: "Master Fundamentals",
        steps: &["Practice variables", "Learn loops", "Build calculator"],
        resources: &["Python.org", "Codecademy"],
    },
    Pathway {
        level: "intermediate",
        focus: "Build Projects",
        steps: &["Master OOP", "File Handling", "Build Todo App"],
        resources: &["Real Python", "Automate the Boring Stuff"],
    },
    Pathway {
        level: "advanced",
        focus: "Specialization",
        steps: &["Web/Data Specialization", "Open Source", "Design Patterns"],
        resources: &["Fluent Python"],
    },
];

#[derive(Debug, Deserialize)]
struct NextStepsArgs {
    current_level: String,
    #[serde(default, deserialize_with = "lenient_list")]
    topics_mastered: Vec<String>,
}

pub struct SuggestNextStepsTool;

#[async_trait]
impl Tool for SuggestNextStepsTool {
    fn name(&self) -> &str {
        "suggest_next_steps"
    }

    fn description(&self) -> &str {
        "Suggest a learning pathway and skill gaps for the learner's level."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "current_level": { "type": "string" },
                "topics_mastered": { "type": "string", "description": "Comma-separated topics" }
            },
            "required": ["current_level", "topics_mastered"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: NextStepsArgs = parse_args(self.name(), arguments)?;
        let key = args.current_level.to_lowercase();
        let pathway = PATHWAYS.iter().find(|p| p.level == key).unwrap_or(&PATHWAYS[0]);
        let mastered: Vec<String> = args.topics_mastered.iter().map(|t| t.to_lowercase()).collect();

        let gaps: Vec<&str> = ["functions", "loops"]
            .into_iter()
            .filter(|t| !mastered.iter().any(|m| m == t))
            .collect();

        Ok(serde_json::json!({
            "level": args.current_level,
            "pathway": {
                "focus": pathway.focus,
                "steps": pathway.steps,
                "resources": pathway.resources,
            },
            "skill_gaps": gaps,
            "motivation": format!("You are doing great at the {} level!", args.current_level),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_thresholds() {
        assert_eq!(achievement_for(0).achievement, "Beginner");
        assert_eq!(achievement_for(5).badge, "🎯 Python Learner");
        assert_eq!(achievement_for(9).velocity, "Steady progress.");
        assert_eq!(achievement_for(10).achievement, "Advanced");
        assert_eq!(achievement_for(15).badge, "🏆 Python Master");
    }

    #[test]
    fn progress_is_capped() {
        assert_eq!(progress_percentage(7), 35.0);
        assert_eq!(progress_percentage(20), 100.0);
        assert_eq!(progress_percentage(45), 100.0);
    }

    #[tokio::test]
    async fn track_progress_insights() {
        let out = TrackProgressTool
            .execute(serde_json::json!({
                "user_id": "u1",
                "topics_learned": "Variables, loops, lists, recursion",
                "exercises_completed": 6,
                "current_level": "beginner"
            }))
            .await
            .unwrap();

        assert_eq!(out["metrics"]["topics"], 4);
        assert_eq!(out["metrics"]["progress"], 30.0);
        assert_eq!(out["gamification"]["achievement"], "Intermediate");
        assert_eq!(
            out["insights"]["strengths"],
            serde_json::json!(["Variables", "loops", "lists"])
        );
        assert_eq!(
            out["insights"]["next_topics"],
            serde_json::json!(["functions", "dictionaries", "conditionals"])
        );
        let recs = out["insights"]["recommendations"].as_array().unwrap();
        assert_eq!(recs[0], "Great foundation! Ready for small projects.");
        assert_eq!(recs[1], "Next topics: functions, dictionaries");
        assert_eq!(recs[2], "Excellent practice habits!");
    }

    #[tokio::test]
    async fn report_pace() {
        let out = ProgressReportTool
            .execute(serde_json::json!({
                "user_id": "u1",
                "topics_learned": ["loops"],
                "exercises_completed": 10,
                "days_active": 4
            }))
            .await
            .unwrap();
        assert_eq!(out["summary"]["avg_daily"], 2.5);
        assert_eq!(out["analysis"]["pace"], "Excellent pace!");
        assert_eq!(out["analysis"]["milestone_status"], "Developing");
    }

    #[tokio::test]
    async fn report_zero_days_does_not_divide_by_zero() {
        let out = ProgressReportTool
            .execute(serde_json::json!({"exercises_completed": 1, "days_active": 0}))
            .await
            .unwrap();
        assert_eq!(out["summary"]["avg_daily"], 1.0);
        assert_eq!(out["analysis"]["pace"], "Good consistency.");
    }

    #[tokio::test]
    async fn next_steps_skill_gaps() {
        let out = SuggestNextStepsTool
            .execute(serde_json::json!({
                "current_level": "Intermediate",
                "topics_mastered": "Loops"
            }))
            .await
            .unwrap();
        assert_eq!(out["pathway"]["focus"], "Build Projects");
        assert_eq!(out["skill_gaps"], serde_json::json!(["functions"]));

        let out = SuggestNextStepsTool
            .execute(serde_json::json!({"current_level": "unknown", "topics_mastered": ""}))
            .await
            .unwrap();
        assert_eq!(out["pathway"]["focus"], "Master Fundamentals");
        assert_eq!(out["skill_gaps"], serde_json::json!(["functions", "loops"]));
    }
}
