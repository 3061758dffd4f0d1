//! Picks the agent for a turn from the message and the user's context.

use crate::context::{SkillLevel, UserContext};
use crate::kind::AgentKind;

/// Keyword groups, scanned in order. The first group with a match wins.
const KEYWORD_ROUTES: [(&[&str], AgentKind); 5] = [
    (&["assess", "level", "skill", "evaluate"], AgentKind::Assessment),
    (&["plan", "roadmap", "curriculum", "path"], AgentKind::Curriculum),
    (&["explain", "teach", "what is", "how to"], AgentKind::Teaching),
    (&["practice", "exercise", "task", "code"], AgentKind::Practice),
    (&["progress", "badge", "achievement", "report"], AgentKind::Progress),
];

/// Route a message. Pure and total.
///
/// Users with no known skill level always go to assessment first. Otherwise
/// keywords decide; with no keyword, users who have learned nothing yet are
/// taught and everyone else practices.
pub fn route(message: &str, context: &UserContext) -> AgentKind {
    if context.skill_level == SkillLevel::Unknown {
        return AgentKind::Assessment;
    }

    let message = message.to_lowercase();
    if let Some((_, kind)) = KEYWORD_ROUTES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| message.contains(k)))
    {
        return *kind;
    }

    if context.topics_learned.is_empty() {
        AgentKind::Teaching
    } else {
        AgentKind::Practice
    }
}
