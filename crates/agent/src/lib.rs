//! Agent routing and context coordination for LearnCoach.
//!
//! A turn flows through four pieces:
//!
//! 1. **Context store** fetches (or lazily creates) the user's state
//! 2. **Router** picks an agent from the message and that state, unless the
//!    caller named one
//! 3. **Adapter** runs the agent: system instruction, tool loop, timeout
//! 4. **Coordinator** records the turn pair and any learning signals
//!
//! Agent failures never escape as errors: they become the reply text
//! (`Agent Error: ...`) and are recorded like any other turn.

pub mod adapter;
pub mod context;
pub mod coordinator;
pub mod kind;
pub mod prompts;
pub mod router;

pub use adapter::{Agent, AgentError, AgentReply, LlmAgent};
pub use context::{ContextLimits, ContextStore, SharedContext, SkillLevel, TurnRecord, UserContext};
pub use coordinator::{AgentFactory, Coordinator, DispatchError, LlmAgentFactory, Turn};
pub use kind::AgentKind;
pub use router::route;

#[cfg(test)]
pub(crate) mod test_helpers;
