//! # LearnCoach Core
//!
//! Domain types, traits and error definitions shared by every LearnCoach crate.
//! Model backends implement [`Provider`], lookup tables implement [`Tool`].
//! Nothing here performs I/O; implementations live in their own crates and
//! depend inward on this one.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

pub use error::{ProviderError, ToolError};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{
    GenerationParams, Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage,
};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
