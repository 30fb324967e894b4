//! Minimal single-step planning agent.
//!
//! Plan (derive a search query from the goal) → Execute (invoke the one
//! registered retrieval tool) → Validate (at least one hit) → Return.
//! There is no replanning or multi-tool loop; the tool registry is a
//! tagged enum resolved by explicit match, so further tools can be added
//! without changing the state machine shape.

use serde::{Deserialize, Serialize};

use crate::document::Hit;

/// The set of tools the agent can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTool {
    /// Retrieval against the vector index.
    RagSearch,
}

impl AgentTool {
    /// The wire name of the tool.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RagSearch => "rag.search",
        }
    }

    /// Resolve a tool by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rag.search" => Some(Self::RagSearch),
            _ => None,
        }
    }
}

/// One planned tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// The tool to invoke.
    pub tool: AgentTool,
    /// The derived search query.
    pub query: String,
    /// How many hits to request.
    pub k: i64,
}

/// Derive a tool call from a goal. Factual goals map to a retrieval call
/// with the goal text as the query.
pub fn plan(goal: &str, k: i64) -> ToolCall {
    ToolCall { tool: AgentTool::RagSearch, query: goal.to_string(), k }
}

/// A result is valid when the retrieval produced at least one citation hit.
pub fn validate(hits: &[Hit]) -> bool {
    !hits.is_empty()
}

/// The agent's final output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentResult {
    /// Hits returned by the executed retrieval call.
    pub hits: Vec<Hit>,
    /// Whether the result passed validation.
    pub valid: bool,
}
