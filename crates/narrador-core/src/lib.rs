//! # narrador-core
//!
//! I/O-free building blocks for the narrador story and summary service.
//!
//! This crate answers three questions without ever touching the network:
//! - What does a request look like once defaults are applied?
//! - Which prompt is sent to which model?
//! - How is a provider's usage report made safe to store as JSON?
//!
//! Provider calls, chaining and persistence live in `narrador-runtime`.
//!
//! ## Example
//!
//! ```rust
//! use narrador_core::{prompts, EvolutionaryStoryRequest};
//!
//! let request = EvolutionaryStoryRequest::new("um dragão");
//! let prompt = prompts::draft_prompt(&request);
//! assert!(prompt.contains("estilo aventura"));
//! ```

pub mod prompts;
pub mod record;
pub mod request;
pub mod usage;

pub use record::{
    BasicStory, ChainResult, NewStoryRecord, StoryOutput, StoryOutputs, StoryRecord,
    SummaryResult,
};
pub use request::{EvolutionaryStoryRequest, StoryRequest, SummaryRequest};
pub use usage::{normalize, normalize_value, UsageMap};
