//! Feature-handler managers (spec.md §1 "external collaborators", SPEC_FULL
//! §4.8): one trait per capability area, plus minimal in-memory reference
//! implementations. Business logic is out of scope (Non-goals); these exist
//! to make the coordinator's `Option<Arc<dyn Trait>>` seams concrete and
//! exercisable in tests.

pub mod completions;
pub mod elicitation;
pub mod logging;
pub mod prompts;
pub mod resources;
pub mod roots;
pub mod sampling;
pub mod tools;

pub use completions::CompletionsManager;
pub use elicitation::ElicitationManager;
pub use logging::LoggingManager;
pub use prompts::PromptsManager;
pub use resources::ResourcesManager;
pub use roots::RootsManager;
pub use sampling::SamplingManager;
pub use tools::ToolsManager;
