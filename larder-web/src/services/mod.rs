//! Outbound collaborators of the web controller

pub mod add_delegate;
pub mod recipe_advisor;

pub use add_delegate::{AddDelegate, DelegateError, ExternalAddCommand, InProcessAdd};
pub use recipe_advisor::{AdvisorError, GeminiAdvisor, RecipeAdvisor, UnconfiguredAdvisor};
