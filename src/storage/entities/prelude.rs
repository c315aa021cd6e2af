pub use super::rule::Entity as Rule;
pub use super::system_prompt::Entity as SystemPrompt;
pub use super::template::Entity as Template;
