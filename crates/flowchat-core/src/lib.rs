pub mod config;
pub mod error;
pub mod flow;
pub mod session;
pub mod transcript;

// Re-export main types for convenience
pub use config::{Config, Settings, Tweaks};
pub use error::{ConfigError, FlowError, FlowResult};
pub use flow::FlowClient;
pub use session::ChatSession;
pub use transcript::{ChatRole, ChatTurn, Transcript};
