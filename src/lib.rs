pub mod cli;
pub mod config;
pub mod error;
pub mod launcher;
pub mod logger;
pub mod platform;

// Re-export commonly used types
pub use error::{LauncherError, Result};
pub use launcher::{LaunchOptions, LaunchPlan, Launcher};
pub use platform::Platform;
