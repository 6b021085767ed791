pub mod api;
pub mod cli;
pub mod core;
pub mod runtime;
pub mod shared;
pub mod system;

pub use runtime::{ExtensionRuntime, RuntimeBuilder};
pub use shared::error::{AppError, AppResult};

/// Entry point of the `gap-extension` binary
pub fn run() -> std::process::ExitCode {
    cli::run()
}
