//! Built-in commands.
//!
//! Each command implements [`IntakeCommand`](crate::command::IntakeCommand).

pub mod fill;
pub mod validate_email;

pub use fill::{FillCommand, FillSession, Instruction};
pub use validate_email::{check_address, EmailReport, ValidateEmailCommand};

use crate::command::CommandRegistry;

/// Registers all built-in commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(FillCommand));
    registry.register(Box::new(ValidateEmailCommand));
}
