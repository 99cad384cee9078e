//! Register command - create a user from the terminal

use anyhow::Result;
use bankhub_core::services::{LogEvent, RegisterRequest};
use bankhub_core::{Error, ErrorKind};
use dialoguer::Password;

use super::{get_context, get_logger, log_event};
use crate::output;

pub struct RegisterArgs {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub password: Option<String>,
    pub json: bool,
}

pub fn run(args: RegisterArgs) -> Result<()> {
    let password = match args.password {
        Some(p) => p,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    let ctx = get_context()?;
    let logger = get_logger();

    let request = RegisterRequest {
        username: args.username,
        email: args.email,
        password,
        first_name: args.first_name,
        last_name: args.last_name,
        role: args.role,
    };

    match ctx.auth_service.register(request) {
        Ok(response) => {
            log_event(&logger, LogEvent::new("user_registered").with_command("register"));
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                output::success(&response.message);
            }
            Ok(())
        }
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("request_rejected")
                    .with_command("register")
                    .with_error(rejection_reason(&e)),
            );
            Err(e.into())
        }
    }
}

/// Event log reason; never includes the submitted values
fn rejection_reason(e: &Error) -> &'static str {
    match e.kind() {
        ErrorKind::Conflict => "conflict",
        ErrorKind::Unauthorized => "unauthorized",
        ErrorKind::Validation => "validation",
        ErrorKind::Internal => "internal",
    }
}
