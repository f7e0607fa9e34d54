//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use modelwatch_core::Credentials;

use crate::output;

use super::session_manager;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,
}

pub async fn run(args: LoginArgs, api: &str) -> Result<()> {
    let session = session_manager(api)?;

    eprintln!("{}", "Logging in...".dimmed());

    let identity = session
        .login(Credentials::new(&args.email, &args.password))
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    println!();
    output::field("User", identity.display_name());
    output::field("Email", &identity.email);
    output::field("Role", identity.role.as_str());

    Ok(())
}
