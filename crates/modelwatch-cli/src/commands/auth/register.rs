//! Register command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use modelwatch_core::Role;
use modelwatch_rest::RegistrationData;

use crate::output;

use super::session_manager;

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account username
    #[arg(long)]
    pub username: String,

    /// Account password
    #[arg(long)]
    pub password: String,

    /// Full display name
    #[arg(long)]
    pub full_name: Option<String>,

    /// Account role (admin, data_scientist, ml_engineer, business_analyst, viewer)
    #[arg(long)]
    pub role: Option<String>,
}

pub async fn run(args: RegisterArgs, api: &str) -> Result<()> {
    let role = args
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .context("Invalid role")?;

    let session = session_manager(api)?;

    eprintln!("{}", "Creating account...".dimmed());

    let identity = session
        .register(RegistrationData {
            email: args.email,
            username: args.username,
            password: args.password,
            full_name: args.full_name,
            role,
        })
        .await
        .context("Failed to register")?;

    output::success("Account created");
    println!();
    output::field("User", identity.display_name());
    output::field("Email", &identity.email);
    println!();
    println!("Run 'modelwatch auth login' to sign in.");

    Ok(())
}
