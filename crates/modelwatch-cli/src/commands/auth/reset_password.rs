//! Password reset command implementations.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;

use super::session_manager;

#[derive(Args, Debug)]
pub struct ResetPasswordArgs {
    /// Account email
    #[arg(long)]
    pub email: String,
}

pub async fn run(args: ResetPasswordArgs, api: &str) -> Result<()> {
    let session = session_manager(api)?;

    let message = session
        .request_password_reset(&args.email)
        .await
        .context("Failed to request password reset")?;

    output::success(&message);

    Ok(())
}

#[derive(Args, Debug)]
pub struct ConfirmResetPasswordArgs {
    /// Reset token from the email
    #[arg(long)]
    pub token: String,

    /// New password
    #[arg(long)]
    pub password: String,
}

pub async fn run_confirm(args: ConfirmResetPasswordArgs, api: &str) -> Result<()> {
    let session = session_manager(api)?;

    let message = session
        .confirm_password_reset(&args.token, &args.password)
        .await
        .context("Failed to reset password")?;

    output::success(&message);

    Ok(())
}
