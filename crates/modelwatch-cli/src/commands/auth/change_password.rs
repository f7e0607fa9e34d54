//! Change-password command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;

use super::require_session;

#[derive(Args, Debug)]
pub struct ChangePasswordArgs {
    /// Current password
    #[arg(long)]
    pub current: String,

    /// New password
    #[arg(long)]
    pub new: String,
}

pub async fn run(args: ChangePasswordArgs, api: &str) -> Result<()> {
    let session = require_session(api).await?;

    let message = session
        .change_password(&args.current, &args.new)
        .await
        .context("Failed to change password")?;

    output::success(&message);

    Ok(())
}
