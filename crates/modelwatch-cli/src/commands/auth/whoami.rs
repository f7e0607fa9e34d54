//! Whoami command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::output;

use super::require_session;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the identity as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: WhoamiArgs, api: &str) -> Result<()> {
    let session = require_session(api).await?;
    let identity = session.identity().context("Session identity missing")?;

    if args.json {
        return output::json_pretty(&identity);
    }

    output::field("User", identity.display_name());
    output::field("Email", &identity.email);
    output::field("Role", identity.role.as_str());
    output::field("Tier", &identity.subscription_tier);
    output::field("Verified", if identity.is_verified { "yes" } else { "no" });

    Ok(())
}
