//! Logout command implementation.

use anyhow::Result;
use clap::Args;

use crate::output;

use super::session_manager;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub async fn run(_args: LogoutArgs, api: &str) -> Result<()> {
    let session = session_manager(api)?;

    // Restore first so the remote notification can carry the credential;
    // logout itself never fails.
    session.initialize().await;
    session.logout().await;

    output::success("Logged out");

    Ok(())
}
