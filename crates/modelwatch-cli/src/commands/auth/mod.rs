//! Auth subcommand implementations.

mod change_password;
mod login;
mod logout;
mod refresh;
mod register;
mod reset_password;
mod whoami;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use modelwatch_core::{Access, ApiUrl, route_access};
use modelwatch_rest::SessionManager;

use crate::store::FileTokenStore;

#[derive(Args, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthSubcommand {
    /// Log in and persist the session token
    Login(login::LoginArgs),

    /// End the session and delete the stored token
    Logout(logout::LogoutArgs),

    /// Create a new account
    Register(register::RegisterArgs),

    /// Display the active session's identity
    Whoami(whoami::WhoamiArgs),

    /// Rotate the session token
    Refresh(refresh::RefreshArgs),

    /// Change the account password
    ChangePassword(change_password::ChangePasswordArgs),

    /// Request a password reset email
    ResetPassword(reset_password::ResetPasswordArgs),

    /// Confirm a password reset with the emailed token
    ConfirmResetPassword(reset_password::ConfirmResetPasswordArgs),
}

pub async fn handle(cmd: AuthCommand, api: &str) -> Result<()> {
    match cmd.command {
        AuthSubcommand::Login(args) => login::run(args, api).await,
        AuthSubcommand::Logout(args) => logout::run(args, api).await,
        AuthSubcommand::Register(args) => register::run(args, api).await,
        AuthSubcommand::Whoami(args) => whoami::run(args, api).await,
        AuthSubcommand::Refresh(args) => refresh::run(args, api).await,
        AuthSubcommand::ChangePassword(args) => change_password::run(args, api).await,
        AuthSubcommand::ResetPassword(args) => reset_password::run(args, api).await,
        AuthSubcommand::ConfirmResetPassword(args) => reset_password::run_confirm(args, api).await,
    }
}

/// Build a session manager over the file-backed token store.
pub(crate) fn session_manager(api: &str) -> Result<SessionManager> {
    let api = ApiUrl::new(api).context("Invalid API URL")?;
    let store = FileTokenStore::new()?;
    Ok(SessionManager::new(api, store))
}

/// Restore the persisted session and require an authenticated state.
pub(crate) async fn require_session(api: &str) -> Result<SessionManager> {
    let session = session_manager(api)?;
    let status = session.initialize().await;

    match route_access(status) {
        Access::Grant => Ok(session),
        Access::Wait | Access::RedirectToLogin => {
            anyhow::bail!("No active session. Run 'modelwatch auth login' first.")
        }
    }
}
