//! modelwatch-rest - REST-backed session management.
//!
//! This crate owns the client side of the platform's authentication API:
//! a thin HTTP client over the versioned REST surface and the
//! [`SessionManager`] state machine that is the single source of truth
//! for authentication state.
//!
//! # Example
//!
//! ```no_run
//! use modelwatch_core::{ApiUrl, Credentials, MemoryTokenStore};
//! use modelwatch_rest::SessionManager;
//!
//! # async fn example() -> Result<(), modelwatch_core::Error> {
//! let api = ApiUrl::new("https://api.modelwatch.dev")?;
//! let session = SessionManager::new(api, MemoryTokenStore::new());
//!
//! session.initialize().await;
//! let identity = session
//!     .login(Credentials::new("alice@example.com", "app-password"))
//!     .await?;
//! println!("logged in as {}", identity.display_name());
//! # Ok(())
//! # }
//! ```

mod client;
mod endpoints;
mod session;

pub use client::RestClient;
pub use session::{RegistrationData, SessionManager};
