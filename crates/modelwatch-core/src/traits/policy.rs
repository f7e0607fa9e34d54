//! Authorization-failure policy hook.

/// Policy invoked after an authenticated request is rejected as
/// unauthorized.
///
/// The session manager clears local state before invoking the hook; the
/// hook decides what the surrounding application does next, typically a
/// redirect to the login entry point. Transport code never makes that
/// decision.
pub trait UnauthorizedPolicy: Send + Sync {
    /// Called once per forced logout.
    fn on_unauthorized(&self);
}

impl<P: UnauthorizedPolicy + ?Sized> UnauthorizedPolicy for std::sync::Arc<P> {
    fn on_unauthorized(&self) {
        (**self).on_unauthorized()
    }
}

/// Policy that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPolicy;

impl UnauthorizedPolicy for NoopPolicy {
    fn on_unauthorized(&self) {}
}
