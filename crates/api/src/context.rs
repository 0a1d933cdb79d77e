use taskgate_auth::IdentityContext;

/// Caller for a request, as resolved by the auth middleware.
///
/// Always present on routed requests; `identity` is `None` for anonymous
/// callers (no `Authorization` header).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    identity: Option<IdentityContext>,
}

impl CallerContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: IdentityContext) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn identity(&self) -> Option<&IdentityContext> {
        self.identity.as_ref()
    }
}
