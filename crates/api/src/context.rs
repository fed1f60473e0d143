use docgate_auth::{Caller, Role};
use docgate_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted by the session middleware; immutable for the rest of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    caller: Caller,
}

impl CallerContext {
    pub fn new(caller: Caller) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> &Caller {
        &self.caller
    }

    pub fn user_id(&self) -> UserId {
        self.caller.user_id
    }

    pub fn role(&self) -> Role {
        self.caller.role
    }
}
