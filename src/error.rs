use std::time::Duration;

use crate::dispatch::TrampolineId;

/// Failures raised by the double press machinery itself.
///
/// Errors coming out of the commands being dispatched are never wrapped in
/// this type; they travel untouched inside `anyhow::Error`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("malformed key `{input}`: {reason}")]
    MalformedKey { input: String, reason: String },

    #[error("invalid double press interval {0:?}: must be greater than zero")]
    InvalidInterval(Duration),

    #[error("trampoline `{0}` was invoked after it had been uninstalled")]
    StaleTrampolineInvocation(TrampolineId),

    #[error("identity `{id}` is already installed on `{key}`")]
    IdentityInUse { id: TrampolineId, key: String },

    #[error("`{0}` would have to be both a prefix key and a bound key")]
    PrefixKey(String),
}

impl DispatchError {
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedKey {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
