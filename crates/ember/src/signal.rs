use crate::error::RuntimeError;
use crate::value::Value;

/// Non-local control transfers threaded through evaluation via `?`,
/// instead of host panics/exceptions.
pub enum Signal {
    Break,
    Continue,
    Return(Value),
    Error(RuntimeError),
}

impl From<RuntimeError> for Signal {
    fn from(err: RuntimeError) -> Self {
        Self::Error(err)
    }
}

pub type EvalResult<T> = Result<T, Signal>;
