pub mod events;
pub mod identity;

pub use events::{EventSink, FanoutEventSink, LoggingEventSink};
pub use identity::{Identity, Role};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
    #[error("Event delivery failed: {0}")]
    EventError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
