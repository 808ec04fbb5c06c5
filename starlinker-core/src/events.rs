use async_trait::async_trait;
use starlinker_shared::models::events::DomainEvent;

use crate::CoreResult;

/// Outbound channel for domain events.
///
/// Events are emitted after the write they describe has committed, so a
/// failing sink never undoes a committed change.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &DomainEvent) -> CoreResult<()>;
}

/// Sink that only records events in the log.
pub struct LoggingEventSink;

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: &DomainEvent) -> CoreResult<()> {
        tracing::info!(topic = event.topic(), key = %event.key(), "domain event");
        Ok(())
    }
}

/// Fans one event out to several sinks. The first error is returned, but
/// every sink is still tried.
pub struct FanoutEventSink {
    sinks: Vec<std::sync::Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new(sinks: Vec<std::sync::Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl EventSink for FanoutEventSink {
    async fn emit(&self, event: &DomainEvent) -> CoreResult<()> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event).await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
