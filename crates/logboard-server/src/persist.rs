//! Log persistence layer
//!
//! Bridges the tracing pipeline into the `app_logs` table: a
//! [`PersistLayer`] attached to the subscriber captures events at WARN and
//! above and hands them to a writer task over a bounded channel. The writer
//! inserts rows through the application-log repository and pushes a refresh
//! hint into the hub's logs group for error-level rows.
//!
//! Events from this module and from sqlx are skipped so a failing insert
//! cannot feed itself back into the table.

use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::{error, field::Visit, Event, Level, Subscriber};
use tracing_subscriber::layer::Context;

use crate::db::app_logs;
use crate::hub::{HubState, LOGS_GROUP};
use crate::models::{LogLevel, NewApplicationLog};

const APPLICATION_NAME: &str = "logboard-server";

/// Tracing layer that forwards WARN+ events to the persistence writer
pub struct PersistLayer {
    tx: mpsc::Sender<NewApplicationLog>,
}

impl PersistLayer {
    /// Create the layer and the receiving end for [`spawn_writer`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NewApplicationLog>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl<S: Subscriber> tracing_subscriber::Layer<S> for PersistLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();

        // Severity: ERROR < WARN < INFO in tracing's ordering
        if *meta.level() > Level::WARN {
            return;
        }

        let target = meta.target();
        if target.starts_with("logboard_server::persist") || target.starts_with("sqlx") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let level = match *meta.level() {
            Level::ERROR => LogLevel::Error,
            _ => LogLevel::Warning,
        };

        let message = if visitor.message.is_empty() {
            meta.name().to_string()
        } else {
            visitor.message
        };

        let mut log = NewApplicationLog::event(level, message);
        log.application = Some(APPLICATION_NAME.to_string());
        log.exception = visitor.exception;

        // Drop events rather than block the logging path when the buffer
        // is full.
        let _ = self.tx.try_send(log);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    exception: Option<String>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "error" | "exception" => self.exception = Some(value.to_string()),
            _ => {},
        }
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            "error" | "exception" => self.exception = Some(format!("{:?}", value)),
            _ => {},
        }
    }
}

/// Spawn the writer task draining the persistence channel into the
/// database.
pub fn spawn_writer(
    pool: PgPool,
    mut rx: mpsc::Receiver<NewApplicationLog>,
    hub: HubState,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(log) = rx.recv().await {
            let is_error = log.level >= LogLevel::Error;
            if let Err(e) = app_logs::insert_log(&pool, &log).await {
                error!(error = %e, "Failed to persist log event");
                continue;
            }
            if is_error {
                hub.notify(LOGS_GROUP);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::field::FieldSet;
    use tracing::metadata::Kind;

    #[test]
    fn test_visitor_captures_message_and_error() {
        // Build a callsite so we can create fields to visit
        struct TestCallsite;
        static CALLSITE: TestCallsite = TestCallsite;
        impl tracing::callsite::Callsite for TestCallsite {
            fn set_interest(&self, _: tracing::subscriber::Interest) {}
            fn metadata(&self) -> &tracing::Metadata<'_> {
                &META
            }
        }
        static FIELD_NAMES: &[&str] = &["message", "error"];
        static META: tracing::Metadata<'static> = tracing::Metadata::new(
            "test",
            "test",
            Level::WARN,
            None,
            None,
            None,
            FieldSet::new(FIELD_NAMES, tracing::callsite::Identifier(&CALLSITE)),
            Kind::EVENT,
        );

        let fields = META.fields();
        let message_field = fields.field("message").unwrap();
        let error_field = fields.field("error").unwrap();

        let mut visitor = EventVisitor::default();
        visitor.record_str(&message_field, "disk almost full");
        visitor.record_str(&error_field, "IoError: no space left");

        assert_eq!(visitor.message, "disk almost full");
        assert_eq!(visitor.exception.as_deref(), Some("IoError: no space left"));
    }
}
