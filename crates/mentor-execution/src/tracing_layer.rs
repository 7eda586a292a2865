//! Tracing layer that streams routing diagnostics to a channel.
//!
//! Captures events whose target starts with `mentor::` (classifier fallback,
//! route selection, challenge escalation, dispatch) together with the fields
//! of the enclosing spans, and forwards them as [`RoutingEvent`]s.

use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

const TARGET_PREFIX: &str = "mentor::";

/// One captured diagnostic event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RoutingEvent {
    /// Event target, e.g. `mentor::routing`.
    pub target: String,
    pub level: String,
    pub message: String,
    pub fields: BTreeMap<String, Value>,
    /// Fields of the enclosing spans (e.g. `session_id`, `turn`), innermost wins.
    pub span: BTreeMap<String, Value>,
    pub timestamp: String,
}

/// Span fields stored in the span's extensions.
struct SpanFields(BTreeMap<String, Value>);

pub struct RoutingEventLayer {
    sender: mpsc::UnboundedSender<RoutingEvent>,
}

impl RoutingEventLayer {
    pub fn new(sender: mpsc::UnboundedSender<RoutingEvent>) -> Self {
        Self { sender }
    }

    /// Layer plus the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RoutingEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl<S> Layer<S> for RoutingEventLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFields(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let target = event.metadata().target();
        if !target.starts_with(TARGET_PREFIX) {
            return;
        }

        let mut fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let mut span_fields = BTreeMap::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(stored) = span.extensions().get::<SpanFields>() {
                    span_fields.extend(stored.0.clone());
                }
            }
        }

        let message = fields
            .remove("message")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        // The receiver may be gone (e.g. tracing disabled in the CLI); events are dropped then.
        let _ = self.sender.send(RoutingEvent {
            target: target.to_string(),
            level: event.metadata().level().to_string(),
            message,
            fields,
            span: span_fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
    }
}

struct FieldVisitor<'a>(&'a mut BTreeMap<String, Value>);

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_captures_mentor_events_with_span_fields() {
        let (layer, mut rx) = RoutingEventLayer::channel();
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("turn", session_id = "s-1", turn = 2u64);
            let _guard = span.enter();
            tracing::info!(target: "mentor::routing", route = "knowledge_only", "Route selected");
            tracing::info!(target: "other::crate", "ignored");
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.target, "mentor::routing");
        assert_eq!(event.message, "Route selected");
        assert_eq!(event.fields["route"], "knowledge_only");
        assert_eq!(event.span["session_id"], "s-1");
        assert_eq!(event.span["turn"], 2);
        assert!(rx.try_recv().is_err());
    }
}
