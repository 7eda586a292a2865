//! Subscriber setup.

use anyhow::Result;
use mentor_execution::{RoutingEvent, RoutingEventLayer};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Installs the global subscriber.
///
/// `RUST_LOG` controls the log output (default `warn`). With `trace` the
/// routing diagnostics are captured independently of that filter and the
/// receiving end of their channel is returned.
pub fn init(json: bool, trace: bool) -> Result<Option<UnboundedReceiver<RoutingEvent>>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    };

    let (routing_layer, events) = if trace {
        let (layer, rx) = RoutingEventLayer::channel();
        let layer = layer.with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.is_span() || meta.target().starts_with("mentor::")
        }));
        (Some(layer), Some(rx))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(routing_layer)
        .try_init()?;
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_mode_streams_only_mentor_events() {
        let mut events = init(false, true)
            .unwrap()
            .expect("trace mode returns a receiver");
        tracing::info!(target: "mentor::routing", route = "knowledge_only", "Route selected");
        tracing::warn!(target: "rustyline", "unrelated");

        let event = events.try_recv().unwrap();
        assert_eq!(event.target, "mentor::routing");
        assert_eq!(event.message, "Route selected");
        assert!(events.try_recv().is_err());
    }
}
