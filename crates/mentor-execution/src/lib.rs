//! Concurrent execution of responder calls for a routed turn.

pub mod dispatcher;
pub mod route_plan;
pub mod tracing_layer;

pub use dispatcher::{AgentDispatcher, DispatchCancelled, DispatchResult};
pub use route_plan::RoutePlan;
pub use tracing_layer::{RoutingEvent, RoutingEventLayer};
