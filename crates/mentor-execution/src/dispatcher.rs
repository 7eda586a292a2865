//! Agent Dispatcher: concurrent fan-out of responder calls for one turn.

use crate::route_plan::RoutePlan;
use mentor_core::config::DispatchConfig;
use mentor_core::responder::{
    Responder, ResponderError, ResponderOutput, ResponderRequest, ResponderRole,
};
use mentor_core::routing::Route;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The caller cancelled the turn while responders were running.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("dispatch cancelled")]
pub struct DispatchCancelled;

/// Outputs of every attempted role, keyed and ordered by role.
#[derive(Debug, Clone, Default)]
pub struct DispatchResult {
    pub outputs: BTreeMap<ResponderRole, ResponderOutput>,
    /// Attempted roles without a usable output.
    pub degraded_roles: Vec<ResponderRole>,
    /// Optional roles left out because they did not fit the turn budget.
    pub skipped_roles: Vec<ResponderRole>,
}

pub struct AgentDispatcher {
    responders: BTreeMap<ResponderRole, Arc<dyn Responder>>,
    config: DispatchConfig,
}

impl AgentDispatcher {
    /// Registers responders by role; a later responder replaces an earlier one of the same role.
    pub fn new(responders: impl IntoIterator<Item = Arc<dyn Responder>>, config: DispatchConfig) -> Self {
        let responders = responders.into_iter().map(|r| (r.role(), r)).collect();
        Self { responders, config }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn has_role(&self, role: ResponderRole) -> bool {
        self.responders.contains_key(&role)
    }

    /// Optional roles whose estimate fits the budget left by the slowest required role.
    fn select_optional(&self, plan: &RoutePlan) -> (Vec<ResponderRole>, Vec<ResponderRole>) {
        let longest_required = plan
            .required
            .iter()
            .filter_map(|role| self.responders.get(role))
            .map(|r| r.estimated_latency())
            .max()
            .unwrap_or_default();
        let remaining = self.config.turn_budget().saturating_sub(longest_required);

        plan.optional
            .iter()
            .copied()
            .filter(|role| self.responders.contains_key(role))
            .partition(|role| {
                self.responders
                    .get(role)
                    .is_some_and(|r| r.estimated_latency() <= remaining)
            })
    }

    /// Runs the roles of `route` concurrently.
    ///
    /// Returns once every required role has completed or failed. Optional
    /// roles still running at that point get the configured grace period and
    /// are then cancelled. A failing role never aborts its siblings.
    pub async fn dispatch(
        &self,
        route: Route,
        request: Arc<ResponderRequest>,
        cancel: &CancellationToken,
    ) -> Result<DispatchResult, DispatchCancelled> {
        let plan = RoutePlan::for_route(route);
        let (optional, skipped_roles) = self.select_optional(&plan);
        let timeout = self.config.responder_timeout();
        let turn_token = cancel.child_token();

        let mut outputs = BTreeMap::new();
        let mut dispatched = BTreeSet::new();
        let mut pending_required = 0usize;
        let mut tasks = JoinSet::new();

        for role in plan.required.iter().chain(optional.iter()).copied() {
            let Some(responder) = self.responders.get(&role).cloned() else {
                tracing::warn!(target: "mentor::dispatch", role = %role, "No responder registered");
                outputs.insert(
                    role,
                    ResponderOutput::failed(
                        role,
                        ResponderError::Failed(format!("no {role} responder registered")),
                        Duration::ZERO,
                    ),
                );
                continue;
            };
            let required = plan.is_required(role);
            if required {
                pending_required += 1;
            }
            dispatched.insert(role);
            let request = Arc::clone(&request);
            let token = turn_token.clone();
            tasks.spawn(async move {
                let output = call_responder(responder, &request, timeout, token).await;
                (required, output)
            });
        }

        let grace = self.config.optional_grace();
        let mut grace_deadline = (pending_required == 0).then(|| Instant::now() + grace);
        let mut cut_off = false;

        while !tasks.is_empty() {
            let deadline = grace_deadline.unwrap_or_else(|| Instant::now() + timeout);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    turn_token.cancel();
                    tasks.abort_all();
                    tracing::info!(target: "mentor::dispatch", route = %route, "Dispatch cancelled");
                    return Err(DispatchCancelled);
                }
                _ = tokio::time::sleep_until(deadline), if grace_deadline.is_some() => {
                    cut_off = true;
                    break;
                }
                joined = tasks.join_next() => {
                    match joined {
                        Some(Ok((required, output))) => {
                            if required {
                                pending_required -= 1;
                                if pending_required == 0 {
                                    grace_deadline = Some(Instant::now() + grace);
                                }
                            }
                            outputs.insert(output.role, output);
                        }
                        Some(Err(err)) => {
                            tracing::warn!(target: "mentor::dispatch", error = %err, "Responder task ended abnormally");
                        }
                        None => break,
                    }
                }
            }
        }

        if cut_off {
            turn_token.cancel();
            tasks.abort_all();
        }
        for role in dispatched {
            outputs.entry(role).or_insert_with(|| {
                let error = if cut_off {
                    ResponderError::Cancelled
                } else {
                    ResponderError::Failed("responder task ended abnormally".to_string())
                };
                ResponderOutput::failed(role, error, Duration::ZERO)
            });
        }

        let degraded_roles: Vec<ResponderRole> = outputs
            .values()
            .filter(|o| !o.is_usable())
            .map(|o| o.role)
            .collect();
        tracing::info!(
            target: "mentor::dispatch",
            route = %route,
            attempted = outputs.len(),
            degraded = ?degraded_roles,
            skipped = ?skipped_roles,
            "Dispatch complete"
        );

        Ok(DispatchResult {
            outputs,
            degraded_roles,
            skipped_roles,
        })
    }
}

/// One responder call under its own deadline.
async fn call_responder(
    responder: Arc<dyn Responder>,
    request: &ResponderRequest,
    timeout: Duration,
    cancel: CancellationToken,
) -> ResponderOutput {
    let role = responder.role();
    let started = Instant::now();
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ResponderError::Cancelled),
        res = tokio::time::timeout(timeout, responder.respond(request)) => {
            res.unwrap_or(Err(ResponderError::Timeout(timeout)))
        }
    };
    let latency = started.elapsed();

    match result {
        Ok(reply) if reply.text.trim().is_empty() => {
            ResponderOutput::failed(role, ResponderError::EmptyPayload, latency)
        }
        Ok(reply) => {
            tracing::debug!(target: "mentor::dispatch", role = %role, ?latency, "Responder succeeded");
            ResponderOutput::succeeded(role, reply, latency)
        }
        Err(error) => {
            tracing::debug!(target: "mentor::dispatch", role = %role, ?latency, error = %error, "Responder failed");
            ResponderOutput::failed(role, error, latency)
        }
    }
}
