//! WebSocket call-progress simulation
//!
//! Emulates both endpoints of a call negotiation (caller and callee legs) and
//! drives the server's state machine to `connected`, or waits for an expected
//! server-side timeout in the timeout variants. The server owns every state
//! transition; this code only reacts to notifications and emits actions.

pub mod handlers;
pub mod message;
pub mod socket;

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tokio::sync::mpsc;

use handlers::{CalleeHandler, CallerHandler, Leg, LegState, Variant};
use message::ProgressMessage;
use socket::{LegEvent, ProgressSocket};

/// Everything the simulation needs to drive one call.
pub struct CallSetup<'a> {
    pub progress_url: &'a str,
    /// Caller leg auth token (from call initiation).
    pub websocket_token: &'a str,
    /// Callee leg auth token (from the pending-call listing); `None` in the
    /// supervisory variant where the callee never joins.
    pub callee_token: Option<&'a str>,
    pub call_id: &'a str,
}

/// Final client-observed state of both legs, plus the accumulated message
/// logs for diagnostics.
#[derive(Debug, Default)]
pub struct SimulationOutcome {
    pub caller: LegState,
    pub callee: LegState,
    pub caller_log: Vec<ProgressMessage>,
    pub callee_log: Vec<ProgressMessage>,
}

/// Run one scenario variant to its expected terminal condition.
///
/// Opens the callee leg (when the variant has one) and then the caller leg,
/// sends the caller's opening hello, and reacts to inbound messages until the
/// variant's completion condition holds. `wait_budget` is a client-side
/// watchdog over the whole exchange; the server enforces its own supervisory,
/// ringing and connection timeouts well inside it.
///
/// Both channels are torn down on every exit path.
pub async fn simulate_call(
    variant: Variant,
    setup: &CallSetup<'_>,
    wait_budget: Duration,
) -> Result<SimulationOutcome> {
    let (events_tx, mut events_rx) = mpsc::channel(32);

    let mut callee_socket = if variant.has_callee_leg() {
        Some(ProgressSocket::connect(setup.progress_url, Leg::Callee, events_tx.clone()).await?)
    } else {
        None
    };
    let caller_socket =
        ProgressSocket::connect(setup.progress_url, Leg::Caller, events_tx.clone()).await;
    drop(events_tx);

    let mut caller_socket = match caller_socket {
        Ok(socket) => socket,
        Err(e) => {
            if let Some(socket) = callee_socket.take() {
                socket.close().await;
            }
            return Err(e);
        }
    };

    let caller_handler = CallerHandler::new(
        variant,
        setup.call_id,
        setup.callee_token.map(str::to_string),
    );
    let callee_handler = CalleeHandler::new(variant);

    let mut outcome = SimulationOutcome::default();
    let opening = ProgressMessage::hello(setup.websocket_token, setup.call_id);

    let driven = async {
        caller_socket.send(&opening).await?;
        drive(
            variant,
            &mut events_rx,
            &mut caller_socket,
            &mut callee_socket,
            &caller_handler,
            &callee_handler,
            &mut outcome,
        )
        .await
    };
    let result = tokio::time::timeout(wait_budget, driven).await;

    // Scoped teardown: close both channels whatever happened above.
    caller_socket.close().await;
    if let Some(socket) = callee_socket {
        socket.close().await;
    }

    match result {
        Err(_) => bail!(
            "scenario watchdog expired after {:?} (caller log: {} messages, callee log: {})",
            wait_budget,
            outcome.caller_log.len(),
            outcome.callee_log.len()
        ),
        Ok(Err(e)) => Err(e),
        Ok(Ok(())) => Ok(outcome),
    }
}

/// React to inbound messages until the variant's completion condition holds.
async fn drive(
    variant: Variant,
    events: &mut mpsc::Receiver<LegEvent>,
    caller_socket: &mut ProgressSocket,
    callee_socket: &mut Option<ProgressSocket>,
    caller_handler: &CallerHandler,
    callee_handler: &CalleeHandler,
    outcome: &mut SimulationOutcome,
) -> Result<()> {
    loop {
        let event = events
            .recv()
            .await
            .context("both progress channels went away before the scenario completed")?;

        match event {
            LegEvent::Message(leg, msg) => {
                let directive = match leg {
                    Leg::Caller => {
                        outcome.caller_log.push(msg.clone());
                        caller_handler.handle(&msg, &mut outcome.caller)?
                    }
                    Leg::Callee => {
                        outcome.callee_log.push(msg.clone());
                        callee_handler.handle(&msg, &mut outcome.callee)?
                    }
                };

                if let Some((target, out)) = directive {
                    match target {
                        Leg::Caller => caller_socket.send(&out).await?,
                        Leg::Callee => {
                            callee_socket
                                .as_mut()
                                .context("directive for a callee leg that was never opened")?
                                .send(&out)
                                .await?
                        }
                    }
                }

                if completed(variant, outcome) {
                    return Ok(());
                }
            }
            LegEvent::Malformed(leg, detail) => {
                bail!("malformed progress message on {:?} leg: {}", leg, detail)
            }
            LegEvent::Closed(leg) => {
                bail!("{:?} progress channel closed before the scenario completed", leg)
            }
        }
    }
}

/// Completion condition per variant: full connection on both legs, or the
/// caller observing the expected timeout termination.
fn completed(variant: Variant, outcome: &SimulationOutcome) -> bool {
    if variant.expects_timeout() {
        outcome.caller.terminated
    } else {
        outcome.caller.established && outcome.callee.established
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(
        caller: (bool, bool),
        callee: (bool, bool),
    ) -> SimulationOutcome {
        SimulationOutcome {
            caller: LegState {
                established: caller.0,
                terminated: caller.1,
            },
            callee: LegState {
                established: callee.0,
                terminated: callee.1,
            },
            caller_log: Vec::new(),
            callee_log: Vec::new(),
        }
    }

    #[test]
    fn test_basic_completes_only_when_both_legs_connect() {
        assert!(!completed(Variant::Basic, &outcome((true, false), (false, false))));
        assert!(!completed(Variant::Basic, &outcome((false, false), (true, false))));
        assert!(completed(Variant::Basic, &outcome((true, false), (true, false))));
    }

    #[test]
    fn test_timeout_variants_complete_on_caller_termination() {
        for variant in [
            Variant::SupervisoryTimeout,
            Variant::RingingTimeout,
            Variant::ConnectionTimeout,
        ] {
            assert!(!completed(variant, &outcome((false, false), (false, false))));
            assert!(completed(variant, &outcome((false, true), (false, false))));
        }
    }
}
