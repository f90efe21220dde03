//! Per-leg reactive handlers for the call-progress protocol.
//!
//! Pure logic: each handler inspects one inbound message, updates its own
//! leg's flags and tells the driving loop what (if anything) to send and on
//! which leg. No I/O happens here, which keeps every scenario variant unit
//! testable without a server.

use anyhow::{bail, Result};

use super::message::{MessageType, ProgressMessage, SessionState};

pub const EVENT_ACCEPT: &str = "accept";
pub const EVENT_MEDIA_UP: &str = "media-up";

/// Which of the two parties a message or directive belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Caller,
    Callee,
}

/// Scenario variants. Each one subtracts a step from the full negotiation so
/// a specific server-side timeout fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Full negotiation; both legs must reach `connected`.
    Basic,
    /// Caller never invites the callee; server must time the call out.
    SupervisoryTimeout,
    /// Callee is invited but the caller never accepts.
    RingingTimeout,
    /// Accept happens but the caller never completes media-up.
    ConnectionTimeout,
}

impl Variant {
    /// Timeout variants succeed on `terminated/timeout`; the basic variant
    /// treats any termination as a failure.
    pub fn expects_timeout(self) -> bool {
        !matches!(self, Variant::Basic)
    }

    /// Whether the callee leg participates at all.
    pub fn has_callee_leg(self) -> bool {
        !matches!(self, Variant::SupervisoryTimeout)
    }
}

/// Client-observed flags for one leg, written only by that leg's handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegState {
    pub established: bool,
    pub terminated: bool,
}

/// A send the driving loop should perform on behalf of a handler.
pub type Directive = Option<(Leg, ProgressMessage)>;

/// Caller-side handler. Owns the tokens needed to pull the callee into the
/// negotiation.
pub struct CallerHandler {
    variant: Variant,
    call_id: String,
    /// The callee's own websocket token, from the pending-call listing.
    /// Absent in the supervisory variant where no callee ever joins.
    callee_token: Option<String>,
}

impl CallerHandler {
    pub fn new(variant: Variant, call_id: &str, callee_token: Option<String>) -> Self {
        Self {
            variant,
            call_id: call_id.to_string(),
            callee_token,
        }
    }

    pub fn handle(&self, msg: &ProgressMessage, state: &mut LegState) -> Result<Directive> {
        if msg.message_type == MessageType::Hello && msg.state == Some(SessionState::Init) {
            // First message after our hello. Pull the second party in, unless
            // this variant leaves the callee out.
            return Ok(match (&self.callee_token, self.variant) {
                (_, Variant::SupervisoryTimeout) | (None, _) => None,
                (Some(token), _) => Some((
                    Leg::Callee,
                    ProgressMessage::hello(token, &self.call_id),
                )),
            });
        }

        if msg.is_progress(SessionState::Alerting) {
            return Ok(match self.variant {
                // Never accept, let the ringing timeout fire.
                Variant::RingingTimeout => None,
                _ => Some((Leg::Caller, ProgressMessage::action(EVENT_ACCEPT))),
            });
        }

        if msg.is_progress(SessionState::Connecting) {
            return Ok(match self.variant {
                // Accept happened but this side stalls the media handshake.
                Variant::ConnectionTimeout => None,
                _ => Some((Leg::Caller, ProgressMessage::action(EVENT_MEDIA_UP))),
            });
        }

        if msg.is_progress(SessionState::HalfConnected) {
            // Nothing to do; the far side still owes a media-up.
            return Ok(None);
        }

        if msg.is_progress(SessionState::Connected) {
            state.established = true;
            return Ok(None);
        }

        if msg.is_progress(SessionState::Terminated) {
            handle_termination(msg, state)?;
            return Ok(None);
        }

        tracing::debug!(?msg, "caller: ignoring message");
        Ok(None)
    }
}

/// Callee-side handler.
pub struct CalleeHandler {
    variant: Variant,
}

impl CalleeHandler {
    pub fn new(variant: Variant) -> Self {
        Self { variant }
    }

    pub fn handle(&self, msg: &ProgressMessage, state: &mut LegState) -> Result<Directive> {
        // In the ringing variant the callee is a silent observer.
        if self.variant == Variant::RingingTimeout {
            return Ok(None);
        }

        if msg.is_progress(SessionState::Connecting) {
            return Ok(Some((Leg::Callee, ProgressMessage::action(EVENT_MEDIA_UP))));
        }

        if msg.is_progress(SessionState::Connected) {
            state.established = true;
            return Ok(None);
        }

        if msg.is_progress(SessionState::Terminated) {
            handle_termination(msg, state)?;
            return Ok(None);
        }

        tracing::debug!(?msg, "callee: ignoring message");
        Ok(None)
    }
}

/// A `terminated` progress with reason `timeout` sets the flag; any other
/// reason is a server-side rejection and aborts the iteration.
fn handle_termination(msg: &ProgressMessage, state: &mut LegState) -> Result<()> {
    match msg.reason.as_deref() {
        Some("timeout") => {
            state.terminated = true;
            Ok(())
        }
        reason => bail!(
            "call terminated with unexpected reason: {}",
            reason.unwrap_or("<none>")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(state: SessionState) -> ProgressMessage {
        ProgressMessage {
            message_type: MessageType::Progress,
            state: Some(state),
            reason: None,
            event: None,
            auth: None,
            call_id: None,
        }
    }

    fn terminated(reason: &str) -> ProgressMessage {
        ProgressMessage {
            reason: Some(reason.to_string()),
            ..progress(SessionState::Terminated)
        }
    }

    fn hello_init() -> ProgressMessage {
        ProgressMessage {
            message_type: MessageType::Hello,
            state: Some(SessionState::Init),
            reason: None,
            event: None,
            auth: None,
            call_id: None,
        }
    }

    #[test]
    fn test_basic_caller_walks_the_full_sequence() {
        let handler =
            CallerHandler::new(Variant::Basic, "call-1", Some("callee-tok".to_string()));
        let mut state = LegState::default();

        // hello/init invites the callee on the callee leg.
        let d = handler.handle(&hello_init(), &mut state).unwrap().unwrap();
        assert_eq!(d.0, Leg::Callee);
        assert_eq!(d.1.auth.as_deref(), Some("callee-tok"));
        assert_eq!(d.1.call_id.as_deref(), Some("call-1"));

        // alerting -> accept on own leg.
        let d = handler
            .handle(&progress(SessionState::Alerting), &mut state)
            .unwrap()
            .unwrap();
        assert_eq!(d.0, Leg::Caller);
        assert_eq!(d.1.event.as_deref(), Some(EVENT_ACCEPT));

        // connecting -> media-up on own leg.
        let d = handler
            .handle(&progress(SessionState::Connecting), &mut state)
            .unwrap()
            .unwrap();
        assert_eq!(d.1.event.as_deref(), Some(EVENT_MEDIA_UP));

        // half-connected -> wait.
        assert!(handler
            .handle(&progress(SessionState::HalfConnected), &mut state)
            .unwrap()
            .is_none());
        assert!(!state.established);

        // connected -> established.
        handler
            .handle(&progress(SessionState::Connected), &mut state)
            .unwrap();
        assert!(state.established);
    }

    #[test]
    fn test_basic_callee_answers_media_up_then_establishes() {
        let handler = CalleeHandler::new(Variant::Basic);
        let mut state = LegState::default();

        let d = handler
            .handle(&progress(SessionState::Connecting), &mut state)
            .unwrap()
            .unwrap();
        assert_eq!(d.0, Leg::Callee);
        assert_eq!(d.1.event.as_deref(), Some(EVENT_MEDIA_UP));

        handler
            .handle(&progress(SessionState::Connected), &mut state)
            .unwrap();
        assert!(state.established);
    }

    #[test]
    fn test_supervisory_caller_never_invites() {
        let handler = CallerHandler::new(Variant::SupervisoryTimeout, "call-1", None);
        let mut state = LegState::default();

        assert!(handler.handle(&hello_init(), &mut state).unwrap().is_none());

        handler.handle(&terminated("timeout"), &mut state).unwrap();
        assert!(state.terminated);
        assert!(!state.established);
    }

    #[test]
    fn test_ringing_caller_invites_but_never_accepts() {
        let handler = CallerHandler::new(
            Variant::RingingTimeout,
            "call-1",
            Some("callee-tok".to_string()),
        );
        let mut state = LegState::default();

        assert!(handler.handle(&hello_init(), &mut state).unwrap().is_some());
        assert!(handler
            .handle(&progress(SessionState::Alerting), &mut state)
            .unwrap()
            .is_none());

        handler.handle(&terminated("timeout"), &mut state).unwrap();
        assert!(state.terminated);
    }

    #[test]
    fn test_ringing_callee_is_silent() {
        let handler = CalleeHandler::new(Variant::RingingTimeout);
        let mut state = LegState::default();
        assert!(handler
            .handle(&progress(SessionState::Connecting), &mut state)
            .unwrap()
            .is_none());
        assert!(!state.established);
    }

    #[test]
    fn test_connection_timeout_caller_accepts_but_stalls_media() {
        let handler = CallerHandler::new(
            Variant::ConnectionTimeout,
            "call-1",
            Some("callee-tok".to_string()),
        );
        let mut state = LegState::default();

        assert!(handler.handle(&hello_init(), &mut state).unwrap().is_some());
        let d = handler
            .handle(&progress(SessionState::Alerting), &mut state)
            .unwrap()
            .unwrap();
        assert_eq!(d.1.event.as_deref(), Some(EVENT_ACCEPT));

        // Stalls here: no media-up.
        assert!(handler
            .handle(&progress(SessionState::Connecting), &mut state)
            .unwrap()
            .is_none());

        handler.handle(&terminated("timeout"), &mut state).unwrap();
        assert!(state.terminated);
    }

    #[test]
    fn test_connection_timeout_callee_still_sends_media_up() {
        let handler = CalleeHandler::new(Variant::ConnectionTimeout);
        let mut state = LegState::default();
        let d = handler
            .handle(&progress(SessionState::Connecting), &mut state)
            .unwrap()
            .unwrap();
        assert_eq!(d.1.event.as_deref(), Some(EVENT_MEDIA_UP));
    }

    #[test]
    fn test_unexpected_termination_reason_is_a_hard_failure() {
        let caller = CallerHandler::new(Variant::Basic, "c", Some("t".to_string()));
        let mut state = LegState::default();
        let err = caller
            .handle(&terminated("cancel"), &mut state)
            .unwrap_err();
        assert!(err.to_string().contains("cancel"));
        assert!(!state.terminated);

        let callee = CalleeHandler::new(Variant::Basic);
        assert!(callee.handle(&terminated("busy"), &mut state).is_err());
    }
}
