//! Scenario runner: one full test iteration per virtual user.
//!
//! Each scenario performs its HTTP choreography and (for call scenarios) the
//! WebSocket progress simulation, then reports. The first contract violation
//! anywhere aborts the iteration; there are no retries.

use anyhow::{ensure, Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use reqwest::StatusCode;

use crate::api::{calls, rooms, LoopClient};
use crate::config::Config;
use crate::models::CreateRoomRequest;
use crate::signaling::handlers::Variant;
use crate::signaling::{self, CallSetup};

/// Fraction of pending calls the churn scenario rejects.
const CHURN_REJECT_PERCENT: u32 = 30;

/// Register, set up a call over HTTP, then drive the progress protocol for
/// the chosen variant.
pub async fn run_call_scenario(config: &Config, variant: Variant) -> Result<()> {
    let mut client = LoopClient::new(&config.server_url);

    calls::register(&mut client, &config.simple_push_url).await?;
    let token = calls::generate_call_url(&client, &config.caller_id).await?;
    let call_data = calls::initiate_call(&client, &token).await?;
    let pending = calls::list_pending_calls(&client).await?;

    let callee_token = if variant.has_callee_leg() {
        let first = pending
            .first()
            .context("no pending calls listed after initiation")?;
        Some(first.websocket_token.clone())
    } else {
        None
    };

    let setup = CallSetup {
        progress_url: &call_data.progress_url,
        websocket_token: &call_data.websocket_token,
        callee_token: callee_token.as_deref(),
        call_id: &call_data.call_id,
    };
    let outcome = signaling::simulate_call(variant, &setup, config.wait_budget()).await?;

    if variant.expects_timeout() {
        ensure!(
            outcome.caller.terminated,
            "scenario returned without the expected timeout termination"
        );
        tracing::info!(
            ?variant,
            caller_messages = outcome.caller_log.len(),
            "call timed out as expected"
        );
    } else {
        ensure!(
            outcome.caller.established && outcome.callee.established,
            "scenario returned without both legs connected"
        );
        tracing::info!(
            caller_messages = outcome.caller_log.len(),
            callee_messages = outcome.callee_log.len(),
            "call connected on both legs"
        );
    }
    Ok(())
}

/// HTTP-only churn: set up a call, then reject a fraction of the pending
/// invitations and verify each call's status afterwards.
pub async fn run_churn_scenario(config: &Config) -> Result<()> {
    let mut client = LoopClient::new(&config.server_url);
    let mut rng = SmallRng::from_entropy();

    calls::register(&mut client, &config.simple_push_url).await?;
    let token = calls::generate_call_url(&client, &config.caller_id).await?;
    calls::initiate_call(&client, &token).await?;
    let pending = calls::list_pending_calls(&client).await?;

    let mut rejected = 0usize;
    for call in &pending {
        if rng.gen_range(0..100) < CHURN_REJECT_PERCENT {
            calls::delete_call(&client, &call.call_id).await?;
            calls::call_status(&client, &call.call_id, StatusCode::NOT_FOUND).await?;
            rejected += 1;
        } else {
            calls::call_status(&client, &call.call_id, StatusCode::OK).await?;
        }
    }

    calls::revoke_call_url(&client, &token).await?;
    tracing::info!(total = pending.len(), rejected, "churn iteration complete");
    Ok(())
}

/// What one simulated participant does after joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantPlan {
    /// Presence refreshes before leaving (or abandoning).
    pub refreshes: u32,
    /// Whether the participant leaves cleanly; otherwise it abandons the
    /// room and lets the server expire its presence.
    pub leaves: bool,
}

/// Weighted branch for one participant: mostly short stays, an occasional
/// lurker, and a fifth of participants abandoning without a leave.
pub fn participant_plan(rng: &mut impl Rng) -> ParticipantPlan {
    let refreshes = match rng.gen_range(0..100) {
        0..=59 => 0,
        60..=89 => 1,
        _ => 3,
    };
    ParticipantPlan {
        refreshes,
        leaves: rng.gen_range(0..100) < 80,
    }
}

/// Whether the owner deletes the room at the end (70%) or leaves it to
/// expire server-side.
pub fn owner_deletes_room(rng: &mut impl Rng) -> bool {
    rng.gen_range(0..100) < 70
}

/// Create a room, run `participants` join/refresh/leave rounds with weighted
/// random behavior, then randomly delete the room or let it expire. Load
/// variety only; nothing here asserts beyond the per-request status codes.
pub async fn run_room_scenario(config: &Config, participants: u32) -> Result<()> {
    let mut client = LoopClient::new(&config.server_url);
    let mut rng = SmallRng::from_entropy();

    calls::register(&mut client, &config.simple_push_url).await?;
    let request = CreateRoomRequest {
        max_size: participants.max(2),
        ..CreateRoomRequest::default()
    };
    let room_token = rooms::create_room(&client, &request).await?;

    for i in 0..participants {
        let display_name = format!("Participant {}", i + 1);
        rooms::join_room(&client, &room_token, &display_name).await?;

        let plan = participant_plan(&mut rng);
        for _ in 0..plan.refreshes {
            rooms::refresh_room(&client, &room_token).await?;
        }
        if plan.leaves {
            rooms::leave_room(&client, &room_token).await?;
        } else {
            tracing::debug!(%display_name, "participant abandons the room");
        }
    }

    if owner_deletes_room(&mut rng) {
        rooms::delete_room(&client, &room_token).await?;
    } else {
        tracing::info!(%room_token, "leaving room to expire server-side");
    }

    tracing::info!(participants, "room iteration complete");
    Ok(())
}
