//! Storage-usage estimator for capacity planning.
//!
//! Mirrors the measured per-record costs of the service's Redis schema:
//! fixed per-user registration state, per-call state multiplied out by daily
//! call volume, revocation tombstones, and the rooms schema (room record plus
//! per-participant presence). The base overhead covers connection and index
//! keys that exist regardless of load.

/// Measured average key+value sizes, in bytes.
const BYTES_PER_USER: u64 = 280;
const BYTES_PER_CALL: u64 = 1365;
const BYTES_PER_REVOCATION: u64 = 150;
const BYTES_PER_ROOM: u64 = 795;
const BYTES_PER_PARTICIPANT: u64 = 230;
const BASE_OVERHEAD: u64 = 600_000;

/// Inputs to the estimate. Room fields default to zero for deployments that
/// only do direct calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsageInputs {
    pub users: u64,
    /// Average calls per user per day.
    pub daily_calls: u64,
    pub monthly_revocations: u64,
    pub rooms: u64,
    pub participants_per_room: u64,
}

/// Estimated storage, in bytes, to hold one day of state.
pub fn compute_usage(inputs: &UsageInputs) -> u64 {
    inputs.users * BYTES_PER_USER
        + inputs.daily_calls * inputs.users * BYTES_PER_CALL
        + inputs.monthly_revocations * BYTES_PER_REVOCATION
        + inputs.rooms * BYTES_PER_ROOM
        + inputs.rooms * inputs.participants_per_room * BYTES_PER_PARTICIPANT
        + BASE_OVERHEAD
}

/// Human-readable report for the CLI.
pub fn report(inputs: &UsageInputs) -> String {
    let usage = compute_usage(inputs);
    let mut text = format!(
        "Usage for {} users, with {} calls per user and {} revocations (per month)",
        inputs.users, inputs.daily_calls, inputs.monthly_revocations
    );
    if inputs.rooms > 0 {
        text.push_str(&format!(
            ", plus {} rooms of {} participants",
            inputs.rooms, inputs.participants_per_room
        ));
    }
    text.push_str(&format!(" is {} bytes", usage));
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_overhead_only() {
        assert_eq!(compute_usage(&UsageInputs::default()), 600_000);
    }

    #[test]
    fn test_call_term_scales_with_users_times_calls() {
        let inputs = UsageInputs {
            users: 1000,
            daily_calls: 2,
            monthly_revocations: 10,
            ..UsageInputs::default()
        };
        assert_eq!(
            compute_usage(&inputs),
            1000 * 280 + 2 * 1000 * 1365 + 10 * 150 + 600_000
        );
    }

    #[test]
    fn test_room_terms() {
        let without = UsageInputs {
            users: 10,
            daily_calls: 1,
            ..UsageInputs::default()
        };
        let with = UsageInputs {
            rooms: 5,
            participants_per_room: 4,
            ..without
        };
        assert_eq!(
            compute_usage(&with) - compute_usage(&without),
            5 * 795 + 5 * 4 * 230
        );
    }

    #[test]
    fn test_report_mentions_rooms_only_when_present() {
        let inputs = UsageInputs {
            users: 5,
            daily_calls: 1,
            ..UsageInputs::default()
        };
        let text = report(&inputs);
        assert!(text.starts_with("Usage for 5 users"));
        assert!(!text.contains("rooms"));

        let with_rooms = UsageInputs {
            rooms: 2,
            participants_per_room: 3,
            ..inputs
        };
        assert!(report(&with_rooms).contains("2 rooms of 3 participants"));
    }
}
