//! Keyword-based goal parser
//!
//! Maps a goal to workers with a fixed trigger table. Workers are scheduled
//! in table order, not in the order their phrases appear in the goal, so the
//! weather lookup always follows the launch lookup that provides its location
//! and the summary always comes last.

use super::types::{Plan, WorkerId};

/// Trigger phrases per worker, in scheduling priority order
const WORKER_TRIGGERS: &[(WorkerId, &[&str])] = &[
    (WorkerId::Lookup, &["spacex launch", "next launch"]),
    (WorkerId::Enrich, &["weather"]),
    (WorkerId::Summarize, &["summarize", "summary"]),
];

/// Trigger phrases for a worker
pub fn trigger_phrases(worker: WorkerId) -> &'static [&'static str] {
    WORKER_TRIGGERS
        .iter()
        .find(|(id, _)| *id == worker)
        .map(|(_, phrases)| *phrases)
        .unwrap_or(&[])
}

/// Parse a goal into an ordered plan. Matching is case-insensitive; an
/// unmatched goal yields an empty plan.
pub fn parse_goal(goal: &str) -> Plan {
    let goal_lower = goal.to_lowercase();

    let mut plan = Plan::new();
    for (worker, phrases) in WORKER_TRIGGERS {
        if phrases.iter().any(|phrase| goal_lower.contains(phrase)) {
            plan.push(*worker);
        }
    }
    plan
}

/// Trigger phrases of `worker` that occur in the goal
pub fn matched_triggers(goal: &str, worker: WorkerId) -> Vec<&'static str> {
    let goal_lower = goal.to_lowercase();
    trigger_phrases(worker)
        .iter()
        .copied()
        .filter(|phrase| goal_lower.contains(phrase))
        .collect()
}
