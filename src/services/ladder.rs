use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::models::{MenuItem, RecommendRequest};

use super::constraints::{is_allowed, RelaxFlags};
use super::scoring::ScoredCandidate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Strict,
    RelaxAvoid,
    RelaxPortionAndTime,
    MealTimeOnly,
    AllowRepeats,
}

/// One rung of the relaxation ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub name: StageName,
    pub label: &'static str,
    pub relax: RelaxFlags,
    /// Whether menus already shown today stay eligible
    pub allow_used: bool,
}

/// Stages from strictest to most lenient. Each one relaxes a superset of the
/// previous stage's rules.
pub static STAGES: [Stage; 5] = [
    Stage {
        name: StageName::Strict,
        label: "All of your conditions were applied",
        relax: RelaxFlags::NONE,
        allow_used: false,
    },
    Stage {
        name: StageName::RelaxAvoid,
        label: "Relaxed the ingredients-to-avoid condition",
        relax: RelaxFlags {
            avoid_ingredients: true,
            ..RelaxFlags::NONE
        },
        allow_used: false,
    },
    Stage {
        name: StageName::RelaxPortionAndTime,
        label: "Relaxed the party size and cooking time conditions",
        relax: RelaxFlags {
            avoid_ingredients: true,
            people: true,
            cooking_minutes: true,
            ..RelaxFlags::NONE
        },
        allow_used: false,
    },
    Stage {
        name: StageName::MealTimeOnly,
        label: "Relaxed the diet, budget, spice and cuisine conditions",
        relax: RelaxFlags::ALL,
        allow_used: false,
    },
    Stage {
        name: StageName::AllowRepeats,
        label: "Recommended as flexibly as possible for this meal time",
        relax: RelaxFlags::ALL,
        allow_used: true,
    },
];

/// The stage that produced candidates, its ranked pool and a user-facing note
#[derive(Debug, Clone)]
pub struct LadderOutcome<'a> {
    pub stage: &'static Stage,
    pub candidates: Vec<ScoredCandidate<'a>>,
    pub explanation: String,
}

/// Candidate counts for one stage, without scoring or state changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePool {
    pub stage: StageName,
    pub label: &'static str,
    /// Items passing the stage's rules
    pub eligible: usize,
    /// Eligible items not yet shown today
    pub fresh: usize,
    /// Fresh items also outside the recency window
    pub unseen: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolInfo {
    pub stages: Vec<StagePool>,
    /// The stage a recommendation would be drawn from, if any
    pub selected_stage: Option<StageName>,
}

/// Orders candidates best first
///
/// Ties on score go to the candidate with more breakdown lines, then cuisine
/// and name ascending. The breakdown-length rule only fires when one side
/// carries the avoided-ingredient penalty line; it is kept for parity with
/// existing rankings.
///
/// Cuisine and name compare byte-wise, not locale-aware, so an upper-case
/// name sorts before every lower-case one. Catalog cuisines are lower-case
/// ASCII, which keeps the two orders identical there.
fn compare_candidates(a: &ScoredCandidate<'_>, b: &ScoredCandidate<'_>) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.breakdown.len().cmp(&a.breakdown.len()))
        .then_with(|| a.item.cuisine.cmp(&b.item.cuisine))
        .then_with(|| a.item.name.cmp(&b.item.name))
}

/// Scores and sorts every item that passes `stage`
pub fn rank_stage<'a>(
    items: &'a [MenuItem],
    request: &RecommendRequest,
    stage: &Stage,
) -> Vec<ScoredCandidate<'a>> {
    let mut ranked: Vec<ScoredCandidate<'a>> = items
        .iter()
        .filter(|item| is_allowed(item, request, &stage.relax))
        .map(|item| ScoredCandidate::new(item, request))
        .collect();

    ranked.sort_by(compare_candidates);
    ranked
}

/// Narrows a non-empty ranked stage down to the menus worth showing
///
/// Prefers menus neither shown today nor recently, then menus not shown
/// today, and finally falls back to the whole stage so a matching stage
/// never comes back empty.
fn select_pool<'a>(
    ranked: Vec<ScoredCandidate<'a>>,
    stage: &Stage,
    used_ids: &HashSet<String>,
    recent_ids: &HashSet<String>,
) -> Vec<ScoredCandidate<'a>> {
    if stage.allow_used {
        return ranked;
    }

    let unseen: Vec<ScoredCandidate<'a>> = ranked
        .iter()
        .filter(|c| !used_ids.contains(&c.item.id) && !recent_ids.contains(&c.item.id))
        .cloned()
        .collect();
    if !unseen.is_empty() {
        return unseen;
    }

    let fresh: Vec<ScoredCandidate<'a>> = ranked
        .iter()
        .filter(|c| !used_ids.contains(&c.item.id))
        .cloned()
        .collect();
    if !fresh.is_empty() {
        return fresh;
    }

    ranked
}

fn explain(stage: &Stage, used_ids: &HashSet<String>) -> String {
    if stage.allow_used && !used_ids.is_empty() {
        format!(
            "{}. Every fresh option was already shown today, so repeats are allowed.",
            stage.label
        )
    } else {
        stage.label.to_string()
    }
}

/// Walks the stages strictest first and stops at the first one with any eligible menu
pub fn run_ladder<'a>(
    items: &'a [MenuItem],
    request: &RecommendRequest,
    used_ids: &HashSet<String>,
    recent_ids: &HashSet<String>,
) -> Option<LadderOutcome<'a>> {
    for stage in STAGES.iter() {
        let ranked = rank_stage(items, request, stage);

        tracing::debug!(
            stage = ?stage.name,
            eligible = ranked.len(),
            "Evaluated relaxation stage"
        );

        if ranked.is_empty() {
            continue;
        }

        return Some(LadderOutcome {
            stage,
            candidates: select_pool(ranked, stage, used_ids, recent_ids),
            explanation: explain(stage, used_ids),
        });
    }

    None
}

/// Per-stage candidate counts; a read-only preview of [`run_ladder`]
pub fn pool_info(
    items: &[MenuItem],
    request: &RecommendRequest,
    used_ids: &HashSet<String>,
    recent_ids: &HashSet<String>,
) -> PoolInfo {
    let stages: Vec<StagePool> = STAGES
        .iter()
        .map(|stage| {
            let eligible: Vec<&MenuItem> = items
                .iter()
                .filter(|item| is_allowed(item, request, &stage.relax))
                .collect();

            let fresh: Vec<&MenuItem> = if stage.allow_used {
                eligible.clone()
            } else {
                eligible
                    .iter()
                    .copied()
                    .filter(|item| !used_ids.contains(&item.id))
                    .collect()
            };

            let unseen = fresh
                .iter()
                .filter(|item| stage.allow_used || !recent_ids.contains(&item.id))
                .count();

            StagePool {
                stage: stage.name,
                label: stage.label,
                eligible: eligible.len(),
                fresh: fresh.len(),
                unseen,
            }
        })
        .collect();

    let selected_stage = stages.iter().find(|s| s.eligible > 0).map(|s| s.stage);

    PoolInfo {
        stages,
        selected_stage,
    }
}
