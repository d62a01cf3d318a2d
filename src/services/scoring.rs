use serde::Serialize;

use crate::models::{Difficulty, MenuItem, RecommendRequest};

use super::constraints::contains_avoided;

pub const MAX_SCORE: f64 = 100.0;
pub const MAX_REASONS: usize = 3;

const PARTY_SIZE_BASE: f64 = 20.0;
const PARTY_SIZE_PENALTY_PER_UNIT: f64 = 4.0;
const COOKING_TIME_BASE: f64 = 15.0;
const COOKING_EXCESS_CAP_MINUTES: f64 = 60.0;
const COOKING_EXCESS_DIVISOR: f64 = 4.0;
const BUDGET_BASE: f64 = 16.0;
const BUDGET_UNDER_STEP: f64 = 3.0;
const BUDGET_OVER_STEP: f64 = 6.0;
const SPICE_BASE: f64 = 12.0;
const SPICE_PENALTY_PER_STEP: f64 = 4.0;
const EASY_BONUS: f64 = 6.0;
const NORMAL_DIFFICULTY_BONUS: f64 = 3.0;
const AVOIDED_INGREDIENT_PENALTY: f64 = 12.0;

/// Component that contributed to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    PartySize,
    CookingTime,
    Budget,
    Spice,
    Difficulty,
    AvoidedIngredient,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreLine {
    pub factor: ScoreFactor,
    pub value: f64,
}

impl ScoreLine {
    fn new(factor: ScoreFactor, value: f64) -> Self {
        Self { factor, value }
    }
}

/// Result of scoring one menu against a request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuScore {
    /// Clamped to `[0, MAX_SCORE]`
    pub value: f64,
    pub reasons: Vec<String>,
    pub breakdown: Vec<ScoreLine>,
}

/// A menu that passed a stage's rules, with its score attached
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub item: &'a MenuItem,
    pub score: f64,
    pub reasons: Vec<String>,
    pub breakdown: Vec<ScoreLine>,
}

impl<'a> ScoredCandidate<'a> {
    pub fn new(item: &'a MenuItem, request: &RecommendRequest) -> Self {
        let MenuScore {
            value,
            reasons,
            breakdown,
        } = score(item, request);

        Self {
            item,
            score: value,
            reasons,
            breakdown,
        }
    }
}

/// Scores `item` against `request`. Deterministic: same inputs, same output.
///
/// Factors are evaluated in a fixed order (party size, cooking time, budget,
/// spice, difficulty, avoided ingredients); reasons follow that order and are
/// cut to the first [`MAX_REASONS`].
pub fn score(item: &MenuItem, request: &RecommendRequest) -> MenuScore {
    let mut reasons = Vec::new();
    let mut breakdown = Vec::new();

    let gap = item.party_size_gap(request.people);
    let party_fit = (PARTY_SIZE_BASE - f64::from(gap) * PARTY_SIZE_PENALTY_PER_UNIT)
        .clamp(0.0, PARTY_SIZE_BASE);
    breakdown.push(ScoreLine::new(ScoreFactor::PartySize, party_fit));
    if gap == 0 {
        reasons.push(format!("Serves your party of {} exactly", request.people));
    } else {
        reasons.push("Closest serving size to your party".to_string());
    }

    let excess = f64::from(item.cooking_minutes.saturating_sub(request.cooking_minutes_max))
        .min(COOKING_EXCESS_CAP_MINUTES);
    let cooking_fit =
        (COOKING_TIME_BASE - excess / COOKING_EXCESS_DIVISOR).clamp(0.0, COOKING_TIME_BASE);
    breakdown.push(ScoreLine::new(ScoreFactor::CookingTime, cooking_fit));
    if item.cooking_minutes <= request.cooking_minutes_max {
        reasons.push(format!("Ready in {} minutes", item.cooking_minutes));
    }

    // Cheaper-than-asked menus earn slightly more than an exact tier match.
    let budget_gap = item.price_tier.rank() - request.budget_tier().rank();
    if budget_gap <= 0 {
        let budget_fit = BUDGET_BASE - f64::from(budget_gap) * BUDGET_UNDER_STEP;
        breakdown.push(ScoreLine::new(ScoreFactor::Budget, budget_fit));
        reasons.push("Fits your budget".to_string());
    } else {
        let budget_fit =
            (BUDGET_BASE - f64::from(budget_gap) * BUDGET_OVER_STEP).clamp(0.0, BUDGET_BASE);
        breakdown.push(ScoreLine::new(ScoreFactor::Budget, budget_fit));
    }

    let spice_gap = (item.spice.rank() - request.spice.rank()).abs();
    let spice_fit =
        (SPICE_BASE - f64::from(spice_gap) * SPICE_PENALTY_PER_STEP).clamp(0.0, SPICE_BASE);
    breakdown.push(ScoreLine::new(ScoreFactor::Spice, spice_fit));
    if spice_gap == 0 {
        reasons.push("Matches your spice preference".to_string());
    }

    let difficulty_bonus = match item.difficulty {
        Difficulty::Easy => EASY_BONUS,
        Difficulty::Normal => NORMAL_DIFFICULTY_BONUS,
        Difficulty::Involved => 0.0,
    };
    breakdown.push(ScoreLine::new(ScoreFactor::Difficulty, difficulty_bonus));
    if item.difficulty == Difficulty::Easy {
        reasons.push("Easy to make".to_string());
    }

    // Only reachable once a stage has relaxed the avoid rule. The extra
    // breakdown line also feeds the ladder's tie-break.
    if contains_avoided(&item.ingredients, &request.avoid_ingredients) {
        breakdown.push(ScoreLine::new(
            ScoreFactor::AvoidedIngredient,
            -AVOIDED_INGREDIENT_PENALTY,
        ));
    }

    reasons.truncate(MAX_REASONS);
    let total: f64 = breakdown.iter().map(|line| line.value).sum();

    MenuScore {
        value: total.clamp(0.0, MAX_SCORE),
        reasons,
        breakdown,
    }
}
