use serde::Serialize;

use crate::models::{DietType, MenuItem, RecommendRequest};

/// Which soft rules a ladder stage switches off
///
/// A set flag means the rule is skipped and treated as satisfied. The meal-time
/// rule has no flag: it always applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelaxFlags {
    pub people: bool,
    pub cooking_minutes: bool,
    pub budget: bool,
    pub diet: bool,
    pub spice: bool,
    pub avoid_ingredients: bool,
    pub cuisine: bool,
}

impl RelaxFlags {
    pub const NONE: RelaxFlags = RelaxFlags {
        people: false,
        cooking_minutes: false,
        budget: false,
        diet: false,
        spice: false,
        avoid_ingredients: false,
        cuisine: false,
    };

    pub const ALL: RelaxFlags = RelaxFlags {
        people: true,
        cooking_minutes: true,
        budget: true,
        diet: true,
        spice: true,
        avoid_ingredients: true,
        cuisine: true,
    };
}

/// True when any ingredient contains any avoided token (case-insensitive substring)
pub fn contains_avoided(ingredients: &[String], avoid: &[String]) -> bool {
    let avoid: Vec<String> = avoid
        .iter()
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    if avoid.is_empty() {
        return false;
    }

    ingredients.iter().any(|ingredient| {
        let ingredient = ingredient.to_lowercase();
        avoid.iter().any(|token| ingredient.contains(token.as_str()))
    })
}

/// Whether `item` is eligible for `request` under the given relaxation
pub fn is_allowed(item: &MenuItem, request: &RecommendRequest, relax: &RelaxFlags) -> bool {
    if !item.meal_times.contains(&request.meal_time) {
        return false;
    }

    if !relax.people && !item.serves(request.people) {
        return false;
    }

    if !relax.cooking_minutes && item.cooking_minutes > request.cooking_minutes_max {
        return false;
    }

    if !relax.budget && item.price_tier.rank() > request.budget_tier().rank() {
        return false;
    }

    if !relax.diet && request.diet != DietType::Any && !item.diet_types.contains(&request.diet) {
        return false;
    }

    if !relax.spice && item.spice != request.spice {
        return false;
    }

    if !relax.cuisine {
        if let Some(cuisine) = &request.cuisine {
            if !item.cuisine.eq_ignore_ascii_case(cuisine) {
                return false;
            }
        }
    }

    if !relax.avoid_ingredients && contains_avoided(&item.ingredients, &request.avoid_ingredients)
    {
        return false;
    }

    true
}
