use serde::{Deserialize, Serialize};

use super::{BudgetTier, DietType, MealTime, SpiceLevel};

pub const PEOPLE_MIN: u32 = 1;
pub const PEOPLE_MAX: u32 = 12;
pub const COOKING_MINUTES_MIN: u32 = 5;
pub const COOKING_MINUTES_MAX: u32 = 240;

/// A user's preferences for one recommendation call
///
/// Built fresh for every call and never mutated afterwards; [`normalized`](Self::normalized)
/// returns a new value rather than editing in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub meal_time: MealTime,
    pub people: u32,
    pub spice: SpiceLevel,
    /// Per-person budget in KRW
    pub budget_per_person: u32,
    #[serde(default)]
    pub diet: DietType,
    pub cooking_minutes_max: u32,
    #[serde(default)]
    pub avoid_ingredients: Vec<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
}

impl RecommendRequest {
    /// Clamps numeric fields into their accepted ranges and canonicalises the
    /// avoid list and cuisine filter.
    pub fn normalized(self) -> Self {
        let avoid_ingredients = normalize_avoid_list(
            self.avoid_ingredients
                .iter()
                .flat_map(|entry| parse_avoid_tokens(entry)),
        );

        let cuisine = self
            .cuisine
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty());

        Self {
            people: self.people.clamp(PEOPLE_MIN, PEOPLE_MAX),
            cooking_minutes_max: self
                .cooking_minutes_max
                .clamp(COOKING_MINUTES_MIN, COOKING_MINUTES_MAX),
            avoid_ingredients,
            cuisine,
            ..self
        }
    }

    pub fn budget_tier(&self) -> BudgetTier {
        BudgetTier::from_per_person(self.budget_per_person)
    }

    /// Canonical encoding of every request field
    ///
    /// The avoid list is sorted before joining, so the same ingredients in a
    /// different order produce the same signature.
    pub fn signature(&self) -> String {
        let mut avoid: Vec<&str> = self.avoid_ingredients.iter().map(String::as_str).collect();
        avoid.sort_unstable();

        [
            self.meal_time.as_str().to_string(),
            self.people.to_string(),
            self.spice.as_str().to_string(),
            self.budget_per_person.to_string(),
            self.diet.as_str().to_string(),
            self.cooking_minutes_max.to_string(),
            self.cuisine.clone().unwrap_or_default(),
            avoid.join(","),
        ]
        .join("|")
    }
}

/// Splits free text like `"Pork, shrimp ,"` into lower-cased tokens
pub fn parse_avoid_tokens(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// De-duplicates tokens, keeping first occurrence order
fn normalize_avoid_list(tokens: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> RecommendRequest {
        RecommendRequest {
            meal_time: MealTime::Lunch,
            people: 2,
            spice: SpiceLevel::Normal,
            budget_per_person: 12_000,
            diet: DietType::Any,
            cooking_minutes_max: 30,
            avoid_ingredients: vec![],
            cuisine: None,
        }
    }

    #[test]
    fn test_signature_ignores_avoid_order() {
        let a = RecommendRequest {
            avoid_ingredients: vec!["shrimp".into(), "pork".into(), "egg".into()],
            ..base_request()
        };
        let b = RecommendRequest {
            avoid_ingredients: vec!["egg".into(), "shrimp".into(), "pork".into()],
            ..base_request()
        };
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn test_signature_changes_with_every_field() {
        let base = base_request();
        let variants = vec![
            RecommendRequest { meal_time: MealTime::Dinner, ..base_request() },
            RecommendRequest { people: 3, ..base_request() },
            RecommendRequest { spice: SpiceLevel::Hot, ..base_request() },
            RecommendRequest { budget_per_person: 20_000, ..base_request() },
            RecommendRequest { diet: DietType::Vegetarian, ..base_request() },
            RecommendRequest { cooking_minutes_max: 45, ..base_request() },
            RecommendRequest { avoid_ingredients: vec!["pork".into()], ..base_request() },
            RecommendRequest { cuisine: Some("korean".into()), ..base_request() },
        ];

        for variant in variants {
            assert_ne!(variant.signature(), base.signature(), "{:?}", variant);
        }
    }

    #[test]
    fn test_signature_format() {
        let request = RecommendRequest {
            avoid_ingredients: vec!["pork".into(), "egg".into()],
            ..base_request()
        };
        assert_eq!(request.signature(), "lunch|2|normal|12000|any|30||egg,pork");
    }

    #[test]
    fn test_normalized_clamps_ranges() {
        let request = RecommendRequest {
            people: 0,
            cooking_minutes_max: 1_000,
            ..base_request()
        }
        .normalized();
        assert_eq!(request.people, PEOPLE_MIN);
        assert_eq!(request.cooking_minutes_max, COOKING_MINUTES_MAX);

        let request = RecommendRequest {
            people: 40,
            cooking_minutes_max: 0,
            ..base_request()
        }
        .normalized();
        assert_eq!(request.people, PEOPLE_MAX);
        assert_eq!(request.cooking_minutes_max, COOKING_MINUTES_MIN);
    }

    #[test]
    fn test_normalized_avoid_list() {
        let request = RecommendRequest {
            avoid_ingredients: vec![" Pork, shrimp ,".into(), "PORK".into(), "".into()],
            cuisine: Some("  Korean ".into()),
            ..base_request()
        }
        .normalized();
        assert_eq!(request.avoid_ingredients, vec!["pork", "shrimp"]);
        assert_eq!(request.cuisine.as_deref(), Some("korean"));
    }

    #[test]
    fn test_blank_cuisine_becomes_none() {
        let request = RecommendRequest {
            cuisine: Some("   ".into()),
            ..base_request()
        }
        .normalized();
        assert_eq!(request.cuisine, None);
    }

    #[test]
    fn test_budget_tier_derived_from_amount() {
        assert_eq!(base_request().budget_tier(), BudgetTier::Normal);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let request: RecommendRequest = serde_json::from_value(serde_json::json!({
            "meal_time": "dinner",
            "people": 4,
            "spice": "hot",
            "budget_per_person": 8000,
            "cooking_minutes_max": 40
        }))
        .unwrap();
        assert_eq!(request.diet, DietType::Any);
        assert!(request.avoid_ingredients.is_empty());
        assert_eq!(request.cuisine, None);
        assert_eq!(request.budget_tier(), BudgetTier::Low);
    }
}
