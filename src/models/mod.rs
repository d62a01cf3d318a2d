use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod history;
pub mod recommendation;
pub mod request;

pub use history::{FavoriteSet, HistoryEntry};
pub use recommendation::Recommendation;
pub use request::RecommendRequest;

/// Meal slot a menu can be served in. The only rule that is never relaxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealTime {
    Breakfast,
    Lunch,
    Dinner,
    LateNight,
}

impl MealTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealTime::Breakfast => "breakfast",
            MealTime::Lunch => "lunch",
            MealTime::Dinner => "dinner",
            MealTime::LateNight => "late_night",
        }
    }
}

impl Display for MealTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spice preference, ordered mild to extra hot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiceLevel {
    Mild,
    Normal,
    Hot,
    ExtraHot,
}

impl SpiceLevel {
    /// Ordinal position used for distance scoring
    pub fn rank(&self) -> i32 {
        match self {
            SpiceLevel::Mild => 0,
            SpiceLevel::Normal => 1,
            SpiceLevel::Hot => 2,
            SpiceLevel::ExtraHot => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpiceLevel::Mild => "mild",
            SpiceLevel::Normal => "normal",
            SpiceLevel::Hot => "hot",
            SpiceLevel::ExtraHot => "extra_hot",
        }
    }
}

/// Price tier of a menu, and the tier a per-person budget maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Low,
    Normal,
    Generous,
}

/// Per-person amounts (KRW) below this map to [`BudgetTier::Low`]
pub const LOW_BUDGET_CEILING: u32 = 9_000;
/// Per-person amounts (KRW) below this map to [`BudgetTier::Normal`]
pub const NORMAL_BUDGET_CEILING: u32 = 15_000;

impl BudgetTier {
    pub fn rank(&self) -> i32 {
        match self {
            BudgetTier::Low => 0,
            BudgetTier::Normal => 1,
            BudgetTier::Generous => 2,
        }
    }

    /// Maps a per-person amount in KRW onto the ordinal tier scale
    pub fn from_per_person(amount: u32) -> Self {
        if amount < LOW_BUDGET_CEILING {
            BudgetTier::Low
        } else if amount < NORMAL_BUDGET_CEILING {
            BudgetTier::Normal
        } else {
            BudgetTier::Generous
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Normal,
    Involved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietType {
    /// No diet preference; never filters anything out
    #[default]
    Any,
    Vegetarian,
    HighProtein,
    LowCarb,
    LowCalorie,
}

impl DietType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DietType::Any => "any",
            DietType::Vegetarian => "vegetarian",
            DietType::HighProtein => "high_protein",
            DietType::LowCarb => "low_carb",
            DietType::LowCalorie => "low_calorie",
        }
    }
}

/// A catalog entry. Immutable once the catalog is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cuisine: String,
    pub meal_times: Vec<MealTime>,
    pub spice: SpiceLevel,
    pub cooking_minutes: u32,
    pub serves_min: u32,
    pub serves_max: u32,
    pub price_tier: BudgetTier,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub diet_types: Vec<DietType>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub kcal: u32,
}

impl MenuItem {
    pub fn serves(&self, people: u32) -> bool {
        (self.serves_min..=self.serves_max).contains(&people)
    }

    /// Units the party size falls outside `[serves_min, serves_max]`
    pub fn party_size_gap(&self, people: u32) -> u32 {
        if people < self.serves_min {
            self.serves_min - people
        } else if people > self.serves_max {
            people - self.serves_max
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_tier_from_per_person() {
        assert_eq!(BudgetTier::from_per_person(0), BudgetTier::Low);
        assert_eq!(BudgetTier::from_per_person(8_999), BudgetTier::Low);
        assert_eq!(BudgetTier::from_per_person(9_000), BudgetTier::Normal);
        assert_eq!(BudgetTier::from_per_person(14_999), BudgetTier::Normal);
        assert_eq!(BudgetTier::from_per_person(15_000), BudgetTier::Generous);
    }

    #[test]
    fn test_meal_time_serde() {
        let json = serde_json::to_string(&MealTime::LateNight).unwrap();
        assert_eq!(json, "\"late_night\"");

        let parsed: MealTime = serde_json::from_str("\"lunch\"").unwrap();
        assert_eq!(parsed, MealTime::Lunch);
        assert_eq!(parsed.to_string(), "lunch");
    }

    #[test]
    fn test_diet_type_defaults_to_any() {
        assert_eq!(DietType::default(), DietType::Any);
    }

    #[test]
    fn test_spice_rank_is_ordered() {
        let ranks: Vec<i32> = [
            SpiceLevel::Mild,
            SpiceLevel::Normal,
            SpiceLevel::Hot,
            SpiceLevel::ExtraHot,
        ]
        .iter()
        .map(SpiceLevel::rank)
        .collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_party_size_gap() {
        let item: MenuItem = serde_json::from_value(serde_json::json!({
            "id": "bibimbap",
            "name": "Bibimbap",
            "cuisine": "korean",
            "meal_times": ["lunch"],
            "spice": "normal",
            "cooking_minutes": 20,
            "serves_min": 2,
            "serves_max": 4,
            "price_tier": "normal",
            "difficulty": "easy"
        }))
        .unwrap();

        assert_eq!(item.party_size_gap(1), 1);
        assert_eq!(item.party_size_gap(3), 0);
        assert_eq!(item.party_size_gap(7), 3);
        assert!(item.serves(4));
        assert!(!item.serves(5));
        assert!(item.ingredients.is_empty());
    }
}
