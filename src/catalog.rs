use std::collections::HashSet;
use std::path::Path;

use crate::models::MenuItem;

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid catalog entry {id}: {reason}")]
    InvalidItem { id: String, reason: String },
}

/// Fixed, in-memory list of menus recommendations are drawn from
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<MenuItem>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids and inconsistent entries
    pub fn new(items: Vec<MenuItem>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();

        for item in &items {
            let invalid = |reason: &str| CatalogError::InvalidItem {
                id: item.id.clone(),
                reason: reason.to_string(),
            };

            if item.id.trim().is_empty() {
                return Err(invalid("empty id"));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(invalid("duplicate id"));
            }
            if item.meal_times.is_empty() {
                return Err(invalid("no meal times"));
            }
            if item.serves_min == 0 || item.serves_min > item.serves_max {
                return Err(invalid("serving range must satisfy 1 <= min <= max"));
            }
        }

        Ok(Self { items })
    }

    /// The catalog bundled with the binary
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<MenuItem> = serde_json::from_str(json)?;
        Self::new(items)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// History entries only record display names, so recency maps them back here
    pub fn find_by_name(&self, name: &str) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.name == name)
    }
}
