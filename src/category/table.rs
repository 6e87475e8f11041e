//! Category table and classification

use crate::error::{EngineError, Result};
use crate::types::Rating;
use serde::{Deserialize, Serialize};

/// A named rating band `[min_rating, max_rating)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub name: String,
    pub min_rating: Rating,
    /// None for the open-ended top tier
    #[serde(default)]
    pub max_rating: Option<Rating>,
}

impl Tier {
    pub fn new(name: impl Into<String>, min_rating: Rating, max_rating: Option<Rating>) -> Self {
        Self {
            name: name.into(),
            min_rating,
            max_rating,
        }
    }

    pub fn contains(&self, rating: Rating) -> bool {
        rating >= self.min_rating && self.max_rating.map_or(true, |max| rating < max)
    }
}

/// Direction of a category change between two ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryTransition {
    Promotion,
    Demotion,
    Unchanged,
}

/// Ordered tier list, lowest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTable {
    tiers: Vec<Tier>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
        }
    }
}

/// The club's standard four tiers
pub fn default_tiers() -> Vec<Tier> {
    vec![
        Tier::new("ONYX", 800, Some(1400)),
        Tier::new("AMÉTHYSTE", 1400, Some(1700)),
        Tier::new("TOPAZE", 1700, Some(1900)),
        Tier::new("DIAMANT", 1900, None),
    ]
}

impl CategoryTable {
    /// Build a table, rejecting gaps, overlaps and misplaced open ends
    pub fn new(tiers: Vec<Tier>) -> Result<Self> {
        validate_tiers(&tiers)?;
        Ok(Self { tiers })
    }

    /// All tiers in ascending order
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Tier containing `rating`
    ///
    /// Ratings under the lowest minimum still map to the lowest tier.
    pub fn category_for(&self, rating: Rating) -> &Tier {
        self.tiers
            .iter()
            .find(|tier| tier.contains(rating))
            .unwrap_or_else(|| {
                if rating < self.tiers[0].min_rating {
                    &self.tiers[0]
                } else {
                    &self.tiers[self.tiers.len() - 1]
                }
            })
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.tiers.iter().position(|tier| tier.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.name == name)
    }

    /// True iff `to` sits strictly above `from`; unknown names never promote
    pub fn is_promotion(&self, from: &str, to: &str) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(from), Some(to)) => to > from,
            _ => false,
        }
    }

    pub fn is_demotion(&self, from: &str, to: &str) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(from), Some(to)) => to < from,
            _ => false,
        }
    }

    pub fn transition(&self, from: &str, to: &str) -> CategoryTransition {
        if self.is_promotion(from, to) {
            CategoryTransition::Promotion
        } else if self.is_demotion(from, to) {
            CategoryTransition::Demotion
        } else {
            CategoryTransition::Unchanged
        }
    }

    pub fn min_rating_for(&self, name: &str) -> Option<Rating> {
        self.get(name).map(|tier| tier.min_rating)
    }

    /// Rating required to reach the tier above `name`, None at the top
    pub fn rating_for_next(&self, name: &str) -> Option<Rating> {
        let index = self.index_of(name)?;
        self.tiers.get(index + 1).map(|tier| tier.min_rating)
    }

    /// Whether `name` is the category a player rated `rating` belongs to
    pub fn is_eligible(&self, rating: Rating, name: &str) -> bool {
        self.category_for(rating).name == name
    }
}

impl<'de> Deserialize<'de> for CategoryTable {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            tiers: Vec<Tier>,
        }

        let raw = Raw::deserialize(deserializer)?;
        CategoryTable::new(raw.tiers).map_err(serde::de::Error::custom)
    }
}

fn validate_tiers(tiers: &[Tier]) -> Result<()> {
    let fail = |message: String| -> Result<()> {
        Err(EngineError::ConfigurationError { message }.into())
    };

    if tiers.is_empty() {
        return fail("Category table must contain at least one tier".to_string());
    }

    for (index, tier) in tiers.iter().enumerate() {
        if tier.name.trim().is_empty() {
            return fail(format!("Tier #{} has an empty name", index));
        }
        if tiers[..index].iter().any(|other| other.name == tier.name) {
            return fail(format!("Duplicate tier name {}", tier.name));
        }

        let is_top = index == tiers.len() - 1;
        match (tier.max_rating, is_top) {
            (None, false) => {
                return fail(format!("Only the top tier may be open-ended ({})", tier.name))
            }
            (Some(max), _) if max <= tier.min_rating => {
                return fail(format!(
                    "Tier {} has max {} not above min {}",
                    tier.name, max, tier.min_rating
                ))
            }
            _ => {}
        }

        if let Some(next) = tiers.get(index + 1) {
            if tier.max_rating != Some(next.min_rating) {
                return fail(format!(
                    "Tiers {} and {} are not contiguous",
                    tier.name, next.name
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_boundaries() {
        let table = CategoryTable::default();
        assert_eq!(table.category_for(500).name, "ONYX");
        assert_eq!(table.category_for(1000).name, "ONYX");
        assert_eq!(table.category_for(1399).name, "ONYX");
        assert_eq!(table.category_for(1400).name, "AMÉTHYSTE");
        assert_eq!(table.category_for(1699).name, "AMÉTHYSTE");
        assert_eq!(table.category_for(1700).name, "TOPAZE");
        assert_eq!(table.category_for(1900).name, "DIAMANT");
        assert_eq!(table.category_for(3000).name, "DIAMANT");
    }

    #[test]
    fn test_promotion_follows_tier_order() {
        let table = CategoryTable::default();
        assert!(table.is_promotion("ONYX", "AMÉTHYSTE"));
        assert!(table.is_promotion("ONYX", "DIAMANT"));
        assert!(!table.is_promotion("TOPAZE", "AMÉTHYSTE"));
        assert!(!table.is_promotion("TOPAZE", "TOPAZE"));
        assert!(!table.is_promotion("ONYX", "UNKNOWN"));

        assert!(table.is_demotion("TOPAZE", "AMÉTHYSTE"));
        assert_eq!(
            table.transition("AMÉTHYSTE", "AMÉTHYSTE"),
            CategoryTransition::Unchanged
        );
    }

    #[test]
    fn test_next_tier_lookup() {
        let table = CategoryTable::default();
        assert_eq!(table.min_rating_for("TOPAZE"), Some(1700));
        assert_eq!(table.rating_for_next("ONYX"), Some(1400));
        assert_eq!(table.rating_for_next("TOPAZE"), Some(1900));
        assert_eq!(table.rating_for_next("DIAMANT"), None);
        assert_eq!(table.rating_for_next("UNKNOWN"), None);
        assert_eq!(table.tiers().len(), 4);
    }

    #[test]
    fn test_alternate_table() {
        let table = CategoryTable::new(vec![
            Tier::new("BRONZE", 1000, Some(1200)),
            Tier::new("SILVER", 1200, None),
        ])
        .unwrap();

        assert_eq!(table.category_for(1199).name, "BRONZE");
        assert_eq!(table.category_for(1200).name, "SILVER");
        assert!(table.is_eligible(1500, "SILVER"));
    }

    #[test]
    fn test_invalid_tables_are_rejected() {
        assert!(CategoryTable::new(vec![]).is_err());

        // Gap between tiers
        assert!(CategoryTable::new(vec![
            Tier::new("LOW", 800, Some(1000)),
            Tier::new("HIGH", 1100, None),
        ])
        .is_err());

        // Open-ended tier that is not the top one
        assert!(CategoryTable::new(vec![
            Tier::new("LOW", 800, None),
            Tier::new("HIGH", 1100, None),
        ])
        .is_err());

        // Duplicate names
        assert!(CategoryTable::new(vec![
            Tier::new("SAME", 800, Some(1000)),
            Tier::new("SAME", 1000, None),
        ])
        .is_err());
    }

    #[test]
    fn test_table_deserialization_validates() {
        let ok: CategoryTable = serde_json::from_str(
            r#"{"tiers":[{"name":"A","minRating":0,"maxRating":10},{"name":"B","minRating":10}]}"#,
        )
        .unwrap();
        assert_eq!(ok.tiers().len(), 2);

        let bad = serde_json::from_str::<CategoryTable>(
            r#"{"tiers":[{"name":"A","minRating":0,"maxRating":10},{"name":"B","minRating":20}]}"#,
        );
        assert!(bad.is_err());
    }
}
