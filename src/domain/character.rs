//! Character entity types for catalog synchronization
//!
//! The remote catalog reports missing attributes as absent or blank fields.
//! Those stay `Option`/empty inside the engine; the persisted record is the
//! only place the display sentinels are produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel stored for scalar attributes the remote catalog did not provide.
pub const UNKNOWN: &str = "Unknown";

/// Raw character payload as parsed at the HTTP boundary.
///
/// Field names mirror the remote `properties` object. Reference fields hold
/// raw URLs here; they are resolved to display names before persistence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterProperties {
    pub name: Option<String>,
    pub birth_year: Option<String>,
    pub eye_color: Option<String>,
    pub gender: Option<String>,
    pub hair_color: Option<String>,
    pub mass: Option<String>,
    pub skin_color: Option<String>,
    pub homeworld: Option<String>,
    #[serde(default)]
    pub films: Vec<String>,
    #[serde(default)]
    pub species: Vec<String>,
    #[serde(default)]
    pub starships: Vec<String>,
    #[serde(default)]
    pub vehicles: Vec<String>,
}

/// Resolved display names for every reference field of one character.
///
/// `homeworld` is `None` when unresolved; the list fields are already
/// comma-joined by the resolver (empty string when nothing resolved).
#[derive(Debug, Clone, Default)]
pub struct ResolvedReferences {
    pub homeworld: Option<String>,
    pub films: String,
    pub species: String,
    pub starships: String,
    pub vehicles: String,
}

/// A character row as persisted in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: i64,
    pub name: String,
    pub birth_year: String,
    pub eye_color: String,
    pub gender: String,
    pub hair_color: String,
    pub mass: String,
    pub skin_color: String,
    pub homeworld_name: String,
    pub films: String,
    pub species: String,
    pub starships: String,
    pub vehicles: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl CharacterRecord {
    /// Build the persisted record from a fetched payload and its resolved
    /// references, substituting sentinels for missing scalar data.
    pub fn from_properties(
        id: i64,
        properties: CharacterProperties,
        references: ResolvedReferences,
    ) -> Self {
        Self {
            id,
            name: display_name(id, properties.name),
            birth_year: or_unknown(properties.birth_year),
            eye_color: or_unknown(properties.eye_color),
            gender: or_unknown(properties.gender),
            hair_color: or_unknown(properties.hair_color),
            mass: or_unknown(properties.mass),
            skin_color: or_unknown(properties.skin_color),
            homeworld_name: or_unknown(references.homeworld),
            films: references.films,
            species: references.species,
            starships: references.starships,
            vehicles: references.vehicles,
            created_at: Utc::now(),
        }
    }
}

/// Blank names get a synthesized placeholder so the `name` column stays
/// non-empty.
fn display_name(id: i64, name: Option<String>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name,
        _ => format!("Character {id}"),
    }
}

fn or_unknown(value: Option<String>) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value,
        _ => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_properties() -> CharacterProperties {
        CharacterProperties {
            name: Some("Luke Skywalker".to_string()),
            birth_year: Some("19BBY".to_string()),
            eye_color: Some("blue".to_string()),
            gender: Some("male".to_string()),
            hair_color: Some("blond".to_string()),
            mass: Some("77".to_string()),
            skin_color: Some("fair".to_string()),
            homeworld: Some("https://example.test/api/planets/1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn record_keeps_provided_values() {
        let references = ResolvedReferences {
            homeworld: Some("Tatooine".to_string()),
            films: "A New Hope, The Empire Strikes Back".to_string(),
            ..Default::default()
        };
        let record = CharacterRecord::from_properties(1, sample_properties(), references);

        assert_eq!(record.name, "Luke Skywalker");
        assert_eq!(record.birth_year, "19BBY");
        assert_eq!(record.homeworld_name, "Tatooine");
        assert_eq!(record.films, "A New Hope, The Empire Strikes Back");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    #[case(Some("   ".to_string()))]
    fn missing_scalars_become_sentinel(#[case] value: Option<String>) {
        let properties = CharacterProperties {
            birth_year: value,
            ..Default::default()
        };
        let record =
            CharacterRecord::from_properties(4, properties, ResolvedReferences::default());

        assert_eq!(record.birth_year, UNKNOWN);
    }

    #[test]
    fn blank_name_gets_placeholder() {
        let properties = CharacterProperties {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        let record =
            CharacterRecord::from_properties(42, properties, ResolvedReferences::default());

        assert_eq!(record.name, "Character 42");
    }

    #[test]
    fn unresolved_homeworld_becomes_sentinel_but_lists_stay_empty() {
        let record = CharacterRecord::from_properties(
            7,
            sample_properties(),
            ResolvedReferences::default(),
        );

        assert_eq!(record.homeworld_name, UNKNOWN);
        assert_eq!(record.films, "");
        assert_eq!(record.vehicles, "");
    }
}
