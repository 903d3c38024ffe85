//! Repository implementation for the character store
//!
//! Upserts are single-statement transactions keyed by `id`; the conflict
//! clause updates every column except `created_at`, which therefore keeps
//! its first-insert value across re-synchronizations.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::character::{CharacterRecord, UNKNOWN};
use crate::domain::repositories::CharacterRepository;

#[derive(Clone)]
pub struct SqliteCharacterRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteCharacterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> CharacterRecord {
        CharacterRecord {
            id: row.get("id"),
            name: row.get("name"),
            birth_year: row.get("birth_year"),
            eye_color: row.get("eye_color"),
            gender: row.get("gender"),
            hair_color: row.get("hair_color"),
            mass: row.get("mass"),
            skin_color: row.get("skin_color"),
            homeworld_name: row.get("homeworld_name"),
            films: row.get("films"),
            species: row.get("species"),
            starships: row.get("starships"),
            vehicles: row.get("vehicles"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
        }
    }
}

#[async_trait]
impl CharacterRepository for SqliteCharacterRepository {
    async fn existing_ids(&self) -> Result<HashSet<i64>> {
        let rows = sqlx::query("SELECT id FROM characters")
            .fetch_all(&*self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get::<i64, _>("id")).collect())
    }

    async fn upsert(&self, record: &CharacterRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO characters
            (id, name, birth_year, eye_color, gender, hair_color, mass, skin_color,
             homeworld_name, films, species, starships, vehicles, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                birth_year = excluded.birth_year,
                eye_color = excluded.eye_color,
                gender = excluded.gender,
                hair_color = excluded.hair_color,
                mass = excluded.mass,
                skin_color = excluded.skin_color,
                homeworld_name = excluded.homeworld_name,
                films = excluded.films,
                species = excluded.species,
                starships = excluded.starships,
                vehicles = excluded.vehicles
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(&record.birth_year)
        .bind(&record.eye_color)
        .bind(&record.gender)
        .bind(&record.hair_color)
        .bind(&record.mass)
        .bind(&record.skin_color)
        .bind(&record.homeworld_name)
        .bind(&record.films)
        .bind(&record.species)
        .bind(&record.starships)
        .bind(&record.vehicles)
        .bind(record.created_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CharacterRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, birth_year, eye_color, gender, hair_color, mass, skin_color,
                   homeworld_name, films, species, starships, vehicles, created_at
            FROM characters WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(row.as_ref().map(Self::record_from_row))
    }

    async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM characters")
            .fetch_one(&*self.pool)
            .await?;

        Ok(row.get::<i64, _>("count") as u64)
    }

    async fn id_range(&self) -> Result<Option<(i64, i64)>> {
        let row = sqlx::query("SELECT MIN(id) as min_id, MAX(id) as max_id FROM characters")
            .fetch_one(&*self.pool)
            .await?;

        let min: Option<i64> = row.get("min_id");
        let max: Option<i64> = row.get("max_id");
        Ok(min.zip(max))
    }

    async fn known_homeworld_count(&self) -> Result<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM characters WHERE homeworld_name != ? AND homeworld_name != ''",
        )
        .bind(UNKNOWN)
        .fetch_one(&*self.pool)
        .await?;

        Ok(row.get::<i64, _>("count") as u64)
    }
}
