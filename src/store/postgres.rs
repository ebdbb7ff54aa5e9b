use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    game::CARD_SIZE,
    models::{Game, Player, PlayerId},
    store::{GameStore, StoreError, StoreResult},
};

#[derive(Debug, Clone, FromRow)]
struct GameRow {
    game_id: String,
    host_name: String,
    called_words: Json<Vec<String>>,
    is_active: bool,
    winner: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct PlayerRow {
    player_id: Uuid,
    player_name: String,
    card: Json<Vec<String>>,
    marked: Json<Vec<bool>>,
    joined_at: DateTime<Utc>,
}

/// PostgreSQL-backed game store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;
        tracing::info!("Database migrations completed");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl GameStore for PgStore {
    async fn load(&self, game_id: &str) -> StoreResult<Option<Game>> {
        let Some(row) = sqlx::query_as::<_, GameRow>(
            r#"
            SELECT game_id, host_name, called_words, is_active, winner, created_at
            FROM games
            WHERE game_id = $1
            "#,
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let players = sqlx::query_as::<_, PlayerRow>(
            r#"
            SELECT player_id, player_name, card, marked, joined_at
            FROM players
            WHERE game_id = $1
            ORDER BY joined_at
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        into_game(row, players).map(Some)
    }

    async fn save(&self, game: &Game) -> StoreResult<()> {
        let players: Vec<&Player> = game.players.values().collect();
        self.write(game, &players).await
    }

    async fn save_players(&self, game: &Game, players: &[PlayerId]) -> StoreResult<()> {
        let players: Vec<&Player> = players
            .iter()
            .filter_map(|id| game.players.get(id))
            .collect();
        self.write(game, &players).await
    }
}

impl PgStore {
    /// Upsert the game row and the given players in one transaction
    async fn write(&self, game: &Game, players: &[&Player]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO games (game_id, host_name, called_words, is_active, winner, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (game_id)
            DO UPDATE SET
                called_words = $3,
                is_active = $4,
                winner = $5
            "#,
        )
        .bind(&game.game_id)
        .bind(&game.host_name)
        .bind(Json(&game.called_words))
        .bind(game.is_active)
        .bind(game.winner.as_deref())
        .bind(game.created_at)
        .execute(&mut *tx)
        .await?;

        for player in players {
            sqlx::query(
                r#"
                INSERT INTO players (player_id, game_id, player_name, card, marked, joined_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (player_id)
                DO UPDATE SET marked = $5
                "#,
            )
            .bind(player.player_id)
            .bind(&game.game_id)
            .bind(&player.name)
            .bind(Json(&player.card))
            .bind(Json(&player.marked))
            .bind(player.joined_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn into_game(row: GameRow, players: Vec<PlayerRow>) -> StoreResult<Game> {
    let corrupt = |reason: String| StoreError::Corrupt {
        game_id: row.game_id.clone(),
        reason,
    };

    let mut by_id = HashMap::with_capacity(players.len());
    for p in players {
        if p.card.len() != CARD_SIZE || p.marked.len() != CARD_SIZE {
            return Err(corrupt(format!(
                "player {} has {} words and {} marks",
                p.player_id,
                p.card.len(),
                p.marked.len()
            )));
        }
        by_id.insert(
            p.player_id,
            Player {
                player_id: p.player_id,
                name: p.player_name,
                card: p.card.0,
                marked: p.marked.0,
                joined_at: p.joined_at,
            },
        );
    }

    Ok(Game {
        game_id: row.game_id,
        host_name: row.host_name,
        called_words: row.called_words.0,
        is_active: row.is_active,
        winner: row.winner,
        created_at: row.created_at,
        players: by_id,
    })
}
