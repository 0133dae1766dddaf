//! Team repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use sigil_core::{new_v7, CreateTeamRequest, Error, Result, Team, TeamRepository};

/// PostgreSQL implementation of TeamRepository.
pub struct PgTeamRepository {
    pool: PgPool,
}

impl PgTeamRepository {
    /// Create a new PgTeamRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PgTeamRepository {
    async fn create(&self, req: CreateTeamRequest) -> Result<Team> {
        let id = new_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("INSERT INTO team (id, name, created_at_utc) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&req.name)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("INSERT INTO team_member (team_id, user_id) VALUES ($1, $2)")
            .bind(id)
            .bind(req.owner_user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        Ok(Team {
            id,
            name: req.name,
            created_at_utc: now,
        })
    }

    async fn add_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO team_member (team_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM team_member WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "User {} is not a member of team {}",
                user_id, team_id
            )));
        }
        Ok(())
    }

    async fn is_member(&self, team_id: Uuid, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM team_member WHERE team_id = $1 AND user_id = $2) AS is_member",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.get("is_member"))
    }
}
