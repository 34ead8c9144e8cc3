use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Profile;
use crate::persistence::{Persistence, ProfilePersistence};

#[derive(Debug)]
pub struct ProfileRelationalPersistence {
    pub db: Arc<PgPool>,
}

#[async_trait]
impl Persistence<Profile> for ProfileRelationalPersistence {
    #[tracing::instrument(name = "relational::profile::upsert", skip_all)]
    async fn upsert(&self, profile: &Profile) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO profiles
               (id, email, first_name, last_name, job_title, phone, authorized, role, last_login, created_at)
            VALUES
               ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
               email = $2,
               first_name = $3,
               last_name = $4,
               job_title = $5,
               phone = $6,
               authorized = $7,
               role = $8,
               last_login = $9
            "#,
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.job_title)
        .bind(&profile.phone)
        .bind(profile.authorized)
        .bind(profile.role.as_str())
        .bind(profile.last_login)
        .bind(profile.created_at)
        .execute(&*self.db)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "relational::profile::delete", skip_all)]
    async fn delete(&self, id: &Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&*self.db)
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "relational::profile::get_by_id", skip_all)]
    async fn get_by_id(&self, id: &Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&*self.db)
            .await?;

        Ok(profile)
    }

    #[tracing::instrument(name = "relational::profile::list", skip_all)]
    async fn list(&self) -> anyhow::Result<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>("SELECT * FROM profiles ORDER BY created_at")
            .fetch_all(&*self.db)
            .await?;

        Ok(profiles)
    }
}

#[async_trait]
impl ProfilePersistence for ProfileRelationalPersistence {
    #[tracing::instrument(name = "relational::profile::get_by_ids", skip_all)]
    async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Profile>> {
        let profiles = sqlx::query_as::<_, Profile>(
            "SELECT * FROM profiles WHERE id = ANY($1) ORDER BY created_at",
        )
        .bind(ids)
        .fetch_all(&*self.db)
        .await?;

        Ok(profiles)
    }

    #[tracing::instrument(name = "relational::profile::touch_last_login", skip_all)]
    async fn touch_last_login(&self, user_id: &Uuid, at: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE profiles SET last_login = $2 WHERE id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&*self.db)
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "relational::profile::delete_user_and_profile", skip_all)]
    async fn delete_user_and_profile(&self, user_id: &Uuid) -> anyhow::Result<u64> {
        sqlx::query("SELECT delete_user_and_profile($1)")
            .bind(user_id)
            .execute(&*self.db)
            .await?;

        Ok(1)
    }
}
