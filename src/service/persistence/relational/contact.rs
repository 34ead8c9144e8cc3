use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::models::ContactRequest;
use crate::persistence::ContactPersistence;

#[derive(Debug)]
pub struct ContactRelationalPersistence {
    pub db: Arc<PgPool>,
}

#[async_trait]
impl ContactPersistence for ContactRelationalPersistence {
    #[tracing::instrument(name = "relational::contact::create", skip_all)]
    async fn create(&self, contact: &ContactRequest) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO contact_requests
               (id, name, email, company, message, created_at)
            VALUES
               ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(contact.id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.company)
        .bind(&contact.message)
        .bind(contact.created_at)
        .execute(&*self.db)
        .await?;

        Ok(result.rows_affected())
    }
}
