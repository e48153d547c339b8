use crate::domain::{
    models::{blackout::Blackout, branch::Branch, professional::Professional, service::Service},
    ports::CatalogRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteCatalogRepo {
    pool: SqlitePool,
}

impl SqliteCatalogRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepo {
    async fn list_services(&self, tenant_id: &str) -> Result<Vec<Service>, AppError> {
        sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE tenant_id = ? AND active = 1 ORDER BY category, name"
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_service(&self, tenant_id: &str, service_id: &str) -> Result<Option<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_branches_for_service(&self, tenant_id: &str, service_id: &str) -> Result<Vec<Branch>, AppError> {
        sqlx::query_as::<_, Branch>(
            "SELECT b.* FROM branches b
             JOIN service_branches sb ON sb.branch_id = b.id
             WHERE b.tenant_id = ? AND sb.service_id = ? AND b.active = 1
             ORDER BY b.is_default DESC, b.name"
        )
            .bind(tenant_id)
            .bind(service_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_branch(&self, tenant_id: &str, branch_id: &str) -> Result<Option<Branch>, AppError> {
        sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(branch_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_professionals(&self, tenant_id: &str, service_id: &str, branch_id: &str) -> Result<Vec<Professional>, AppError> {
        sqlx::query_as::<_, Professional>(
            "SELECT p.* FROM professionals p
             JOIN professional_offerings o ON o.professional_id = p.id
             WHERE p.tenant_id = ? AND o.service_id = ? AND o.branch_id = ? AND p.active = 1
             ORDER BY p.id"
        )
            .bind(tenant_id)
            .bind(service_id)
            .bind(branch_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_blackouts(&self, tenant_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Blackout>, AppError> {
        sqlx::query_as::<_, Blackout>(
            "SELECT * FROM blackouts WHERE tenant_id = ? AND starts_at < ? AND ends_at > ? ORDER BY starts_at"
        )
            .bind(tenant_id)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
