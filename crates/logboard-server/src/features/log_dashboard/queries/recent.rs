//! Recent application logs listing

use sqlx::PgPool;

use crate::db::app_logs::{recent_logs, total_count};
use crate::error::ServerResult;
use crate::features::shared::pagination::{Paged, PageRequest};
use crate::models::ApplicationLog;

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, page: PageRequest) -> ServerResult<Paged<ApplicationLog>> {
    let rows = recent_logs(&pool, page.skip(), page.take()).await?;
    let total = total_count(&pool).await?;

    Ok(Paged::from_items(rows, &page, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::app_logs::insert_logs_bulk;
    use crate::models::{LogLevel, NewApplicationLog};

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_recent_pagination(pool: PgPool) -> ServerResult<()> {
        let rows: Vec<NewApplicationLog> = (0..12)
            .map(|i| NewApplicationLog::event(LogLevel::Information, format!("event {}", i)))
            .collect();
        insert_logs_bulk(&pool, &rows).await?;

        let page = handle(pool.clone(), PageRequest::new(Some(0), Some(10))).await?;
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.page.total_count, 12);
        assert!(page.page.has_more);

        let page = handle(pool, PageRequest::new(Some(10), Some(10))).await?;
        assert_eq!(page.items.len(), 2);
        assert!(!page.page.has_more);

        Ok(())
    }
}
