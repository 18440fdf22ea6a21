//! Recent audit entries listing

use sqlx::PgPool;

use crate::audit::models::AuditEntry;
use crate::audit::queries::{recent_audit_entries, total_count};
use crate::error::ServerResult;
use crate::features::shared::pagination::{Paged, PageRequest};

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, page: PageRequest) -> ServerResult<Paged<AuditEntry>> {
    let entries = recent_audit_entries(&pool, page.skip(), page.take()).await?;
    let total = total_count(&pool).await?;

    Ok(Paged::from_items(entries, &page, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::models::NewAuditEntry;
    use crate::audit::queries::create_audit_entry;
    use chrono::{Duration, Utc};

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_recent_is_newest_first(pool: PgPool) -> ServerResult<()> {
        for i in 0..3 {
            create_audit_entry(
                &pool,
                NewAuditEntry {
                    user_id: None,
                    user_name: None,
                    execution_time: Utc::now() - Duration::minutes(10 - i),
                    duration_ms: 1,
                    http_method: "GET".to_string(),
                    url: format!("/api/v1/item/{}", i),
                    http_status_code: Some(200),
                    client_ip: None,
                    browser_info: None,
                    correlation_id: None,
                    exception: None,
                    actions: vec![],
                },
            )
            .await?;
        }

        let page = handle(pool, PageRequest::new(None, Some(2))).await?;

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page.total_count, 3);
        assert!(page.page.has_more);
        assert!(page.items[0].execution_time >= page.items[1].execution_time);

        Ok(())
    }
}
