//! Filtered audit search

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::audit::models::{AuditEntry, AuditFilter};
use crate::audit::queries::search_audit_entries;
use crate::error::ServerResult;
use crate::features::shared::pagination::{Paged, PageRequest};

/// Search request: optional predicates plus skip/take pagination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchAuditLogsRequest {
    #[serde(flatten)]
    pub filter: AuditFilter,
    #[serde(flatten)]
    pub page: PageRequest,
}

#[tracing::instrument(skip(pool, request))]
pub async fn handle(
    pool: PgPool,
    request: SearchAuditLogsRequest,
) -> ServerResult<Paged<AuditEntry>> {
    let skip = request.page.skip();
    let take = request.page.take();

    let (entries, total) = search_audit_entries(&pool, &request.filter, skip, take).await?;

    Ok(Paged::from_items(entries, &request.page, total))
}
