//! Document store access layer.
//!
//! Wraps a `mongodb::Database` handle (internally pooled, cheap to clone)
//! and hands out typed collections. Also hosts the indexed-or-scan query
//! helper used by routes whose primary query needs a composite index.

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;

use crate::errors::AppError;
use crate::models::audit::AuditLog;
use crate::models::billing::{CreditTransaction, Payment};
use crate::models::dashboard::Dashboard;
use crate::models::event::AnalyticsEvent;
use crate::models::job::ProcessingJob;
use crate::models::mindmap::Mindmap;
use crate::models::security::{DeletionRequest, Incident};
use crate::models::user::{FeatureFlagOverride, User};
use crate::models::workspace::{ApiKey, WebhookEndpoint, Workspace};

/// Shared handle to the document store.
#[derive(Debug, Clone)]
pub struct Store {
    db: Database,
}

impl Store {
    /// Connect to the store. The driver pools connections internally, so
    /// one `Store` is shared across all requests.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, AppError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self {
            db: client.database(db_name),
        })
    }

    /// Round-trip to the server, used by the readiness probe.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn workspaces(&self) -> Collection<Workspace> {
        self.db.collection("workspaces")
    }

    pub fn events(&self) -> Collection<AnalyticsEvent> {
        self.db.collection("analyticsEvents")
    }

    pub fn jobs(&self) -> Collection<ProcessingJob> {
        self.db.collection("processingJobs")
    }

    pub fn audit_logs(&self) -> Collection<AuditLog> {
        self.db.collection("auditLogs")
    }

    pub fn incidents(&self) -> Collection<Incident> {
        self.db.collection("incidents")
    }

    pub fn deletion_requests(&self) -> Collection<DeletionRequest> {
        self.db.collection("deletionRequests")
    }

    pub fn api_keys(&self) -> Collection<ApiKey> {
        self.db.collection("apiKeys")
    }

    pub fn webhook_endpoints(&self) -> Collection<WebhookEndpoint> {
        self.db.collection("webhookEndpoints")
    }

    pub fn feature_flags(&self) -> Collection<FeatureFlagOverride> {
        self.db.collection("featureFlagOverrides")
    }

    pub fn credits(&self) -> Collection<CreditTransaction> {
        self.db.collection("credits")
    }

    pub fn payments(&self) -> Collection<Payment> {
        self.db.collection("payments")
    }

    pub fn mindmaps(&self) -> Collection<Mindmap> {
        self.db.collection("mindmaps")
    }

    pub fn dashboards(&self) -> Collection<Dashboard> {
        self.db.collection("dashboards")
    }
}

/// How a fallback-capable query was actually answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryPlan {
    /// Server-side filter and sort succeeded.
    Indexed,
    /// The indexed query failed (typically a missing composite index);
    /// the full collection was fetched and filtered/sorted in memory.
    CollectionScan,
}

/// Run a server-side filtered and sorted query; if the driver rejects it,
/// fetch the whole collection and apply `retain`/`order` in memory.
///
/// The in-memory predicate must express the same filter as `filter`, so a
/// degraded response stays range-correct.
pub async fn find_indexed_or_scan<T, F, C>(
    collection: &Collection<T>,
    filter: Document,
    sort: Document,
    retain: F,
    order: C,
) -> Result<(Vec<T>, QueryPlan), AppError>
where
    T: DeserializeOwned + Serialize + Send + Sync + Unpin,
    F: Fn(&T) -> bool,
    C: Fn(&T, &T) -> Ordering,
{
    let indexed: Result<Vec<T>, mongodb::error::Error> =
        match collection.find(filter).sort(sort).await {
            Ok(cursor) => cursor.try_collect().await,
            Err(e) => Err(e),
        };

    match indexed {
        Ok(docs) => Ok((docs, QueryPlan::Indexed)),
        Err(e) => {
            tracing::warn!(
                collection = collection.name(),
                error = %e,
                "Indexed query failed, degrading to collection scan"
            );
            let mut docs: Vec<T> = collection
                .find(Document::new())
                .await?
                .try_collect()
                .await?;
            docs.retain(|d| retain(d));
            docs.sort_by(|a, b| order(a, b));
            Ok((docs, QueryPlan::CollectionScan))
        }
    }
}
