//! Saved dashboard definitions, scoped to the calling user.

use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::ReturnDocument;
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::models::dashboard::{Dashboard, DashboardResponse, SaveDashboardRequest};
use crate::store::Store;

/// List the caller's dashboards, most recently updated first.
pub async fn list(store: &Store, owner_uid: &str) -> Result<Vec<DashboardResponse>, AppError> {
    let dashboards: Vec<Dashboard> = store
        .dashboards()
        .find(doc! { "ownerUid": owner_uid })
        .sort(doc! { "updatedAt": -1 })
        .await?
        .try_collect()
        .await?;
    Ok(dashboards.into_iter().map(DashboardResponse::from).collect())
}

/// Create a dashboard, or update one the caller owns when `id` is set.
pub async fn save(
    store: &Store,
    owner_uid: &str,
    request: SaveDashboardRequest,
) -> Result<DashboardResponse, AppError> {
    request.validate().map_err(AppError::validation_details)?;

    let widgets: Vec<bson::Document> = request
        .widgets
        .iter()
        .map(|w| {
            bson::to_document(w)
                .map_err(|_| AppError::validation("widgets must be JSON objects"))
        })
        .collect::<Result<_, _>>()?;

    let now = bson::DateTime::now();
    match request.id {
        Some(id) => {
            let updated = store
                .dashboards()
                .find_one_and_update(
                    doc! { "_id": id.as_str(), "ownerUid": owner_uid },
                    doc! { "$set": {
                        "name": request.name.as_str(),
                        "widgets": widgets,
                        "updatedAt": now,
                    } },
                )
                .return_document(ReturnDocument::After)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Dashboard {id} not found")))?;
            Ok(DashboardResponse::from(updated))
        }
        None => {
            let dashboard = Dashboard {
                id: Uuid::new_v4().to_string(),
                owner_uid: owner_uid.to_string(),
                name: request.name,
                widgets,
                created_at: now,
                updated_at: now,
            };
            store.dashboards().insert_one(&dashboard).await?;
            Ok(DashboardResponse::from(dashboard))
        }
    }
}
