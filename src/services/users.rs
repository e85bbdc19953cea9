//! Admin user management: listing, field patches, feature flag overrides.

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use serde::Deserialize;
use validator::Validate;

use crate::errors::AppError;
use crate::middleware::auth::CurrentUser;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::user::{
    FeatureFlagOverride, FeatureFlagOverrideResponse, FeatureFlagsRequest, UpdateUserRequest,
    User, UserResponse, UserRole,
};
use crate::services::audit;
use crate::store::Store;

/// Query filters accepted by `GET /api/admin/users`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilters {
    pub role: Option<String>,
    pub plan: Option<String>,
    /// Case-insensitive substring match on email or display name,
    /// applied in memory after the fetch.
    pub search: Option<String>,
}

/// List users, newest first, with the manual slice pagination every list
/// route uses.
pub async fn list(
    store: &Store,
    filters: &UserFilters,
    pagination: &Pagination,
) -> Result<PagedResult<UserResponse>, AppError> {
    let mut filter = Document::new();
    if let Some(role) = &filters.role {
        filter.insert("role", role.as_str());
    }
    if let Some(plan) = &filters.plan {
        filter.insert("plan", plan.as_str());
    }

    let mut users: Vec<User> = store
        .users()
        .find(filter)
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;

    if let Some(search) = &filters.search {
        let needle = search.to_lowercase();
        users.retain(|u| {
            u.email.to_lowercase().contains(&needle)
                || u.display_name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&needle))
        });
    }

    let responses: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(PagedResult::paginate(responses, pagination))
}

/// Patch user fields. Role escalation is gated on the superAdmin role.
pub async fn update(
    store: &Store,
    user_id: &str,
    patch: &UpdateUserRequest,
    actor: &CurrentUser,
) -> Result<UserResponse, AppError> {
    patch
        .validate()
        .map_err(AppError::validation_details)?;
    if patch.is_empty() {
        return Err(AppError::validation("No fields to update"));
    }
    if patch.role.is_some() && actor.role != UserRole::SuperAdmin {
        return Err(AppError::Forbidden(
            "Role changes require super admin access".to_string(),
        ));
    }

    let mut set = Document::new();
    if let Some(email) = &patch.email {
        set.insert("email", email.as_str());
    }
    if let Some(display_name) = &patch.display_name {
        set.insert("displayName", display_name.as_str());
    }
    if let Some(plan) = &patch.plan {
        set.insert("plan", plan.as_str());
    }
    if let Some(role) = patch.role {
        set.insert("role", role.as_str());
    }
    if let Some(disabled) = patch.disabled {
        set.insert("disabled", disabled);
    }

    let updated = store
        .users()
        .find_one_and_update(doc! { "_id": user_id }, doc! { "$set": set.clone() })
        .return_document(ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    audit::record(
        store,
        None,
        &actor.uid,
        "user.update",
        "user",
        Some(user_id),
        Some(doc! { "fields": set.keys().cloned().collect::<Vec<_>>() }),
    )
    .await?;

    Ok(UserResponse::from(updated))
}

/// Replace a user's feature flag overrides.
pub async fn set_feature_flags(
    store: &Store,
    user_id: &str,
    request: &FeatureFlagsRequest,
    actor: &CurrentUser,
) -> Result<FeatureFlagOverrideResponse, AppError> {
    request
        .validate()
        .map_err(AppError::validation_details)?;

    // The target must exist; overrides for unknown users would leak.
    store
        .users()
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    let override_doc = FeatureFlagOverride {
        user_id: user_id.to_string(),
        flags: request.flags.clone(),
        updated_by: actor.uid.clone(),
        updated_at: bson::DateTime::now(),
    };

    store
        .feature_flags()
        .replace_one(doc! { "_id": user_id }, &override_doc)
        .upsert(true)
        .await?;

    audit::record(
        store,
        None,
        &actor.uid,
        "user.feature_flags",
        "featureFlagOverride",
        Some(user_id),
        Some(doc! { "flagCount": request.flags.len() as i64 }),
    )
    .await?;

    Ok(FeatureFlagOverrideResponse::from(override_doc))
}
