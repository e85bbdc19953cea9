//! Credit ledger queries for the admin wallet view.

use futures::TryStreamExt;
use mongodb::bson::doc;

use crate::errors::AppError;
use crate::models::billing::{CreditTransaction, TransactionResponse};
use crate::models::pagination::{PagedResult, Pagination};
use crate::store::Store;

/// List a user's credit transactions, newest first.
pub async fn transactions(
    store: &Store,
    user_id: &str,
    pagination: &Pagination,
) -> Result<PagedResult<TransactionResponse>, AppError> {
    store
        .users()
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

    let transactions: Vec<CreditTransaction> = store
        .credits()
        .find(doc! { "userId": user_id })
        .sort(doc! { "createdAt": -1 })
        .await?
        .try_collect()
        .await?;

    let responses: Vec<TransactionResponse> =
        transactions.into_iter().map(TransactionResponse::from).collect();
    Ok(PagedResult::paginate(responses, pagination))
}
