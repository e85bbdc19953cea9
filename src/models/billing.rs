//! Billing records: credit ledger transactions and payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One credit ledger entry from the `credits` collection. `amount` is
/// signed; `balance_after` is the ledger balance once it was applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub balance_after: i64,
    pub kind: TransactionKind,
    #[serde(default)]
    pub description: String,
    pub created_at: bson::DateTime,
}

/// Direction of a credit ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

/// Transaction DTO with RFC 3339 timestamp.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub user_id: String,
    pub amount: i64,
    pub balance_after: i64,
    pub kind: TransactionKind,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<CreditTransaction> for TransactionResponse {
    fn from(t: CreditTransaction) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            amount: t.amount,
            balance_after: t.balance_after,
            kind: t.kind,
            description: t.description,
            created_at: t.created_at.to_chrono(),
        }
    }
}

/// One payment record from the `payments` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    pub amount_usd: f64,
    #[serde(default)]
    pub status: String,
    pub created_at: bson::DateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Credit).unwrap(),
            "\"credit\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionKind::Debit).unwrap(),
            "\"debit\""
        );
    }

    #[test]
    fn transaction_response_converts_timestamp() {
        let now = bson::DateTime::now();
        let tx = CreditTransaction {
            id: "tx-1".to_string(),
            user_id: "uid-1".to_string(),
            amount: -50,
            balance_after: 950,
            kind: TransactionKind::Debit,
            description: "session".to_string(),
            created_at: now,
        };
        let dto = TransactionResponse::from(tx);
        assert_eq!(dto.created_at, now.to_chrono());
        assert_eq!(dto.amount, -50);
    }
}
