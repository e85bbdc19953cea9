//! Seed script for development — populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `MONGODB_URI` and `SESSION_SECRET` environment variables
//! (reads .env). Clears the seeded collections first, so point it at a
//! development database only.

use bson::doc;
use chrono::{Duration, Utc};
use uuid::Uuid;

use callmap_admin::config::AppConfig;
use callmap_admin::models::billing::{CreditTransaction, Payment, TransactionKind};
use callmap_admin::models::event::{kinds, AnalyticsEvent};
use callmap_admin::models::job::ProcessingJob;
use callmap_admin::models::mindmap::Mindmap;
use callmap_admin::models::security::{
    DeletionRequest, DeletionStatus, Incident, IncidentStatus,
};
use callmap_admin::models::user::{User, UserRole};
use callmap_admin::models::workspace::{Workspace, WorkspaceMember};
use callmap_admin::services::session::{self, SessionClaims};
use callmap_admin::store::Store;

const ADMIN_UID: &str = "seed-admin";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().expect("MONGODB_URI and SESSION_SECRET must be set");
    let store = Store::connect(&config.mongodb_uri, &config.mongodb_db)
        .await
        .map_err(|e| anyhow::anyhow!("store connect failed: {e}"))?;

    println!("=== CallMap Admin Seed Script ===");

    seed_users(&store).await?;
    seed_workspaces(&store).await?;
    seed_events(&store).await?;
    seed_jobs(&store).await?;
    seed_billing(&store).await?;
    seed_security(&store).await?;
    seed_mindmaps(&store).await?;

    let now = Utc::now();
    let cookie = session::mint_session(
        &SessionClaims {
            sub: ADMIN_UID.to_string(),
            email: "admin@callmap.dev".to_string(),
            role: "superAdmin".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(7)).timestamp(),
        },
        &config.session_secret,
    )
    .map_err(|e| anyhow::anyhow!("session mint failed: {e}"))?;

    println!("\n=== Seed complete! ===");
    println!("Dev session cookie (7 days): callmap_session={cookie}");

    Ok(())
}

fn days_ago(days: i64) -> bson::DateTime {
    bson::DateTime::from_chrono(Utc::now() - Duration::days(days))
}

async fn seed_users(store: &Store) -> anyhow::Result<()> {
    store.users().delete_many(doc! {}).await?;

    let users = vec![
        User {
            id: ADMIN_UID.to_string(),
            email: "admin@callmap.dev".to_string(),
            display_name: Some("Seed Admin".to_string()),
            role: UserRole::SuperAdmin,
            plan: "enterprise".to_string(),
            monthly_tokens: 0,
            total_tokens: 0,
            disabled: false,
            created_at: days_ago(400),
            last_active_at: Some(days_ago(0)),
        },
        User {
            id: "seed-alice".to_string(),
            email: "alice@acme.test".to_string(),
            display_name: Some("Alice".to_string()),
            role: UserRole::Member,
            plan: "pro".to_string(),
            monthly_tokens: 4_200,
            total_tokens: 120_000,
            disabled: false,
            created_at: days_ago(200),
            last_active_at: Some(days_ago(1)),
        },
        User {
            id: "seed-bob".to_string(),
            email: "bob@acme.test".to_string(),
            display_name: Some("Bob".to_string()),
            role: UserRole::Member,
            plan: "free".to_string(),
            monthly_tokens: 300,
            total_tokens: 2_100,
            disabled: false,
            created_at: days_ago(90),
            last_active_at: Some(days_ago(21)),
        },
        User {
            id: "seed-carol".to_string(),
            email: "carol@globex.test".to_string(),
            display_name: None,
            role: UserRole::Admin,
            plan: "pro".to_string(),
            monthly_tokens: 9_000,
            total_tokens: 300_000,
            disabled: false,
            created_at: days_ago(350),
            last_active_at: Some(days_ago(3)),
        },
    ];
    let count = users.len();
    store.users().insert_many(users).await?;
    println!("[done] Seeded {count} users");
    Ok(())
}

async fn seed_workspaces(store: &Store) -> anyhow::Result<()> {
    store.workspaces().delete_many(doc! {}).await?;

    let member = |uid: &str, email: &str, role: &str, days: i64| WorkspaceMember {
        uid: uid.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        joined_at: days_ago(days),
    };

    let workspaces = vec![
        Workspace {
            id: "seed-ws-acme".to_string(),
            name: "Acme Corp".to_string(),
            plan: "pro".to_string(),
            owner_uid: "seed-alice".to_string(),
            active: true,
            members: vec![
                member("seed-alice", "alice@acme.test", "owner", 200),
                member("seed-bob", "bob@acme.test", "member", 90),
            ],
            created_at: days_ago(200),
        },
        Workspace {
            id: "seed-ws-globex".to_string(),
            name: "Globex".to_string(),
            plan: "enterprise".to_string(),
            owner_uid: "seed-carol".to_string(),
            active: true,
            members: vec![member("seed-carol", "carol@globex.test", "owner", 350)],
            created_at: days_ago(350),
        },
    ];
    let count = workspaces.len();
    store.workspaces().insert_many(workspaces).await?;
    println!("[done] Seeded {count} workspaces");
    Ok(())
}

async fn seed_events(store: &Store) -> anyhow::Result<()> {
    store.events().delete_many(doc! {}).await?;

    let mut events = Vec::new();
    let mut push = |kind: &str,
                    event_type: Option<&str>,
                    uid: &str,
                    days: i64,
                    metadata: bson::Document| {
        events.push(AnalyticsEvent {
            id: Uuid::new_v4().to_string(),
            kind: kind.to_string(),
            event_type: event_type.map(str::to_string),
            user_id: Some(uid.to_string()),
            workspace_id: Some("seed-ws-acme".to_string()),
            session_id: None,
            timestamp: days_ago(days),
            metadata,
        });
    };

    for day in 0..14 {
        push(
            kinds::CALL_LOG,
            Some(if day % 3 == 0 { "missed" } else { "completed" }),
            "seed-alice",
            day,
            doc! { "durationSeconds": 60 + day * 10 },
        );
        push(kinds::CONTACT, None, "seed-bob", day, doc! { "source": "import" });
    }
    for day in 0..10 {
        push(
            kinds::EXPORT,
            None,
            "seed-alice",
            day,
            doc! { "format": if day % 2 == 0 { "pdf" } else { "csv" }, "success": day % 5 != 0 },
        );
        push(
            kinds::FILE_CONVERSION,
            None,
            "seed-bob",
            day,
            doc! { "success": day < 7 },
        );
        push(
            kinds::MINDMAP_EDIT,
            None,
            "seed-alice",
            day,
            doc! { "mindmapId": format!("seed-map-{}", day % 3) },
        );
    }
    for day in 0..5 {
        push(
            kinds::SECURITY,
            Some(if day % 2 == 0 { "login_failed" } else { "password_reset" }),
            "seed-bob",
            day,
            doc! {},
        );
    }

    let count = events.len();
    store.events().insert_many(events).await?;
    println!("[done] Seeded {count} analytics events");
    Ok(())
}

async fn seed_jobs(store: &Store) -> anyhow::Result<()> {
    store.jobs().delete_many(doc! {}).await?;

    let mut jobs = Vec::new();
    for day in 0..30 {
        for (uid, session, tokens) in [
            ("seed-alice", format!("sess-a-{day}"), 400 + day * 5),
            ("seed-bob", format!("sess-b-{day}"), 80),
        ] {
            jobs.push(ProcessingJob {
                id: Uuid::new_v4().to_string(),
                session_id: session,
                user_id: uid.to_string(),
                workspace_id: Some(if uid == "seed-alice" {
                    "seed-ws-acme".to_string()
                } else {
                    "seed-ws-globex".to_string()
                }),
                tokens_used: tokens,
                cost_usd: tokens as f64 * 0.0001,
                status: "completed".to_string(),
                created_at: days_ago(day),
            });
        }
    }

    let count = jobs.len();
    store.jobs().insert_many(jobs).await?;
    println!("[done] Seeded {count} processing jobs");
    Ok(())
}

async fn seed_billing(store: &Store) -> anyhow::Result<()> {
    store.credits().delete_many(doc! {}).await?;
    store.payments().delete_many(doc! {}).await?;

    let mut balance = 0;
    let mut transactions = Vec::new();
    for (days, amount, kind, description) in [
        (60, 1_000, TransactionKind::Credit, "Plan renewal"),
        (45, -220, TransactionKind::Debit, "Session usage"),
        (30, -310, TransactionKind::Debit, "Session usage"),
        (30, 1_000, TransactionKind::Credit, "Plan renewal"),
        (12, -95, TransactionKind::Debit, "Session usage"),
    ] {
        balance += amount;
        transactions.push(CreditTransaction {
            id: Uuid::new_v4().to_string(),
            user_id: "seed-alice".to_string(),
            amount,
            balance_after: balance,
            kind,
            description: description.to_string(),
            created_at: days_ago(days),
        });
    }
    let tx_count = transactions.len();
    store.credits().insert_many(transactions).await?;

    let mut payments = Vec::new();
    for month in 0..6 {
        payments.push(Payment {
            id: Uuid::new_v4().to_string(),
            user_id: "seed-alice".to_string(),
            workspace_id: Some("seed-ws-acme".to_string()),
            amount_usd: 49.0 + month as f64 * 10.0,
            status: "succeeded".to_string(),
            created_at: days_ago(month * 30),
        });
    }
    let payment_count = payments.len();
    store.payments().insert_many(payments).await?;

    println!("[done] Seeded {tx_count} credit transactions and {payment_count} payments");
    Ok(())
}

async fn seed_security(store: &Store) -> anyhow::Result<()> {
    store.incidents().delete_many(doc! {}).await?;
    store.deletion_requests().delete_many(doc! {}).await?;

    store
        .incidents()
        .insert_many(vec![
            Incident {
                id: Uuid::new_v4().to_string(),
                severity: "high".to_string(),
                status: IncidentStatus::Open,
                summary: "Spike in failed logins".to_string(),
                opened_at: days_ago(2),
                resolved_at: None,
            },
            Incident {
                id: Uuid::new_v4().to_string(),
                severity: "low".to_string(),
                status: IncidentStatus::Resolved,
                summary: "Stale webhook retries".to_string(),
                opened_at: days_ago(20),
                resolved_at: Some(days_ago(18)),
            },
        ])
        .await?;

    store
        .deletion_requests()
        .insert_many(vec![DeletionRequest {
            id: Uuid::new_v4().to_string(),
            user_id: "seed-bob".to_string(),
            status: DeletionStatus::Pending,
            requested_at: days_ago(4),
            processed_at: None,
        }])
        .await?;

    println!("[done] Seeded incidents and deletion requests");
    Ok(())
}

async fn seed_mindmaps(store: &Store) -> anyhow::Result<()> {
    store.mindmaps().delete_many(doc! {}).await?;

    let mut mindmaps = Vec::new();
    for i in 0..3 {
        mindmaps.push(Mindmap {
            id: format!("seed-map-{i}"),
            owner_uid: "seed-alice".to_string(),
            workspace_id: Some("seed-ws-acme".to_string()),
            title: format!("Roadmap {i}"),
            node_count: 12 + i * 7,
            updated_at: days_ago(i),
        });
    }
    let count = mindmaps.len();
    store.mindmaps().insert_many(mindmaps).await?;
    println!("[done] Seeded {count} mindmaps");
    Ok(())
}
