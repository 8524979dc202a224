//! Cashdesk demo binary
//!
//! Opens a ledger, seeds a users store, and walks one day at the till:
//! top-ups, a spend, a batch checkout, then the evening reconciliation read.

use access_control::{Gate, MemoryUsers, Role, UserRecord};
use cashdesk::{ActorContext, CashdeskService};
use ledger_core::{CheckoutRow, Config, Ledger};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting CashRail cashdesk");

    let config = Config::from_env()?;
    let ledger = Ledger::open(config).await?;

    let users = MemoryUsers::seeded(vec![
        UserRecord {
            name: "Dana".to_string(),
            email: "dana@cashrail.example".to_string(),
            role: Role::Cashier,
            active: true,
        },
        UserRecord {
            name: "Victor".to_string(),
            email: "victor@cashrail.example".to_string(),
            role: Role::Viewer,
            active: true,
        },
        UserRecord {
            name: "Alice".to_string(),
            email: "alice@customer.example".to_string(),
            role: Role::Buyer,
            active: true,
        },
    ]);
    let service = CashdeskService::new(Gate::new(Arc::new(users)), ledger);

    let till = ActorContext::new("dana@cashrail.example");
    let run = Uuid::new_v4();

    // Morning top-ups
    service
        .record_topup(
            &till,
            "Alice",
            Decimal::new(4000, 2),
            "weekly top-up",
            &format!("demo-{run}-t1"),
        )
        .await?;
    service
        .record_topup(
            &till,
            "Bob",
            Decimal::new(5000, 2),
            "weekly top-up",
            &format!("demo-{run}-t2"),
        )
        .await?;

    // A spend at the till
    service
        .record_spend(
            &till,
            "alice",
            Decimal::new(1000, 2),
            "coffee",
            &format!("demo-{run}-s1"),
        )
        .await?;

    // Evening batch checkout from the tally sheet
    let outcome = service
        .checkout(
            &till,
            &[
                CheckoutRow {
                    customer: "alice".to_string(),
                    amount: Decimal::new(3000, 2),
                    note: "tab".to_string(),
                },
                CheckoutRow {
                    customer: "bob".to_string(),
                    amount: Decimal::new(20000, 2),
                    note: "tab".to_string(),
                },
            ],
            &format!("demo-{run}-batch"),
        )
        .await?;

    tracing::info!(
        committed = outcome.transaction_count(),
        skipped = outcome.skipped_count(),
        "Batch checkout done"
    );
    for skipped in &outcome.skipped {
        tracing::info!(
            index = skipped.index,
            customer = %skipped.customer,
            reason = %skipped.reason,
            "Row skipped"
        );
    }

    // Reconciliation read
    for name in service.customers(&till)? {
        let balance = service.balance(&till, &name)?;
        tracing::info!(customer = %name, balance = %balance, "End-of-day balance");
    }
    for entry in service.list_recent(&till, 10)? {
        tracing::info!(
            transaction_id = %entry.transaction_id,
            customer = %entry.customer,
            kind = %entry.kind,
            amount = %entry.amount,
            "Recent entry"
        );
    }

    service.shutdown().await?;
    tracing::info!("Cashdesk shut down");
    Ok(())
}
