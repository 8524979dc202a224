//! CashRail Cashdesk
//!
//! Caller-facing service composing the authorization gate and the ledger.
//! Every operation authorizes the request-scoped actor identity first, then
//! dispatches to the ledger engines. There is no process-wide session state:
//! the verified identity travels with each call in an [`ActorContext`].

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use access_control::{Gate, Role, READ_ROLES, STAFF_READ_ROLES, WRITE_ROLES};
use ledger_core::types::customer_key;
use ledger_core::{
    CheckoutOutcome, CheckoutRow, EntryKind, Ledger, LedgerEntry, Receipt, RecordRequest,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

/// Result type for cashdesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Cashdesk errors: ledger failures, authorization denials, and the buyer
/// name-scope rule
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger engine failure or caller-facing ledger outcome
    #[error(transparent)]
    Ledger(#[from] ledger_core::Error),

    /// Authorization denial or users-store failure
    #[error(transparent)]
    Denied(#[from] access_control::Error),

    /// A buyer asked for a customer name other than their own
    #[error("Authorization denied: {actor:?} may only query their own balance, not {customer:?}")]
    ScopeDenied {
        /// Verified actor email
        actor: String,
        /// Customer name they asked for
        customer: String,
    },
}

/// Request-scoped verified identity of the caller.
///
/// Produced upstream by identity verification (out of scope here); the
/// cashdesk trusts the email it carries.
#[derive(Debug, Clone)]
pub struct ActorContext {
    email: String,
}

impl ActorContext {
    /// Wrap a verified email
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// The verified email
    pub fn email(&self) -> &str {
        &self.email
    }
}

/// The cashdesk service: authorization in front of the ledger engines
pub struct CashdeskService {
    gate: Gate,
    ledger: Ledger,
}

impl CashdeskService {
    /// Compose a service from a gate and an opened ledger
    pub fn new(gate: Gate, ledger: Ledger) -> Self {
        Self { gate, ledger }
    }

    /// Record a top-up for `customer`
    pub async fn record_topup(
        &self,
        ctx: &ActorContext,
        customer: &str,
        amount: Decimal,
        note: &str,
        idempotency_key: &str,
    ) -> Result<Receipt> {
        self.record(ctx, customer, EntryKind::TopUp, amount, note, idempotency_key)
            .await
    }

    /// Record a spend for `customer`
    pub async fn record_spend(
        &self,
        ctx: &ActorContext,
        customer: &str,
        amount: Decimal,
        note: &str,
        idempotency_key: &str,
    ) -> Result<Receipt> {
        self.record(ctx, customer, EntryKind::Spend, amount, note, idempotency_key)
            .await
    }

    async fn record(
        &self,
        ctx: &ActorContext,
        customer: &str,
        kind: EntryKind,
        amount: Decimal,
        note: &str,
        idempotency_key: &str,
    ) -> Result<Receipt> {
        let user = self.gate.authorize(ctx.email(), WRITE_ROLES)?;

        let receipt = self
            .ledger
            .record(RecordRequest {
                customer: customer.to_string(),
                kind,
                amount,
                note: note.to_string(),
                idempotency_key: idempotency_key.to_string(),
                actor_email: user.email,
            })
            .await?;
        Ok(receipt)
    }

    /// Run a batch checkout
    pub async fn checkout(
        &self,
        ctx: &ActorContext,
        rows: &[CheckoutRow],
        batch_key: &str,
    ) -> Result<CheckoutOutcome> {
        let user = self.gate.authorize(ctx.email(), WRITE_ROLES)?;
        let outcome = self.ledger.checkout(rows, batch_key, &user.email).await?;
        Ok(outcome)
    }

    /// Balance of one customer.
    ///
    /// Buyers may only ask about themselves: the requested name must equal
    /// their user-record name, compared case-insensitively.
    pub fn balance(&self, ctx: &ActorContext, customer: &str) -> Result<Decimal> {
        let user = self.gate.authorize(ctx.email(), READ_ROLES)?;
        self.check_buyer_scope(&user, customer)?;
        Ok(self.ledger.balance_of(customer)?)
    }

    /// Balances for many customers over one snapshot.
    ///
    /// For buyers, every requested name must be their own.
    pub fn batch_balances(
        &self,
        ctx: &ActorContext,
        customers: &[String],
    ) -> Result<HashMap<String, Decimal>> {
        let user = self.gate.authorize(ctx.email(), READ_ROLES)?;
        for customer in customers {
            self.check_buyer_scope(&user, customer)?;
        }
        Ok(self.ledger.batch_balances(customers)?)
    }

    /// Most recent ledger entries, newest first. Staff only: buyers are
    /// scoped to their own balance and see nobody else's rows.
    pub fn list_recent(&self, ctx: &ActorContext, limit: usize) -> Result<Vec<LedgerEntry>> {
        self.gate.authorize(ctx.email(), STAFF_READ_ROLES)?;
        Ok(self.ledger.list_recent(limit)?)
    }

    /// Distinct customer names seen in the ledger. Staff only.
    pub fn customers(&self, ctx: &ActorContext) -> Result<Vec<String>> {
        self.gate.authorize(ctx.email(), STAFF_READ_ROLES)?;
        Ok(self.ledger.customers()?)
    }

    fn check_buyer_scope(
        &self,
        user: &access_control::UserRecord,
        customer: &str,
    ) -> Result<()> {
        if user.role == Role::Buyer && customer_key(customer) != customer_key(&user.name) {
            tracing::info!(
                actor = %user.email,
                customer = %customer,
                "Denied: buyer asked about another customer"
            );
            return Err(Error::ScopeDenied {
                actor: user.email.clone(),
                customer: customer.to_string(),
            });
        }
        Ok(())
    }

    /// Shut down the underlying ledger
    pub async fn shutdown(self) -> Result<()> {
        self.ledger.shutdown().await?;
        Ok(())
    }
}
