//! In-memory stand-ins for the store, identity provider and payment gateway.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use campus_functions::db::ownership::{OwnedTable, Ownership, PARENT_KEY_COLUMN, PROFILES_TABLE};
use campus_functions::db::{PurgeSession, RecordStore};
use campus_functions::identity::{IdentityError, IdentityProvider};
use campus_functions::models::{
    extend_subscription, FeatureFlags, NewIdentity, NewProfile, Settled, SmsTopup,
    SubscriptionPayment, VerifiedTransaction,
};
use campus_functions::payments::{GatewayError, PaymentGateway};
use campus_functions::{AppError, Result};

pub type Row = HashMap<String, String>;
type Tables = HashMap<String, Vec<Row>>;

fn row(columns: &[(&str, &str)]) -> Row {
    columns
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Record store
// =============================================================================

#[derive(Default)]
struct StoreState {
    tables: Tables,
    failing_tables: HashSet<String>,
    fail_profile_upsert: bool,
    attempted_steps: Vec<String>,
    flags: FeatureFlags,
}

/// Relational store held in memory; purges are staged and applied on commit
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: &str, columns: &[(&str, &str)]) {
        let mut state = self.state.lock().unwrap();
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row(columns));
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        let state = self.state.lock().unwrap();
        state.tables.get(table).cloned().unwrap_or_default()
    }

    pub fn count(&self, table: &str) -> usize {
        self.rows(table).len()
    }

    pub fn count_where(&self, table: &str, column: &str, value: &str) -> usize {
        self.rows(table)
            .iter()
            .filter(|r| r.get(column).map(String::as_str) == Some(value))
            .count()
    }

    pub fn total_rows(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.tables.values().map(Vec::len).sum()
    }

    /// Every purge of `table` fails from now on
    pub fn fail_table(&self, table: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_tables
            .insert(table.to_string());
    }

    pub fn set_fail_profile_upsert(&self, fail: bool) {
        self.state.lock().unwrap().fail_profile_upsert = fail;
    }

    pub fn set_flags(&self, flags: FeatureFlags) {
        self.state.lock().unwrap().flags = flags;
    }

    /// Labels of every purge step attempted, in order
    pub fn attempted_steps(&self) -> Vec<String> {
        self.state.lock().unwrap().attempted_steps.clone()
    }

    pub fn seller(&self, user_id: &str) -> Option<Row> {
        self.rows("seller_profiles")
            .into_iter()
            .find(|r| r.get("user_id").map(String::as_str) == Some(user_id))
    }

    pub fn sms_credits(&self, user_id: &str) -> i64 {
        self.seller(user_id)
            .and_then(|r| r.get("sms_credits").and_then(|v| v.parse().ok()))
            .unwrap_or(0)
    }

    pub fn subscription_expiry(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.seller(user_id)
            .and_then(|r| r.get("subscription_expires_at").cloned())
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|d| d.with_timezone(&Utc))
    }
}

fn has_reference(tables: &Tables, table: &str, reference: &str) -> bool {
    tables.get(table).is_some_and(|rows| {
        rows.iter()
            .any(|r| r.get("reference").map(String::as_str) == Some(reference))
    })
}

fn seller_row<'a>(tables: &'a mut Tables, seller_id: &str) -> &'a mut Row {
    let rows = tables.entry("seller_profiles".to_string()).or_default();
    let index = match rows
        .iter()
        .position(|r| r.get("user_id").map(String::as_str) == Some(seller_id))
    {
        Some(index) => index,
        None => {
            rows.push(row(&[("user_id", seller_id), ("sms_credits", "0")]));
            rows.len() - 1
        }
    };
    &mut rows[index]
}

fn delete_matching(tables: &mut Tables, table: &str, column: &str, values: &HashSet<String>) -> u64 {
    let Some(rows) = tables.get_mut(table) else {
        return 0;
    };
    let before = rows.len();
    rows.retain(|r| !r.get(column).is_some_and(|v| values.contains(v)));
    (before - rows.len()) as u64
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn begin_purge(&self) -> Result<Box<dyn PurgeSession>> {
        let staged = self.state.lock().unwrap().tables.clone();
        Ok(Box::new(MemoryPurge {
            store: self.clone(),
            staged,
        }))
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_profile_upsert {
            return Err(AppError::Internal(
                "new row violates row-level security policy for table \"profiles\"".into(),
            ));
        }

        let rows = state.tables.entry(PROFILES_TABLE.to_string()).or_default();
        rows.retain(|r| r.get("id") != Some(&profile.id));
        rows.push(row(&[
            ("id", profile.id.as_str()),
            ("email", profile.email.as_str()),
            ("full_name", profile.full_name.as_str()),
            ("role", profile.role.as_str()),
            ("department", profile.department.as_deref().unwrap_or("")),
            ("is_active", if profile.is_active { "true" } else { "false" }),
        ]));
        Ok(())
    }

    async fn load_feature_flags(&self) -> Result<FeatureFlags> {
        Ok(self.state.lock().unwrap().flags)
    }

    async fn settle_sms_topup(&self, topup: &SmsTopup) -> Result<Settled<i64>> {
        let mut state = self.state.lock().unwrap();

        if has_reference(&state.tables, "sms_topups", &topup.reference) {
            let balance = seller_row(&mut state.tables, &topup.seller_id)
                .get("sms_credits")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            return Ok(Settled {
                replayed: true,
                value: balance,
            });
        }

        state
            .tables
            .entry("sms_topups".to_string())
            .or_default()
            .push(row(&[
                ("reference", topup.reference.as_str()),
                ("seller_id", topup.seller_id.as_str()),
                ("units", topup.units.to_string().as_str()),
                ("amount_kobo", topup.amount_kobo.to_string().as_str()),
            ]));

        let seller = seller_row(&mut state.tables, &topup.seller_id);
        let balance = seller
            .get("sms_credits")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0)
            + topup.units;
        seller.insert("sms_credits".to_string(), balance.to_string());

        Ok(Settled {
            replayed: false,
            value: balance,
        })
    }

    async fn settle_subscription(
        &self,
        payment: &SubscriptionPayment,
    ) -> Result<Settled<Option<DateTime<Utc>>>> {
        let mut state = self.state.lock().unwrap();

        let seller = seller_row(&mut state.tables, &payment.seller_id);
        let current = seller
            .get("subscription_expires_at")
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|d| d.with_timezone(&Utc));

        if has_reference(&state.tables, "subscription_payments", &payment.reference) {
            return Ok(Settled {
                replayed: true,
                value: current,
            });
        }

        let expires_at = extend_subscription(current, Utc::now(), payment.months).ok_or_else(|| {
            AppError::PaymentRejected {
                message: "Invalid subscription length".to_string(),
                details: None,
            }
        })?;
        state
            .tables
            .entry("subscription_payments".to_string())
            .or_default()
            .push(row(&[
                ("reference", payment.reference.as_str()),
                ("seller_id", payment.seller_id.as_str()),
                ("months", payment.months.to_string().as_str()),
            ]));

        let seller = seller_row(&mut state.tables, &payment.seller_id);
        seller.insert("subscription_status".to_string(), "active".to_string());
        seller.insert(
            "subscription_expires_at".to_string(),
            expires_at.to_rfc3339(),
        );

        Ok(Settled {
            replayed: false,
            value: Some(expires_at),
        })
    }
}

struct MemoryPurge {
    store: MemoryStore,
    staged: Tables,
}

#[async_trait]
impl PurgeSession for MemoryPurge {
    async fn purge_step(&mut self, step: &OwnedTable, user_id: &str) -> Result<u64> {
        {
            let mut state = self.store.state.lock().unwrap();
            state.attempted_steps.push(step.label());
            if state.failing_tables.contains(step.table) {
                return Err(AppError::Internal(format!(
                    "relation \"{}\" is unavailable",
                    step.table
                )));
            }
        }

        let owner = HashSet::from([user_id.to_string()]);
        match step.ownership {
            Ownership::Direct { column } => {
                Ok(delete_matching(&mut self.staged, step.table, column, &owner))
            }
            Ownership::ViaParent {
                foreign_column,
                parent_table,
                parent_owner_column,
            } => {
                let parent_ids: HashSet<String> = self
                    .staged
                    .get(parent_table)
                    .map(|rows| {
                        rows.iter()
                            .filter(|r| r.get(parent_owner_column) == Some(&user_id.to_string()))
                            .filter_map(|r| r.get(PARENT_KEY_COLUMN).cloned())
                            .collect()
                    })
                    .unwrap_or_default();

                if parent_ids.is_empty() {
                    return Ok(0);
                }
                Ok(delete_matching(
                    &mut self.staged,
                    step.table,
                    foreign_column,
                    &parent_ids,
                ))
            }
        }
    }

    async fn delete_profile(&mut self, user_id: &str) -> Result<u64> {
        let owner = HashSet::from([user_id.to_string()]);
        Ok(delete_matching(
            &mut self.staged,
            PROFILES_TABLE,
            PARENT_KEY_COLUMN,
            &owner,
        ))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryPurge { store, staged } = *self;
        store.state.lock().unwrap().tables = staged;
        Ok(())
    }
}

// =============================================================================
// Identity provider
// =============================================================================

#[derive(Default)]
struct IdentityState {
    users: HashMap<String, String>,
    next_id: u64,
    create_calls: usize,
    delete_calls: Vec<String>,
    fail_delete: Option<String>,
}

#[derive(Clone, Default)]
pub struct MemoryIdentity {
    state: Arc<Mutex<IdentityState>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: &str, email: &str) {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(id.to_string(), email.to_string());
    }

    pub fn exists(&self, id: &str) -> bool {
        self.state.lock().unwrap().users.contains_key(id)
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .users
            .values()
            .any(|e| e == email)
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().delete_calls.clone()
    }

    pub fn fail_deletes_with(&self, message: &str) {
        self.state.lock().unwrap().fail_delete = Some(message.to_string());
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn create_user(&self, identity: &NewIdentity) -> std::result::Result<String, IdentityError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;

        if state.users.values().any(|e| *e == identity.email) {
            return Err(IdentityError::Rejected(
                "A user with this email address has already been registered".into(),
            ));
        }

        state.next_id += 1;
        let id = format!("00000000-0000-4000-8000-{:012}", state.next_id);
        state.users.insert(id.clone(), identity.email.clone());
        Ok(id)
    }

    async fn delete_user(&self, user_id: &str) -> std::result::Result<(), IdentityError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push(user_id.to_string());

        if let Some(message) = &state.fail_delete {
            return Err(IdentityError::Rejected(message.clone()));
        }
        if state.users.remove(user_id).is_none() {
            return Err(IdentityError::Rejected("User not found".into()));
        }
        Ok(())
    }
}

// =============================================================================
// Payment gateway
// =============================================================================

#[derive(Clone)]
enum Verification {
    Paid(VerifiedTransaction),
    Declined(String),
}

#[derive(Clone, Default)]
pub struct StubGateway {
    outcomes: Arc<Mutex<HashMap<String, Verification>>>,
    calls: Arc<Mutex<usize>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paid(&self, transaction: VerifiedTransaction) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(transaction.reference.clone(), Verification::Paid(transaction));
    }

    pub fn declined(&self, reference: &str, message: &str) {
        self.outcomes.lock().unwrap().insert(
            reference.to_string(),
            Verification::Declined(message.to_string()),
        );
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn verify(&self, reference: &str) -> std::result::Result<VerifiedTransaction, GatewayError> {
        *self.calls.lock().unwrap() += 1;

        match self.outcomes.lock().unwrap().get(reference).cloned() {
            Some(Verification::Paid(tx)) => Ok(tx),
            Some(Verification::Declined(message)) => Err(GatewayError::Declined {
                message,
                details: None,
            }),
            None => Err(GatewayError::Declined {
                message: "Transaction reference not found".into(),
                details: None,
            }),
        }
    }
}
