pub mod ownership;
pub mod pool;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{FeatureFlags, NewProfile, Settled, SmsTopup, SubscriptionPayment};
use ownership::OwnedTable;

pub use pool::create_pool;
pub use postgres::PgStore;

/// Relational store reached with service-role privileges
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Cheap round trip for health checks
    async fn ping(&self) -> Result<()>;

    /// Open an atomic session for purging one user's data
    async fn begin_purge(&self) -> Result<Box<dyn PurgeSession>>;

    /// Insert or replace the profile row keyed by `profile.id`
    async fn upsert_profile(&self, profile: &NewProfile) -> Result<()>;

    async fn load_feature_flags(&self) -> Result<FeatureFlags>;

    /// Record a top-up and credit the seller; value is the new credit balance
    async fn settle_sms_topup(&self, topup: &SmsTopup) -> Result<Settled<i64>>;

    /// Record a renewal and extend the seller's window; value is the expiry
    async fn settle_subscription(
        &self,
        payment: &SubscriptionPayment,
    ) -> Result<Settled<Option<DateTime<Utc>>>>;
}

/// Purge work for one user; nothing is visible to others until [`commit`](Self::commit)
#[async_trait]
pub trait PurgeSession: Send {
    /// Delete the user's rows for one schema entry; a failure undoes only this entry
    async fn purge_step(&mut self, step: &OwnedTable, user_id: &str) -> Result<u64>;

    async fn delete_profile(&mut self, user_id: &str) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
