use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::ownership::{
    is_plain_identifier, OwnedTable, Ownership, PARENT_KEY_COLUMN, PROFILES_TABLE,
};
use super::{PurgeSession, RecordStore};
use crate::constants::{ERR_INVALID_SELLER_ID, ERR_INVALID_SUBSCRIPTION_LENGTH};
use crate::error::{AppError, Result};
use crate::models::{
    extend_subscription, FeatureFlags, NewProfile, Settled, SmsTopup, SubscriptionPayment,
};

/// PostgreSQL-backed store
///
/// Owner columns are UUIDs. An id that does not parse as one owns nothing, so
/// purges for it are zero-row steps.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

fn seller_uuid(seller_id: &str) -> Result<Uuid> {
    parse_id(seller_id).ok_or_else(|| AppError::Validation(ERR_INVALID_SELLER_ID.to_string()))
}

fn checked(name: &'static str) -> Result<&'static str> {
    if is_plain_identifier(name) {
        Ok(name)
    } else {
        Err(AppError::Internal(format!("refusing unsafe identifier {name:?}")))
    }
}

fn direct_delete_sql(table: &str, column: &str) -> String {
    format!(r#"DELETE FROM "{table}" WHERE "{column}" = $1"#)
}

fn parent_ids_sql(parent_table: &str, owner_column: &str) -> String {
    format!(
        r#"SELECT "{PARENT_KEY_COLUMN}" FROM "{parent_table}" WHERE "{owner_column}" = $1"#
    )
}

fn child_delete_sql(table: &str, foreign_column: &str) -> String {
    format!(r#"DELETE FROM "{table}" WHERE "{foreign_column}" = ANY($1)"#)
}

#[async_trait]
impl RecordStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn begin_purge(&self) -> Result<Box<dyn PurgeSession>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgPurge { tx }))
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles
                (id, email, full_name, role, student_id, department, faculty, phone, is_active, updated_at)
            VALUES ($1::uuid, $2, $3, $4, $5, $6, $7, $8, $9, now())
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                role = EXCLUDED.role,
                student_id = EXCLUDED.student_id,
                department = EXCLUDED.department,
                faculty = EXCLUDED.faculty,
                phone = EXCLUDED.phone,
                is_active = EXCLUDED.is_active,
                updated_at = now()
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.role.as_str())
        .bind(&profile.student_id)
        .bind(&profile.department)
        .bind(&profile.faculty)
        .bind(&profile.phone)
        .bind(profile.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_feature_flags(&self) -> Result<FeatureFlags> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM app_settings")
            .fetch_all(&self.pool)
            .await?;

        let mut flags = FeatureFlags::default();
        for (key, value) in &rows {
            flags.apply(key, value);
        }
        Ok(flags)
    }

    async fn settle_sms_topup(&self, topup: &SmsTopup) -> Result<Settled<i64>> {
        let seller_id = seller_uuid(&topup.seller_id)?;
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO sms_topups (reference, seller_id, amount_kobo, units, paid_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (reference) DO NOTHING
            "#,
        )
        .bind(&topup.reference)
        .bind(seller_id)
        .bind(topup.amount_kobo)
        .bind(topup.units)
        .bind(topup.paid_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            let balance: Option<i64> = sqlx::query_scalar(
                "SELECT sms_credits FROM seller_profiles WHERE user_id = $1",
            )
            .bind(seller_id)
            .fetch_optional(&mut *tx)
            .await?;
            tx.rollback().await?;

            return Ok(Settled {
                replayed: true,
                value: balance.unwrap_or(0),
            });
        }

        let balance: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO seller_profiles (user_id, sms_credits, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (user_id) DO UPDATE SET
                sms_credits = seller_profiles.sms_credits + EXCLUDED.sms_credits,
                updated_at = now()
            RETURNING sms_credits
            "#,
        )
        .bind(seller_id)
        .bind(topup.units)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Settled {
            replayed: false,
            value: balance,
        })
    }

    async fn settle_subscription(
        &self,
        payment: &SubscriptionPayment,
    ) -> Result<Settled<Option<DateTime<Utc>>>> {
        let seller_id = seller_uuid(&payment.seller_id)?;
        let months = i32::try_from(payment.months).map_err(|_| invalid_length(payment.months))?;
        let mut tx = self.pool.begin().await?;

        // The row must exist before it is locked, or first renewals race
        sqlx::query("INSERT INTO seller_profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(seller_id)
            .execute(&mut *tx)
            .await?;

        let current: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT subscription_expires_at FROM seller_profiles WHERE user_id = $1 FOR UPDATE",
        )
        .bind(seller_id)
        .fetch_one(&mut *tx)
        .await?;

        let Some(expires_at) = extend_subscription(current, Utc::now(), payment.months) else {
            tx.rollback().await?;
            return Err(invalid_length(payment.months));
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO subscription_payments (reference, seller_id, amount_kobo, months, paid_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (reference) DO NOTHING
            "#,
        )
        .bind(&payment.reference)
        .bind(seller_id)
        .bind(payment.amount_kobo)
        .bind(months)
        .bind(payment.paid_at)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(Settled {
                replayed: true,
                value: current,
            });
        }

        sqlx::query(
            r#"
            UPDATE seller_profiles
            SET subscription_status = 'active', subscription_expires_at = $2, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(seller_id)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Settled {
            replayed: false,
            value: Some(expires_at),
        })
    }
}

fn invalid_length(months: u32) -> AppError {
    AppError::PaymentRejected {
        message: ERR_INVALID_SUBSCRIPTION_LENGTH.to_string(),
        details: Some(format!("{months} months")),
    }
}

/// One transaction per purge; each schema entry runs under a savepoint
struct PgPurge {
    tx: Transaction<'static, Postgres>,
}

impl PgPurge {
    async fn run_step(&mut self, step: &OwnedTable, user_id: Uuid) -> Result<u64> {
        let table = checked(step.table)?;

        match step.ownership {
            Ownership::Direct { column } => {
                let sql = direct_delete_sql(table, checked(column)?);
                let result = sqlx::query(&sql)
                    .bind(user_id)
                    .execute(&mut *self.tx)
                    .await?;
                Ok(result.rows_affected())
            }
            Ownership::ViaParent {
                foreign_column,
                parent_table,
                parent_owner_column,
            } => {
                let select = parent_ids_sql(checked(parent_table)?, checked(parent_owner_column)?);
                let parent_ids: Vec<Uuid> = sqlx::query_scalar(&select)
                    .bind(user_id)
                    .fetch_all(&mut *self.tx)
                    .await?;

                if parent_ids.is_empty() {
                    return Ok(0);
                }

                let sql = child_delete_sql(table, checked(foreign_column)?);
                let result = sqlx::query(&sql)
                    .bind(parent_ids)
                    .execute(&mut *self.tx)
                    .await?;
                Ok(result.rows_affected())
            }
        }
    }
}

#[async_trait]
impl PurgeSession for PgPurge {
    async fn purge_step(&mut self, step: &OwnedTable, user_id: &str) -> Result<u64> {
        let Some(user_id) = parse_id(user_id) else {
            return Ok(0);
        };

        sqlx::query("SAVEPOINT purge_step")
            .execute(&mut *self.tx)
            .await?;

        match self.run_step(step, user_id).await {
            Ok(rows) => {
                sqlx::query("RELEASE SAVEPOINT purge_step")
                    .execute(&mut *self.tx)
                    .await?;
                Ok(rows)
            }
            Err(err) => {
                sqlx::query("ROLLBACK TO SAVEPOINT purge_step")
                    .execute(&mut *self.tx)
                    .await?;
                Err(err)
            }
        }
    }

    async fn delete_profile(&mut self, user_id: &str) -> Result<u64> {
        let Some(user_id) = parse_id(user_id) else {
            return Ok(0);
        };
        let sql = direct_delete_sql(PROFILES_TABLE, PARENT_KEY_COLUMN);
        let result = sqlx::query(&sql)
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
