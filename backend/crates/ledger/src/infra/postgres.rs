//! PostgreSQL Repository Implementations

use auth::domain::value_object::kyc_status::KycStatus;
use auth::domain::value_object::referral_code::ReferralCode;
use chrono::{DateTime, Utc};
use kernel::currency::Currency;
use kernel::id::{DepositId, UserId};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::domain::commission;
use crate::domain::entities::{
    ContractorStats, ContractorTerms, CurrencyTotal, DashboardStats, Deposit, NewDeposit,
    Settlement,
};
use crate::domain::repository::{DepositRepository, LedgerStatsRepository};
use crate::domain::value_objects::{DepositStatus, SepaReference};
use crate::error::{LedgerError, LedgerResult};

const DEPOSIT_COLUMNS: &str = r#"
    deposit_id,
    user_id,
    amount,
    currency,
    status,
    reference,
    referral_code,
    contractor_id,
    contractor_commission,
    created_at,
    settled_at
"#;

/// PostgreSQL-backed ledger repository
#[derive(Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Contractor by id, else by referral code; must still be a contractor with a rate
async fn resolve_contractor(
    conn: &mut PgConnection,
    deposit: &Deposit,
) -> LedgerResult<Option<ContractorTerms>> {
    const BY_ID: &str = r#"
        SELECT user_id, contractor_commission_rate
        FROM users
        WHERE user_id = $1 AND is_contractor AND contractor_commission_rate IS NOT NULL
    "#;
    const BY_CODE: &str = r#"
        SELECT user_id, contractor_commission_rate
        FROM users
        WHERE referral_code = $1 AND is_contractor AND contractor_commission_rate IS NOT NULL
    "#;

    let mut row = None;
    if let Some(contractor_id) = deposit.contractor_id {
        row = sqlx::query_as::<_, (i64, Decimal)>(BY_ID)
            .bind(contractor_id.as_i64())
            .fetch_optional(&mut *conn)
            .await?;
    }
    if let (true, Some(code)) = (row.is_none(), &deposit.referral_code) {
        row = sqlx::query_as::<_, (i64, Decimal)>(BY_CODE)
            .bind(code.as_str())
            .fetch_optional(&mut *conn)
            .await?;
    }

    Ok(row.map(|(user_id, rate)| ContractorTerms {
        contractor_id: UserId::from_i64(user_id),
        commission_rate: rate,
    }))
}

// ============================================================================
// Deposit Repository Implementation
// ============================================================================

impl DepositRepository for PgLedgerRepository {
    async fn create_deposit(&self, deposit: &NewDeposit) -> LedgerResult<Deposit> {
        let sql = format!(
            r#"
            INSERT INTO deposits (
                user_id,
                amount,
                currency,
                status,
                reference,
                referral_code,
                contractor_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {DEPOSIT_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, DepositRow>(&sql)
            .bind(deposit.user_id.as_i64())
            .bind(deposit.amount)
            .bind(deposit.currency.as_str())
            .bind(DepositStatus::Pending.id())
            .bind(deposit.reference.as_str())
            .bind(deposit.referral_code.as_ref().map(|c| c.as_str()))
            .bind(deposit.contractor_id.map(|id| id.as_i64()))
            .fetch_one(&self.pool)
            .await?;

        row.into_deposit()
    }

    async fn find_deposit(&self, deposit_id: DepositId) -> LedgerResult<Option<Deposit>> {
        let sql = format!("SELECT {DEPOSIT_COLUMNS} FROM deposits WHERE deposit_id = $1");

        let row = sqlx::query_as::<_, DepositRow>(&sql)
            .bind(deposit_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(DepositRow::into_deposit).transpose()
    }

    async fn list_user_deposits(&self, user_id: UserId) -> LedgerResult<Vec<Deposit>> {
        let sql = format!(
            "SELECT {DEPOSIT_COLUMNS} FROM deposits WHERE user_id = $1 \
             ORDER BY created_at DESC, deposit_id DESC"
        );

        let rows = sqlx::query_as::<_, DepositRow>(&sql)
            .bind(user_id.as_i64())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DepositRow::into_deposit).collect()
    }

    async fn list_deposits(
        &self,
        status: Option<DepositStatus>,
        limit: i64,
    ) -> LedgerResult<Vec<Deposit>> {
        let sql = format!(
            "SELECT {DEPOSIT_COLUMNS} FROM deposits \
             WHERE ($1::SMALLINT IS NULL OR status = $1) \
             ORDER BY created_at DESC, deposit_id DESC \
             LIMIT $2"
        );

        let rows = sqlx::query_as::<_, DepositRow>(&sql)
            .bind(status.map(|s| s.id()))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DepositRow::into_deposit).collect()
    }

    async fn settle_deposit(
        &self,
        deposit_id: DepositId,
        target: DepositStatus,
    ) -> LedgerResult<Option<Settlement>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {DEPOSIT_COLUMNS} FROM deposits WHERE deposit_id = $1 FOR UPDATE");
        let Some(row) = sqlx::query_as::<_, DepositRow>(&sql)
            .bind(deposit_id.as_i64())
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let mut deposit = row.into_deposit()?;

        let contractor = if target == DepositStatus::Completed && !deposit.status.is_terminal() {
            resolve_contractor(&mut *tx, &deposit).await?
        } else {
            None
        };

        let transitioned = commission::settle(&mut deposit, target, contractor, Utc::now())?;
        if !transitioned {
            tx.rollback().await?;
            return Ok(Some(Settlement {
                deposit,
                transitioned: false,
                balance_credited: false,
            }));
        }

        sqlx::query(
            r#"
            UPDATE deposits SET
                status = $2,
                contractor_id = $3,
                contractor_commission = $4,
                settled_at = $5
            WHERE deposit_id = $1
            "#,
        )
        .bind(deposit_id.as_i64())
        .bind(deposit.status.id())
        .bind(deposit.contractor_id.map(|id| id.as_i64()))
        .bind(deposit.contractor_commission)
        .bind(deposit.settled_at)
        .execute(&mut *tx)
        .await?;

        let mut balance_credited = false;
        if deposit.status == DepositStatus::Completed {
            balance_credited = sqlx::query(
                r#"
                UPDATE users SET
                    balance = balance + $2,
                    updated_at = NOW()
                WHERE user_id = $1 AND currency = $3
                "#,
            )
            .bind(deposit.user_id.as_i64())
            .bind(deposit.amount)
            .bind(deposit.currency.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected()
                == 1;
        }

        tx.commit().await?;

        Ok(Some(Settlement {
            deposit,
            transitioned: true,
            balance_credited,
        }))
    }
}

// ============================================================================
// Stats Repository Implementation
// ============================================================================

impl LedgerStatsRepository for PgLedgerRepository {
    async fn contractor_stats(&self, contractor_id: UserId) -> LedgerResult<ContractorStats> {
        let referred_users =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE contractor_id = $1")
                .bind(contractor_id.as_i64())
                .fetch_one(&self.pool)
                .await?;

        let (pending_deposits, completed_deposits) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = $2),
                COUNT(*) FILTER (WHERE status = $3)
            FROM deposits
            WHERE contractor_id = $1
            "#,
        )
        .bind(contractor_id.as_i64())
        .bind(DepositStatus::Pending.id())
        .bind(DepositStatus::Completed.id())
        .fetch_one(&self.pool)
        .await?;

        let totals = sqlx::query_as::<_, TotalRow>(
            r#"
            SELECT
                currency,
                SUM(amount) AS volume,
                COALESCE(SUM(contractor_commission), 0) AS commission
            FROM deposits
            WHERE contractor_id = $1 AND status = $2
            GROUP BY currency
            ORDER BY currency
            "#,
        )
        .bind(contractor_id.as_i64())
        .bind(DepositStatus::Completed.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(ContractorStats {
            referred_users,
            pending_deposits,
            completed_deposits,
            totals: totals
                .into_iter()
                .map(TotalRow::into_total)
                .collect::<LedgerResult<_>>()?,
        })
    }

    async fn dashboard_stats(&self) -> LedgerResult<DashboardStats> {
        let (total_users, pending_kyc, contractors) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE kyc_status = $1),
                COUNT(*) FILTER (WHERE is_contractor)
            FROM users
            "#,
        )
        .bind(KycStatus::Pending.id())
        .fetch_one(&self.pool)
        .await?;

        let counts = sqlx::query_as::<_, (i16, i64)>(
            "SELECT status, COUNT(*) FROM deposits GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        let deposits_by_status = DepositStatus::ALL
            .into_iter()
            .map(|status| {
                let count = counts
                    .iter()
                    .find(|(id, _)| *id == status.id())
                    .map_or(0, |(_, count)| *count);
                (status, count)
            })
            .collect();

        let volume = sqlx::query_as::<_, TotalRow>(
            r#"
            SELECT
                currency,
                SUM(amount) AS volume,
                COALESCE(SUM(contractor_commission), 0) AS commission
            FROM deposits
            WHERE status = $1
            GROUP BY currency
            ORDER BY currency
            "#,
        )
        .bind(DepositStatus::Completed.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_users,
            pending_kyc,
            contractors,
            deposits_by_status,
            completed_volume: volume
                .into_iter()
                .map(TotalRow::into_total)
                .collect::<LedgerResult<_>>()?,
        })
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct DepositRow {
    deposit_id: i64,
    user_id: i64,
    amount: Decimal,
    currency: String,
    status: i16,
    reference: String,
    referral_code: Option<String>,
    contractor_id: Option<i64>,
    contractor_commission: Option<Decimal>,
    created_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

impl DepositRow {
    fn into_deposit(self) -> LedgerResult<Deposit> {
        let status = DepositStatus::from_id(self.status).ok_or_else(|| {
            LedgerError::Internal(format!("Invalid deposit status: {}", self.status))
        })?;

        Ok(Deposit {
            deposit_id: DepositId::from_i64(self.deposit_id),
            user_id: UserId::from_i64(self.user_id),
            amount: self.amount,
            currency: parse_currency(&self.currency)?,
            status,
            reference: SepaReference::from_db(self.reference),
            referral_code: self.referral_code.map(ReferralCode::from_db),
            contractor_id: self.contractor_id.map(UserId::from_i64),
            contractor_commission: self.contractor_commission,
            created_at: self.created_at,
            settled_at: self.settled_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TotalRow {
    currency: String,
    volume: Decimal,
    commission: Decimal,
}

impl TotalRow {
    fn into_total(self) -> LedgerResult<CurrencyTotal> {
        Ok(CurrencyTotal {
            currency: parse_currency(&self.currency)?,
            volume: self.volume,
            commission: self.commission,
        })
    }
}

fn parse_currency(code: &str) -> LedgerResult<Currency> {
    Currency::new(code).map_err(|e| LedgerError::Internal(format!("Invalid currency: {e}")))
}
