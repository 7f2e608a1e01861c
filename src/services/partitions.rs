//! Partition Provisioner: idempotently ensures a ledger segment exists for a
//! calendar year. Provisioning is a deliberate administrative act — the
//! ledger never auto-creates segments on append.

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, DbErr, Statement};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Accepted provisioning window. Bounded to keep partition growth a
/// deliberate, auditable act rather than an unbounded surface.
pub const MIN_PARTITION_YEAR: i32 = 2020;
pub const MAX_PARTITION_YEAR: i32 = 2050;

const PARENT_TABLE: &str = "inventory_movement";

/// What `ensure_partition` did; both cases are success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionOutcome {
    Created,
    AlreadyExists,
}

/// One attached segment, as reported by the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionInfo {
    pub name: String,
    pub bounds: String,
}

pub fn partition_name(year: i32) -> String {
    format!("{}_y{}", PARENT_TABLE, year)
}

fn year_start(year: i32) -> DateTime<Utc> {
    // Jan 1 00:00:00 UTC exists for every year the validator lets through.
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .expect("start of a validated year is a valid instant")
}

fn validate_year(year: i32) -> Result<(), ServiceError> {
    if !(MIN_PARTITION_YEAR..=MAX_PARTITION_YEAR).contains(&year) {
        return Err(ServiceError::ValidationError(format!(
            "year {} is outside the provisionable range [{}, {}]",
            year, MIN_PARTITION_YEAR, MAX_PARTITION_YEAR,
        )));
    }
    Ok(())
}

/// DDL for one year segment. IF NOT EXISTS makes the statement itself the
/// check-and-create primitive: two callers racing on the same period resolve
/// inside the store, not in application code.
fn create_partition_sql(year: i32) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {name} \
         PARTITION OF {parent} \
         FOR VALUES FROM ('{from}-01-01 00:00:00+00') TO ('{to}-01-01 00:00:00+00');",
        name = partition_name(year),
        parent = PARENT_TABLE,
        from = year,
        to = year + 1,
    )
}

/// Parse the two timestamp literals out of a `pg_get_expr(relpartbound, ..)`
/// rendering, e.g.
/// `FOR VALUES FROM ('2024-01-01 00:00:00+00') TO ('2025-01-01 00:00:00+00')`.
fn parse_partition_bounds(expr: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let mut literals = expr.split('\'').skip(1).step_by(2);
    let from = parse_bound_literal(literals.next()?)?;
    let to = parse_bound_literal(literals.next()?)?;
    Some((from, to))
}

fn parse_bound_literal(lit: &str) -> Option<DateTime<Utc>> {
    for fmt in ["%Y-%m-%d %H:%M:%S%#z", "%Y-%m-%d %H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(lit, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    None
}

/// True when the catalog bound expression matches the exact year interval.
fn bounds_match(expr: &str, year: i32) -> bool {
    parse_partition_bounds(expr)
        .map(|(from, to)| from == year_start(year) && to == year_start(year + 1))
        .unwrap_or(false)
}

#[derive(Clone)]
pub struct PartitionService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PartitionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Ensures a ledger segment for `year` exists.
    ///
    /// Idempotent: an exactly-matching segment reports
    /// [`ProvisionOutcome::AlreadyExists`]. A segment occupying an
    /// overlapping but different interval is never adjusted — that is a
    /// [`ServiceError::PartitionConflict`]. Creation is one DDL statement,
    /// so a storage failure leaves nothing half-attached; it surfaces as
    /// [`ServiceError::ProvisioningFailed`] with the cause, and retrying is
    /// the caller's decision.
    #[instrument(skip(self))]
    pub async fn ensure_partition(&self, year: i32) -> Result<ProvisionOutcome, ServiceError> {
        validate_year(year)?;

        if let Some(bounds) = self.partition_bounds_expr(year).await? {
            if bounds_match(&bounds, year) {
                info!(year, "ledger segment already provisioned");
                return Ok(ProvisionOutcome::AlreadyExists);
            }
            return Err(ServiceError::PartitionConflict(format!(
                "segment {} exists with bounds `{}`, which do not cover exactly year {}",
                partition_name(year),
                bounds,
                year,
            )));
        }

        match self
            .db
            .execute_unprepared(&create_partition_sql(year))
            .await
        {
            Ok(_) => {
                info!(year, segment = %partition_name(year), "ledger segment provisioned");
                if let Err(e) = self
                    .event_sender
                    .send(Event::PartitionProvisioned { year })
                    .await
                {
                    warn!(error = %e, year, "failed to send partition event");
                }
                Ok(ProvisionOutcome::Created)
            }
            Err(err) => self.classify_create_error(year, err).await,
        }
    }

    /// All segments currently attached to the ledger, with their bounds.
    #[instrument(skip(self))]
    pub async fn list_partitions(&self) -> Result<Vec<PartitionInfo>, ServiceError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT c.relname AS name,
                      pg_get_expr(c.relpartbound, c.oid) AS bounds
                 FROM pg_inherits i
                 JOIN pg_class c ON c.oid = i.inhrelid
                 JOIN pg_class p ON p.oid = i.inhparent
                WHERE p.relname = $1
                ORDER BY c.relname"#,
            [PARENT_TABLE.into()],
        );

        let rows = self
            .db
            .query_all(stmt)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let mut partitions = Vec::with_capacity(rows.len());
        for row in rows {
            partitions.push(PartitionInfo {
                name: row.try_get("", "name").map_err(ServiceError::DatabaseError)?,
                bounds: row
                    .try_get("", "bounds")
                    .map_err(ServiceError::DatabaseError)?,
            });
        }
        Ok(partitions)
    }

    /// Bound expression of the segment named for `year`, if attached.
    async fn partition_bounds_expr(&self, year: i32) -> Result<Option<String>, ServiceError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT pg_get_expr(c.relpartbound, c.oid) AS bounds
                 FROM pg_inherits i
                 JOIN pg_class c ON c.oid = i.inhrelid
                 JOIN pg_class p ON p.oid = i.inhparent
                WHERE p.relname = $1
                  AND c.relname = $2"#,
            [PARENT_TABLE.into(), partition_name(year).into()],
        );

        let row = self
            .db
            .query_one(stmt)
            .await
            .map_err(ServiceError::DatabaseError)?;

        match row {
            Some(row) => row
                .try_get("", "bounds")
                .map(Some)
                .map_err(ServiceError::DatabaseError),
            None => Ok(None),
        }
    }

    /// A failed CREATE is either a range overlap (a differently-named
    /// segment already covers part of the interval), a lost race against a
    /// concurrent identical call (re-inspect and converge on success), or a
    /// genuine provisioning failure.
    async fn classify_create_error(
        &self,
        year: i32,
        err: DbErr,
    ) -> Result<ProvisionOutcome, ServiceError> {
        let msg = err.to_string();

        if msg.contains("would overlap partition") {
            return Err(ServiceError::PartitionConflict(format!(
                "year {} overlaps an existing segment with different bounds",
                year,
            )));
        }

        if msg.contains("already exists") {
            return match self.partition_bounds_expr(year).await? {
                Some(bounds) if bounds_match(&bounds, year) => {
                    info!(year, "concurrent provisioning detected; segment present");
                    Ok(ProvisionOutcome::AlreadyExists)
                }
                Some(bounds) => Err(ServiceError::PartitionConflict(format!(
                    "segment {} exists with bounds `{}`, which do not cover exactly year {}",
                    partition_name(year),
                    bounds,
                    year,
                ))),
                None => Err(ServiceError::ProvisioningFailed { year, source: err }),
            };
        }

        Err(ServiceError::ProvisioningFailed { year, source: err })
    }
}
