//! Daily plan cache.
//!
//! A stored plan is served again only when it was produced today (local time)
//! and matches the current schema; every other case regenerates, passing the
//! stored plan along as a variety hint. The plan, its date key and a schema
//! version are persisted together as a single record so they can never drift
//! apart.

use std::sync::{Arc, RwLock};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use nutrigpt_client::observability::{
    record_cache_miss, record_plan_request, record_store_write_failure,
};
use nutrigpt_client::utils::date_key;
use nutrigpt_client::{DailyPlan, GenerationError, PlanGenerator, UserProfile};

use crate::store::{Store, StoreError, keys};

/// Bump whenever the persisted plan shape changes.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;
/// Version assigned to plans found under the pre-record legacy keys.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

pub trait Clock: Send + Sync + 'static {
    /// Today's calendar date in the user's local time zone.
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    date: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: RwLock::new(date),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        match self.date.write() {
            Ok(mut d) => *d = date,
            Err(poisoned) => *poisoned.into_inner() = date,
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.date.read() {
            Ok(d) => *d,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub schema_version: u32,
    pub date_key: String,
    pub plan: DailyPlan,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheRecordRef<'a> {
    schema_version: u32,
    date_key: &'a str,
    plan: &'a DailyPlan,
}

impl CacheRecord {
    pub fn is_schema_valid(&self) -> bool {
        self.schema_version == CURRENT_SCHEMA_VERSION && self.plan.is_schema_valid()
    }

    pub fn is_reusable_on(&self, today_key: &str) -> bool {
        self.date_key == today_key && self.is_schema_valid()
    }
}

/// Outcome of reading the stored plan. Corrupt data is a miss, but an observable one.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheRead {
    Found(CacheRecord),
    Absent,
    Corrupt { reason: String },
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanOrigin {
    Cached,
    Generated,
}

impl PlanOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanOrigin::Cached => "cached",
            PlanOrigin::Generated => "generated",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFetch {
    pub plan: DailyPlan,
    pub origin: PlanOrigin,
    pub date_key: String,
    /// False when a freshly generated plan could not be written back.
    pub persisted: bool,
}

pub struct PlanCache {
    store: Arc<dyn Store>,
    generator: Arc<dyn PlanGenerator>,
    clock: Arc<dyn Clock>,
    in_flight: Mutex<()>,
}

impl PlanCache {
    pub fn new(
        store: Arc<dyn Store>,
        generator: Arc<dyn PlanGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            generator,
            clock,
            in_flight: Mutex::new(()),
        }
    }

    pub fn today_key(&self) -> String {
        date_key(self.clock.today())
    }

    /// Read the stored record without side effects.
    pub fn peek(&self) -> CacheRead {
        match self.store.get(keys::PLAN_CACHE) {
            Ok(Some(raw)) => match serde_json::from_str::<CacheRecord>(&raw) {
                Ok(record) => CacheRead::Found(record),
                Err(e) => CacheRead::Corrupt {
                    reason: e.to_string(),
                },
            },
            Ok(None) => self.peek_legacy(),
            Err(e) => CacheRead::Corrupt {
                reason: format!("store read failed: {e}"),
            },
        }
    }

    fn peek_legacy(&self) -> CacheRead {
        let raw = match self.store.get(keys::LEGACY_DAILY_PLAN) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheRead::Absent,
            Err(e) => {
                return CacheRead::Corrupt {
                    reason: format!("store read failed: {e}"),
                };
            }
        };
        match serde_json::from_str::<DailyPlan>(&raw) {
            Ok(plan) => CacheRead::Found(CacheRecord {
                schema_version: LEGACY_SCHEMA_VERSION,
                date_key: self
                    .store
                    .get(keys::LEGACY_PLAN_DATE)
                    .ok()
                    .flatten()
                    .unwrap_or_default(),
                plan,
            }),
            Err(e) => CacheRead::Corrupt {
                reason: e.to_string(),
            },
        }
    }

    /// Today's plan if one is stored and reusable. Never generates.
    pub fn current_plan(&self) -> Option<DailyPlan> {
        match self.peek() {
            CacheRead::Found(record) if record.is_reusable_on(&self.today_key()) => {
                Some(record.plan)
            }
            _ => None,
        }
    }

    pub async fn get_plan(
        &self,
        profile: &UserProfile,
        force_new: bool,
    ) -> Result<DailyPlan, GenerationError> {
        self.fetch(profile, force_new).await.map(|f| f.plan)
    }

    /// Serve today's stored plan or generate, persist and return a new one.
    ///
    /// On generation failure the stored record is left untouched. A failed write
    /// after a successful generation still returns the new plan, with
    /// `persisted == false`.
    pub async fn fetch(
        &self,
        profile: &UserProfile,
        force_new: bool,
    ) -> Result<PlanFetch, GenerationError> {
        let _in_flight = self.in_flight.lock().await;
        let today = self.clock.today();
        let today_key = date_key(today);

        let previous = match self.peek() {
            CacheRead::Found(record) => {
                if !force_new && record.is_reusable_on(&today_key) {
                    debug!(date_key = %today_key, "serving cached plan");
                    record_plan_request(PlanOrigin::Cached.as_str());
                    return Ok(PlanFetch {
                        plan: record.plan,
                        origin: PlanOrigin::Cached,
                        date_key: today_key,
                        persisted: true,
                    });
                }
                let reason = if force_new {
                    "forced"
                } else if !record.is_schema_valid() {
                    "schema"
                } else {
                    "stale"
                };
                info!(
                    reason,
                    stored_date_key = %record.date_key,
                    schema_version = record.schema_version,
                    "regenerating plan"
                );
                record_cache_miss(reason);
                Some(record.plan)
            }
            CacheRead::Absent => {
                record_cache_miss("absent");
                None
            }
            CacheRead::Corrupt { reason } => {
                warn!(%reason, "discarding unreadable cached plan");
                record_cache_miss("corrupt");
                None
            }
        };

        let plan = self
            .generator
            .generate(profile, previous.as_ref(), today)
            .await?;
        if !plan.is_schema_valid() {
            return Err(GenerationError::SchemaViolation);
        }

        let persisted = self.persist(&today_key, &plan);
        record_plan_request(PlanOrigin::Generated.as_str());
        Ok(PlanFetch {
            plan,
            origin: PlanOrigin::Generated,
            date_key: today_key,
            persisted,
        })
    }

    fn persist(&self, today_key: &str, plan: &DailyPlan) -> bool {
        let record = CacheRecordRef {
            schema_version: CURRENT_SCHEMA_VERSION,
            date_key: today_key,
            plan,
        };
        let written = serde_json::to_string(&record)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.store
                    .set(keys::PLAN_CACHE, &raw)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = written {
            warn!(%error, "failed to persist generated plan; serving it uncached");
            record_store_write_failure();
            return false;
        }

        for key in [keys::LEGACY_DAILY_PLAN, keys::LEGACY_PLAN_DATE] {
            if let Err(e) = self.store.remove(key) {
                debug!(key, error = %e, "could not remove legacy plan key");
            }
        }
        true
    }

    /// Drop every stored plan key, composite and legacy.
    pub fn invalidate(&self) -> Result<(), StoreError> {
        for key in [
            keys::PLAN_CACHE,
            keys::LEGACY_DAILY_PLAN,
            keys::LEGACY_PLAN_DATE,
        ] {
            self.store.remove(key)?;
        }
        Ok(())
    }
}
