use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use gearfit_core::cache::CacheStore;
use gearfit_core::domain::cache::{CacheEntry, CacheKey};
use gearfit_core::domain::case::{CaseFilter, CaseId, CaseItem};
use gearfit_core::domain::compatibility::CompatibilityMatch;
use gearfit_core::domain::feedback::{FeedbackId, FeedbackRecord};
use gearfit_core::domain::gear::{GearId, GearItem};
use gearfit_core::errors::ApplicationError;
use gearfit_core::feedback::FeedbackStore;
use gearfit_core::matching::{CaseCatalog, CompatibilityMatchStore, GearCatalog};

#[derive(Default)]
pub struct InMemoryGearRepository {
    gear: RwLock<HashMap<String, GearItem>>,
}

impl InMemoryGearRepository {
    pub async fn save(&self, gear: GearItem) {
        self.gear.write().await.insert(gear.id.0.clone(), gear);
    }
}

#[async_trait::async_trait]
impl GearCatalog for InMemoryGearRepository {
    async fn find_gear(&self, id: &GearId) -> Result<Option<GearItem>, ApplicationError> {
        let gear = self.gear.read().await;
        Ok(gear.get(&id.0).cloned())
    }
}

/// Keyed by id in a `BTreeMap` so queries come back in the same id order as the SQL store.
#[derive(Default)]
pub struct InMemoryCaseRepository {
    cases: RwLock<BTreeMap<String, CaseItem>>,
}

impl InMemoryCaseRepository {
    pub async fn save(&self, case: CaseItem) {
        self.cases.write().await.insert(case.id.0.clone(), case);
    }
}

#[async_trait::async_trait]
impl CaseCatalog for InMemoryCaseRepository {
    async fn find_case(&self, id: &CaseId) -> Result<Option<CaseItem>, ApplicationError> {
        let cases = self.cases.read().await;
        Ok(cases.get(&id.0).cloned())
    }

    async fn query_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseItem>, ApplicationError> {
        let cases = self.cases.read().await;
        Ok(cases.values().filter(|case| filter.matches(case)).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryCompatibilityMatchRepository {
    matches: RwLock<HashMap<(GearId, CaseId), CompatibilityMatch>>,
}

#[async_trait::async_trait]
impl CompatibilityMatchStore for InMemoryCompatibilityMatchRepository {
    async fn find_match(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<Option<CompatibilityMatch>, ApplicationError> {
        let matches = self.matches.read().await;
        Ok(matches.get(&(gear_id.clone(), case_id.clone())).cloned())
    }

    async fn upsert_match(
        &self,
        mut record: CompatibilityMatch,
    ) -> Result<CompatibilityMatch, ApplicationError> {
        let mut matches = self.matches.write().await;
        if let Some(existing) = matches.get(&record.key()) {
            if existing.updated_at > record.updated_at {
                return Ok(existing.clone());
            }
            record.created_at = existing.created_at;
        }
        matches.insert(record.key(), record.clone());
        Ok(record)
    }

    async fn list_matches_for_gear(
        &self,
        gear_id: &GearId,
        limit: usize,
    ) -> Result<Vec<CompatibilityMatch>, ApplicationError> {
        let matches = self.matches.read().await;
        let mut listed: Vec<_> = matches.values().filter(|m| m.gear_id == *gear_id).cloned().collect();
        listed.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.case_id.cmp(&b.case_id)));
        listed.truncate(limit);
        Ok(listed)
    }
}

#[derive(Default)]
pub struct InMemoryFeedbackRepository {
    records: RwLock<HashMap<String, FeedbackRecord>>,
}

fn newest_first(records: &mut [FeedbackRecord]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.0.cmp(&b.id.0)));
}

#[async_trait::async_trait]
impl FeedbackStore for InMemoryFeedbackRepository {
    async fn insert(&self, record: FeedbackRecord) -> Result<FeedbackRecord, ApplicationError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id.0) {
            return Err(ApplicationError::Persistence(format!("duplicate feedback id {}", record.id)));
        }
        records.insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &FeedbackId) -> Result<Option<FeedbackRecord>, ApplicationError> {
        let records = self.records.read().await;
        Ok(records.get(&id.0).cloned())
    }

    async fn list_for_match(
        &self,
        gear_id: &GearId,
        case_id: &CaseId,
    ) -> Result<Vec<FeedbackRecord>, ApplicationError> {
        let records = self.records.read().await;
        let mut listed: Vec<_> = records
            .values()
            .filter(|record| record.gear_id == *gear_id && record.case_id == *case_id)
            .cloned()
            .collect();
        newest_first(&mut listed);
        Ok(listed)
    }

    async fn list_for_gear(&self, gear_id: &GearId) -> Result<Vec<FeedbackRecord>, ApplicationError> {
        let records = self.records.read().await;
        let mut listed: Vec<_> =
            records.values().filter(|record| record.gear_id == *gear_id).cloned().collect();
        newest_first(&mut listed);
        Ok(listed)
    }

    async fn update(&self, record: FeedbackRecord) -> Result<bool, ApplicationError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id.0) {
            Some(slot) => {
                *slot = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &FeedbackId) -> Result<bool, ApplicationError> {
        let mut records = self.records.write().await;
        Ok(records.remove(&id.0).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryCacheRepository {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheRepository {
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CacheStore for InMemoryCacheRepository {
    async fn get_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>, ApplicationError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&key.0).cloned())
    }

    async fn upsert_entry(&self, mut entry: CacheEntry) -> Result<(), ApplicationError> {
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(&entry.key.0) {
            if existing.updated_at > entry.updated_at {
                return Ok(());
            }
            entry.created_at = existing.created_at;
        }
        entries.insert(entry.key.0.clone(), entry);
        Ok(())
    }

    async fn delete_entry(&self, key: &CacheKey) -> Result<bool, ApplicationError> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(&key.0).is_some())
    }

    async fn clear_namespace(&self, namespace: &str) -> Result<u64, ApplicationError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.namespace != namespace);
        Ok((before - entries.len()) as u64)
    }

    async fn clear_expired(&self, now: DateTime<Utc>) -> Result<u64, ApplicationError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        Ok((before - entries.len()) as u64)
    }
}
