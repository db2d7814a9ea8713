use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::{DailyCheckIn, WeeklyCheckIn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredHistory {
    /// Ascending by week, one record per week.
    pub check_ins: Vec<WeeklyCheckIn>,
    pub current_week: Option<u32>,
    pub daily: Vec<DailyCheckIn>,
}

/// Bound to one namespace at construction; every call reads or writes only that namespace.
#[async_trait]
pub trait CheckInStore: Send + Sync {
    fn namespace(&self) -> &str;

    async fn get_all(&self) -> Result<StoredHistory, StoreError>;

    /// Inserts the check-in or replaces the one already stored for its week.
    async fn upsert_by_week(&self, check_in: &WeeklyCheckIn) -> Result<(), StoreError>;

    async fn append_daily(&self, entry: &DailyCheckIn) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    namespace: String,
    inner: Mutex<StoredHistory>,
}

impl MemoryStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            inner: Mutex::new(StoredHistory::default()),
        }
    }
}

#[async_trait]
impl CheckInStore for MemoryStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn get_all(&self) -> Result<StoredHistory, StoreError> {
        Ok(self.inner.lock().await.clone())
    }

    async fn upsert_by_week(&self, check_in: &WeeklyCheckIn) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        upsert_sorted(&mut inner.check_ins, check_in.clone());
        inner.current_week = inner.check_ins.last().map(|c| c.week);
        Ok(())
    }

    async fn append_daily(&self, entry: &DailyCheckIn) -> Result<(), StoreError> {
        self.inner.lock().await.daily.push(entry.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.inner.lock().await = StoredHistory::default();
        Ok(())
    }
}

pub fn upsert_sorted(check_ins: &mut Vec<WeeklyCheckIn>, check_in: WeeklyCheckIn) {
    match check_ins.binary_search_by_key(&check_in.week, |c| c.week) {
        Ok(index) => check_ins[index] = check_in,
        Err(index) => check_ins.insert(index, check_in),
    }
}
