// ==========================================
// 地铁车队运营排程系统 - 特征记录存储协作方
// ==========================================
// 职责: 定义排程服务所需的批次读写接口 + SQLite 实现
// 红线: 昨日批次缺失返回 None,不视为错误
// ==========================================

use crate::domain::train::TrainFeatureRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::feature_record_repo::FeatureRecordRepository;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

// ==========================================
// FeatureRecordStore Trait
// ==========================================
#[async_trait]
pub trait FeatureRecordStore: Send + Sync {
    /// 读取某日批次 (不存在时返回空批次)
    async fn load_batch(&self, date: NaiveDate) -> RepositoryResult<Vec<TrainFeatureRecord>>;

    /// 读取该日之前最近一个批次
    ///
    /// # 返回
    /// - None: 无历史批次 (首日/冷启动)
    async fn load_previous_batch(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Option<Vec<TrainFeatureRecord>>>;

    /// 覆盖写入某日批次并追加历史
    async fn save_batch(
        &self,
        date: NaiveDate,
        records: Vec<TrainFeatureRecord>,
    ) -> RepositoryResult<usize>;
}

// ==========================================
// SqliteFeatureRecordStore - SQLite 实现
// ==========================================
// rusqlite 为同步接口,放入阻塞线程池执行
pub struct SqliteFeatureRecordStore {
    repo: Arc<FeatureRecordRepository>,
}

impl SqliteFeatureRecordStore {
    pub fn new(repo: Arc<FeatureRecordRepository>) -> Self {
        Self { repo }
    }

    async fn run_blocking<T, F>(&self, job: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&FeatureRecordRepository) -> RepositoryResult<T> + Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        tokio::task::spawn_blocking(move || job(&repo))
            .await
            .map_err(|e| RepositoryError::TaskJoinError(e.to_string()))?
    }
}

#[async_trait]
impl FeatureRecordStore for SqliteFeatureRecordStore {
    async fn load_batch(&self, date: NaiveDate) -> RepositoryResult<Vec<TrainFeatureRecord>> {
        self.run_blocking(move |repo| repo.find_by_date(date)).await
    }

    async fn load_previous_batch(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Option<Vec<TrainFeatureRecord>>> {
        self.run_blocking(move |repo| match repo.latest_date_before(date)? {
            Some(previous_date) => {
                tracing::debug!(%date, %previous_date, "找到昨日批次");
                Ok(Some(repo.find_by_date(previous_date)?))
            }
            None => Ok(None),
        })
        .await
    }

    async fn save_batch(
        &self,
        date: NaiveDate,
        records: Vec<TrainFeatureRecord>,
    ) -> RepositoryResult<usize> {
        self.run_blocking(move |repo| repo.replace_day(date, &records))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn create_test_store() -> SqliteFeatureRecordStore {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = FeatureRecordRepository::new(Arc::new(Mutex::new(conn)));
        SqliteFeatureRecordStore::new(Arc::new(repo))
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_previous_batch_absent() {
        let store = create_test_store();
        assert!(store.load_previous_batch(day(10)).await.unwrap().is_none());
        assert!(store.load_batch(day(10)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_previous() {
        let store = create_test_store();
        store
            .save_batch(day(9), vec![TrainFeatureRecord::new("T1", day(9))])
            .await
            .unwrap();
        store
            .save_batch(day(10), vec![TrainFeatureRecord::new("T1", day(10))])
            .await
            .unwrap();

        let previous = store.load_previous_batch(day(10)).await.unwrap().unwrap();
        assert_eq!(previous.len(), 1);
        assert_eq!(previous[0].date, day(9));
    }
}
