// ==========================================
// 地铁车队运营排程系统 - 车队数据 API
// ==========================================
// 职责: 每日批次入库 (文件导入 / 模拟生成)、排程导出
// 红线: 入库前整批校验,任一记录非法即拒绝
// ==========================================

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::schedule::Schedule;
use crate::domain::train::TrainFeatureRecord;
use crate::engine::batch_validator::BatchValidator;
use crate::engine::simulator::DaySimulator;
use crate::importer::{FeatureRecordMapper, ScheduleExporter, UniversalFileParser};
use crate::repository::store::FeatureRecordStore;

pub struct FleetDataApi {
    store: Arc<dyn FeatureRecordStore>,
    validator: BatchValidator,
}

impl FleetDataApi {
    pub fn new(store: Arc<dyn FeatureRecordStore>) -> Self {
        Self {
            store,
            validator: BatchValidator::new(),
        }
    }

    /// 导入 CSV/XLSX 批次
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - date: 批次日期 (行内 date 列优先)
    ///
    /// # 返回
    /// - Ok(count): 入库条数
    #[instrument(skip(self, file_path), fields(path = %file_path.as_ref().display()))]
    pub async fn import_file<P: AsRef<Path>>(&self, file_path: P, date: NaiveDate) -> ApiResult<usize> {
        let rows = UniversalFileParser.parse(file_path.as_ref())?;
        let records = FeatureRecordMapper.map_all(rows, date)?;
        if let Some(other) = records.iter().find(|r| r.date != date) {
            return Err(ApiError::InputError(format!(
                "批次日期不一致: train_id={} date={},期望 {}",
                other.train_id, other.date, date
            )));
        }
        self.save_validated(date, records).await
    }

    /// 基于昨日批次模拟当日数据并入库
    ///
    /// # 参数
    /// - seed: 随机种子 (None 时使用系统熵)
    #[instrument(skip(self))]
    pub async fn simulate_day(
        &self,
        date: NaiveDate,
        fleet_size: usize,
        seed: Option<u64>,
    ) -> ApiResult<Vec<TrainFeatureRecord>> {
        let previous = self.store.load_previous_batch(date).await?;
        let mut simulator = match seed {
            Some(seed) => DaySimulator::with_seed(seed),
            None => DaySimulator::new(),
        }
        .with_fleet_size(fleet_size);

        let records = simulator.simulate_day(date, previous.as_deref());
        self.save_validated(date, records.clone()).await?;
        Ok(records)
    }

    /// 导出排程 CSV
    pub fn export_schedule<P: AsRef<Path>>(&self, schedule: &Schedule, path: P) -> ApiResult<usize> {
        Ok(ScheduleExporter.export_to_file(schedule, path)?)
    }

    async fn save_validated(&self, date: NaiveDate, records: Vec<TrainFeatureRecord>) -> ApiResult<usize> {
        let previous = self.store.load_previous_batch(date).await?;
        self.validator.validate(&records, previous.as_deref())?;
        let count = self.store.save_batch(date, records).await?;
        info!(%date, count, "当日批次已入库");
        Ok(count)
    }
}
