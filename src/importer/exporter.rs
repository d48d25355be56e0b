// ==========================================
// 地铁车队运营排程系统 - 排程导出
// ==========================================
// 职责: 排程 → CSV (按排名顺序)
// ==========================================

use crate::domain::schedule::Schedule;
use crate::importer::error::{ImportError, ImportResult};
use csv::Writer;
use std::io::Write;
use std::path::Path;

pub const EXPORT_HEADERS: [&str; 7] = [
    "ranking",
    "train_id",
    "final_status",
    "predicted_status",
    "predicted_failure_risk",
    "manual_override_flag",
    "manual_override_reason",
];

pub struct ScheduleExporter;

impl ScheduleExporter {
    /// 写入任意 Writer
    ///
    /// # 返回
    /// - 写出的数据行数
    pub fn write_csv<W: Write>(&self, schedule: &Schedule, writer: W) -> ImportResult<usize> {
        let mut csv_writer = Writer::from_writer(writer);
        csv_writer.write_record(EXPORT_HEADERS)?;

        let mut trains: Vec<_> = schedule.trains.iter().collect();
        trains.sort_by_key(|t| t.ranking);

        for train in &trains {
            csv_writer.write_record([
                train.ranking.to_string(),
                train.train_id().to_string(),
                train.final_status.as_str().to_string(),
                train.prediction.predicted_status.as_str().to_string(),
                format!("{:.4}", train.prediction.predicted_failure_risk),
                u8::from(train.manual_override_flag()).to_string(),
                train.manual_override_reason.clone().unwrap_or_default(),
            ])?;
        }

        csv_writer
            .flush()
            .map_err(|e| ImportError::FileWriteError(e.to_string()))?;
        Ok(trains.len())
    }

    /// 导出到文件
    pub fn export_to_file<P: AsRef<Path>>(&self, schedule: &Schedule, path: P) -> ImportResult<usize> {
        let file = std::fs::File::create(path.as_ref())
            .map_err(|e| ImportError::FileWriteError(e.to_string()))?;
        let rows = self.write_csv(schedule, file)?;
        tracing::info!(path = %path.as_ref().display(), rows, "排程已导出");
        Ok(rows)
    }
}
