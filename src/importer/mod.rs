// ==========================================
// 地铁车队运营排程系统 - 导入导出层
// ==========================================
// 职责: 外部文件 → 每日特征记录;排程 → CSV
// 支持: Excel (.xlsx), CSV
// ==========================================

// 模块声明
pub mod error;
pub mod exporter;
pub mod field_mapper;
pub mod file_parser;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use exporter::ScheduleExporter;
pub use field_mapper::FeatureRecordMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
