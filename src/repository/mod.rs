// ==========================================
// 地铁车队运营排程系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod feature_record_repo;
pub mod modification_log_repo;
pub mod store;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use feature_record_repo::FeatureRecordRepository;
pub use modification_log_repo::ModificationLogRepository;
pub use store::{FeatureRecordStore, SqliteFeatureRecordStore};
