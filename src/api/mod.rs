// ==========================================
// 地铁车队运营排程系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行/HTTP 等传输层调用
// ==========================================

pub mod error;
pub mod fleet_data_api;
pub mod schedule_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use fleet_data_api::FleetDataApi;
pub use schedule_api::ScheduleService;
