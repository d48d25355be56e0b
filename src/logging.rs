// ==========================================
// 地铁车队运营排程系统 - 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认日志级别
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// 日志格式环境变量 (text / json)
pub const LOG_FORMAT_ENV: &str = "METRO_FLEET_APS_LOG_FORMAT";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=metro_fleet_aps::engine=trace
/// - METRO_FLEET_APS_LOG_FORMAT: 设为 json 时输出 JSON 行
///
/// # 示例
/// ```no_run
/// use metro_fleet_aps::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_default(DEFAULT_LOG_LEVEL);
}

/// 初始化日志系统,RUST_LOG 未设置时使用给定级别
///
/// 日志写入 stderr,stdout 保留给命令输出 (排程表/JSON 报表)
pub fn init_with_default(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let _ = if json_requested() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// LOG_FORMAT_ENV=json 时输出结构化 JSON 日志
fn json_requested() -> bool {
    std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
