// ==========================================
// 地铁车队运营排程系统 - 命令行主入口
// ==========================================
// 用法:
//   metro-fleet-aps simulate [日期]
//   metro-fleet-aps import <文件> [日期]
//   metro-fleet-aps schedule [日期]
//   metro-fleet-aps export <文件> [日期]
//   metro-fleet-aps report [日期]
//   metro-fleet-aps override <列车> <动作> [日期] [--ack] [--reason 文本]
//   metro-fleet-aps whatif <场景JSON> [日期]
// 环境变量: METRO_FLEET_APS_DB_PATH 指定数据库路径
// ==========================================

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;

use metro_fleet_aps::app::{get_default_db_path, AppState};
use metro_fleet_aps::domain::schedule::Schedule;
use metro_fleet_aps::domain::train::ScheduledTrain;
use metro_fleet_aps::domain::types::{OverrideAction, TrainStatus};
use metro_fleet_aps::engine::override_controller::{OverrideOutcome, OverrideRequest};
use metro_fleet_aps::engine::simulator::DEFAULT_FLEET_SIZE;
use metro_fleet_aps::engine::what_if::WhatIfScenario;
use metro_fleet_aps::logging;

const USAGE: &str = "用法: metro-fleet-aps <simulate|import|schedule|export|report|override|whatif> [参数...]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        bail!(USAGE);
    };
    let rest = &args[1..];

    tracing::info!("==================================================");
    tracing::info!("{} v{}", metro_fleet_aps::APP_NAME, metro_fleet_aps::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command {
        "simulate" => {
            let date = date_arg(rest.first())?;
            let records = state
                .fleet_data_api
                .simulate_day(date, DEFAULT_FLEET_SIZE, None)
                .await?;
            println!("{} 已生成 {} 条模拟记录", date, records.len());
        }
        "import" => {
            let file = rest.first().ok_or_else(|| anyhow!("缺少文件参数\n{}", USAGE))?;
            let date = date_arg(rest.get(1))?;
            let count = state.fleet_data_api.import_file(file, date).await?;
            println!("{} 已导入 {} 条记录", date, count);
        }
        "schedule" => {
            let date = date_arg(rest.first())?;
            let schedule = state.schedule_service.run_daily_cycle(date).await?;
            print_schedule(&schedule);
        }
        "export" => {
            let file = rest.first().ok_or_else(|| anyhow!("缺少文件参数\n{}", USAGE))?;
            let date = date_arg(rest.get(1))?;
            let schedule = state.schedule_service.run_daily_cycle(date).await?;
            let rows = state.fleet_data_api.export_schedule(&schedule, file)?;
            println!("已导出 {} 行至 {}", rows, file);
        }
        "report" => {
            let date = date_arg(rest.first())?;
            state.schedule_service.run_daily_cycle(date).await?;
            let report = state.schedule_service.fleet_report().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "override" => {
            let train_id = rest.first().ok_or_else(|| anyhow!("缺少列车参数\n{}", USAGE))?;
            let action_text = rest.get(1).ok_or_else(|| anyhow!("缺少动作参数\n{}", USAGE))?;
            let action = OverrideAction::from_str(action_text)
                .ok_or_else(|| anyhow!("未知动作: {}", action_text))?;
            let date = date_arg(rest.get(2).filter(|s| !s.starts_with("--")))?;

            let mut request = OverrideRequest::new(train_id.clone(), action);
            if rest.iter().any(|s| s == "--ack") {
                request = request.acknowledged();
            }
            if let Some(pos) = rest.iter().position(|s| s == "--reason") {
                let reason = rest.get(pos + 1).ok_or_else(|| anyhow!("--reason 缺少文本"))?;
                request = request.with_reason(reason.clone());
            }

            state.schedule_service.run_daily_cycle(date).await?;
            let outcome = state.schedule_service.apply_override(request).await?;
            if let OverrideOutcome::Applied(applied) = &outcome {
                print_trains(&applied.trains);
            }
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        "whatif" => {
            let json = rest.first().ok_or_else(|| anyhow!("缺少场景参数\n{}", USAGE))?;
            let scenario: WhatIfScenario =
                serde_json::from_str(json).with_context(|| format!("无法解析场景: {}", json))?;
            let date = date_arg(rest.get(1))?;
            state.schedule_service.run_daily_cycle(date).await?;
            let outcome = state.schedule_service.what_if(scenario).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}

/// 解析日期参数,缺省为今天
fn date_arg(arg: Option<&String>) -> anyhow::Result<NaiveDate> {
    match arg {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .with_context(|| format!("日期格式错误 (应为 YYYY-MM-DD): {}", text)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn print_schedule(schedule: &Schedule) {
    let j = &schedule.justification;
    println!(
        "排程 {} 版本 {} | 运营 {} / 备用 {} / 检修 {} | 最低运营需求 {} | 预计收入 {:.0}",
        schedule.date,
        schedule.version,
        schedule.count_status(TrainStatus::Service),
        schedule.count_status(TrainStatus::Standby),
        schedule.count_status(TrainStatus::Ibl),
        j.min_service_trains,
        j.expected_revenue
    );
    println!("{}", j.note);
    print_trains(&schedule.trains);
}

fn print_trains(trains: &[ScheduledTrain]) {
    println!(
        "{:>4}  {:<10} {:<8} {:<8} {:>6}  {}",
        "排名", "列车", "状态", "预测", "风险", "干预"
    );
    for train in trains {
        println!(
            "{:>4}  {:<10} {:<8} {:<8} {:>6.3}  {}",
            train.ranking,
            train.train_id(),
            train.final_status.to_string(),
            train.prediction.predicted_status.to_string(),
            train.failure_risk(),
            train.manual_override_reason.as_deref().unwrap_or("")
        );
    }
}
