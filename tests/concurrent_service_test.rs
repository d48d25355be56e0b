// ==========================================
// 排程服务并发测试
// ==========================================
// 职责: 验证干预/查询/重排并发执行时排程与日志保持一致
// ==========================================


#[cfg(test)]
mod concurrent_service_test {
    use std::sync::Arc;

    use futures::future::join_all;
    use metro_fleet_aps::api::ScheduleService;
    use metro_fleet_aps::domain::capacity::PlannerParams;
    use metro_fleet_aps::domain::types::{OverrideAction, TrainStatus};
    use metro_fleet_aps::engine::estimator::RuleBasedEstimator;
    use metro_fleet_aps::engine::override_controller::{OverrideOutcome, OverrideRequest};
    use metro_fleet_aps::engine::simulator::DaySimulator;
    use metro_fleet_aps::repository::store::FeatureRecordStore;

    use crate::test_helpers::{create_test_db, create_test_repos, test_day, FixedConfig};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_overrides_keep_schedule_consistent() {
        let (_temp, db_path) = create_test_db().unwrap();
        let (_conn, _feature_repo, log_repo, store) = create_test_repos(&db_path);

        let records = DaySimulator::with_seed(11).simulate_day(test_day(), None);
        store.save_batch(test_day(), records.clone()).await.unwrap();

        let service = Arc::new(ScheduleService::new(
            Arc::new(RuleBasedEstimator::new()),
            store,
            Arc::new(FixedConfig(PlannerParams::default())),
            Some(log_repo.clone()),
            None,
        ));
        service.run_daily_cycle(test_day()).await.unwrap();

        // 每列车一个强制封存 + 若干并发读
        let writers = records.iter().map(|record| {
            let service = service.clone();
            let train_id = record.train_id.clone();
            tokio::spawn(async move {
                service
                    .apply_override(OverrideRequest::new(train_id, OverrideAction::ForceIbl))
                    .await
            })
        });
        let readers = (0..20).map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                let schedule = service.current_schedule().await.unwrap();
                let rankings: Vec<usize> = schedule.trains.iter().map(|t| t.ranking).collect();
                rankings == (1..=schedule.trains.len()).collect::<Vec<_>>()
            })
        });

        let write_results = join_all(writers).await;
        let read_results = join_all(readers).await;

        for result in write_results {
            let outcome = result.unwrap().unwrap();
            assert!(matches!(outcome, OverrideOutcome::Applied(_)));
        }
        for dense in read_results {
            assert!(dense.unwrap(), "读者不应观察到半完成的重排");
        }

        let schedule = service.current_schedule().await.unwrap();
        assert_eq!(schedule.count_status(TrainStatus::Ibl), records.len());
        assert_eq!(service.get_modification_log().await.len(), records.len());
        assert_eq!(log_repo.count().unwrap(), records.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_regeneration_during_overrides_publishes_whole_versions() {
        let (_temp, db_path) = create_test_db().unwrap();
        let (_conn, _feature_repo, _log_repo, store) = create_test_repos(&db_path);

        let records = DaySimulator::with_seed(5).simulate_day(test_day(), None);
        store.save_batch(test_day(), records.clone()).await.unwrap();

        let service = Arc::new(ScheduleService::new(
            Arc::new(RuleBasedEstimator::new()),
            store,
            Arc::new(FixedConfig(PlannerParams::default())),
            None,
            None,
        ));
        service.run_daily_cycle(test_day()).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..10 {
            let service = service.clone();
            let train_id = records[i % records.len()].train_id.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    service.run_daily_cycle(test_day()).await.map(|_| ())
                } else {
                    service
                        .apply_override(OverrideRequest::new(train_id, OverrideAction::ForceStandby))
                        .await
                        .map(|_| ())
                        .or_else(|e| match e {
                            // 目标已是 IBL 时拒绝属预期
                            metro_fleet_aps::api::ApiError::SafetyViolation { .. } => Ok(()),
                            other => Err(other),
                        })
                }
            }));
        }
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let schedule = service.current_schedule().await.unwrap();
        assert_eq!(schedule.fleet_size(), records.len());
        let rankings: Vec<usize> = schedule.trains.iter().map(|t| t.ranking).collect();
        assert_eq!(rankings, (1..=records.len()).collect::<Vec<_>>());
        for entry in service.get_modification_log().await {
            assert_eq!(entry.to_status, TrainStatus::Standby);
        }
    }
}
