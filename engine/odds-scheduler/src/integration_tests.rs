//! End-to-end tests of the scheduler and orchestrator against real stores

use std::sync::Arc;
use std::time::{Duration, Instant};

use odds_providers::NormalizedGame;
use odds_store::{InMemoryStore, OddsStore, SqliteStore, StoreConfig};
use tempfile::TempDir;

use crate::testing::{moneyline_game, orchestrator, MockProvider};
use crate::{OrchestratorError, ScheduleConfig, ScheduleEntry, Scheduler, SchedulerError, TaskKey, TaskState};

fn entry(sport: &str, provider: &str, interval: Duration) -> ScheduleEntry {
    ScheduleEntry::new(sport, provider, interval)
}

mod orchestrator_tests {
    use super::*;

    #[tokio::test]
    async fn test_two_providers_same_game_one_row_two_odds() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let a = Arc::new(MockProvider::returning("A", &["NFL"], vec![moneyline_game("NFL", "g1", "Home", "Away", 1.5)]));
        let b = Arc::new(MockProvider::returning("B", &["NFL"], vec![moneyline_game("NFL", "g1", "Home", "Away", 1.55)]));
        let orchestrator = orchestrator(&[a, b], store.clone());

        let summary = orchestrator.run_sport("NFL").await;

        assert_eq!(summary.providers_ok, 2);
        assert_eq!(summary.games_fetched, 2);
        assert_eq!(summary.odds_persisted, 2);
        assert_eq!(summary.duplicates_dropped, 0);

        let games = store.list_games(Some("NFL")).await.unwrap();
        assert_eq!(games.len(), 1);

        let mut providers: Vec<String> =
            store.odds_for_game(games[0].id).await.unwrap().into_iter().map(|o| o.provider).collect();
        providers.sort();
        assert_eq!(providers, vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn test_team_casing_last_write_wins() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let a = Arc::new(MockProvider::returning(
            "A",
            &["NFL"],
            vec![moneyline_game("NFL", "g1", "kansas city chiefs", "buffalo bills", 1.8)],
        ));
        let b = Arc::new(MockProvider::returning(
            "B",
            &["NFL"],
            vec![moneyline_game("NFL", "g1", "Kansas City Chiefs", "Buffalo Bills", 1.85)],
        ));
        let orchestrator = orchestrator(&[a, b], store.clone());

        orchestrator.run("NFL", "A").await.unwrap();
        orchestrator.run("NFL", "B").await.unwrap();

        let games = store.list_games(None).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].home_team, "Kansas City Chiefs");
        assert_eq!(games[0].away_team, "Buffalo Bills");
        assert_eq!(store.stats().await.unwrap().odds, 2);
    }

    #[tokio::test]
    async fn test_duplicate_quote_in_one_fetch_is_dropped() {
        let store = Arc::new(InMemoryStore::new());
        let game = NormalizedGame::new("NBA", "g7", "Celtics", "Knicks")
            .with_quote("Moneyline", "Home", 1.4)
            .with_quote("Moneyline", "Home", 1.41)
            .with_quote("Moneyline", "Away", 3.1);
        let a = Arc::new(MockProvider::returning("A", &["NBA"], vec![game]));
        let orchestrator = orchestrator(&[a], store.clone());

        let summary = orchestrator.run("NBA", "A").await.unwrap();

        assert_eq!(summary.duplicates_dropped, 1);
        assert_eq!(summary.odds_persisted, 2);

        let games = store.list_games(Some("NBA")).await.unwrap();
        let odds = store.odds_for_game(games[0].id).await.unwrap();
        assert_eq!(odds.len(), 2);
        // The first quote for a key is the one kept
        assert_eq!(odds[0].odds, 1.4);
    }

    #[tokio::test]
    async fn test_failing_and_panicking_providers_are_empty_results() {
        let store = Arc::new(InMemoryStore::new());
        let good = Arc::new(MockProvider::returning("good", &["NFL"], vec![moneyline_game("NFL", "g1", "H", "A", 2.0)]));
        let failing = Arc::new(MockProvider::failing("failing", &["NFL"]));
        let panicking = Arc::new(MockProvider::panicking("panicking", &["NFL"]));
        let orchestrator = orchestrator(&[good, failing, panicking], store.clone());

        let summary = orchestrator.run_sport("NFL").await;

        assert_eq!(summary.providers_ok, 1);
        assert_eq!(summary.providers_failed, 2);
        assert_eq!(summary.games_persisted, 1);
        assert_eq!(summary.odds_persisted, 1);
        assert!(summary.errors.iter().any(|e| e.starts_with("panicking: panicked")));
        assert!(summary.errors.iter().any(|e| e.starts_with("failing: ")));
        assert_eq!(store.stats().await.unwrap().games, 1);
    }

    #[tokio::test]
    async fn test_invalid_game_skips_its_odds_only() {
        let store = Arc::new(InMemoryStore::new());
        let a = Arc::new(MockProvider::returning(
            "A",
            &["NFL"],
            vec![moneyline_game("NFL", "", "H", "A", 2.0), moneyline_game("NFL", "g2", "H", "A", 1.9)],
        ));
        let orchestrator = orchestrator(&[a], store.clone());

        let summary = orchestrator.run("NFL", "A").await.unwrap();

        assert_eq!(summary.games_failed, 1);
        assert_eq!(summary.games_persisted, 1);
        assert_eq!(summary.odds_persisted, 1);
        assert!(!summary.is_success());
    }

    #[tokio::test]
    async fn test_unknown_provider_and_unsupported_sport() {
        let store = Arc::new(InMemoryStore::new());
        let a = Arc::new(MockProvider::returning("A", &["NFL"], Vec::new()));
        let orchestrator = orchestrator(&[a.clone()], store);

        assert_eq!(orchestrator.run("NFL", "Z").await, Err(OrchestratorError::UnknownProvider("Z".to_string())));
        assert_eq!(
            orchestrator.run("NBA", "A").await,
            Err(OrchestratorError::UnsupportedSport { sport: "NBA".to_string(), provider: "A".to_string() })
        );
        assert_eq!(a.calls(), 0);

        let summary = orchestrator.run_sport("MLB").await;
        assert_eq!(summary.providers_ok + summary.providers_failed, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_runs_for_two_sports() {
        const RUNS: usize = 100;

        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let games = vec![
            moneyline_game("NFL", "nfl1", "H", "A", 1.9).with_quote("Total", "Over (44.5)", 1.91),
            moneyline_game("NFL", "nfl2", "H", "A", 2.1),
            moneyline_game("NBA", "nba1", "H", "A", 1.7),
        ];
        let a = Arc::new(MockProvider::returning("A", &["NFL", "NBA"], games.clone()));
        let b = Arc::new(MockProvider::returning("B", &["NFL", "NBA"], games));
        let orchestrator = orchestrator(&[a, b], store.clone());

        // Per run: NFL = 2 providers x 3 quotes, NBA = 2 providers x 1 quote
        let mut handles = Vec::new();
        for _ in 0..RUNS {
            for sport in ["NFL", "NBA"] {
                let orchestrator = Arc::clone(&orchestrator);
                handles.push(tokio::spawn(async move { orchestrator.run_sport(sport).await }));
            }
        }

        let mut odds_persisted = 0;
        for handle in handles {
            let summary = tokio::time::timeout(Duration::from_secs(30), handle).await.unwrap().unwrap();
            assert!(summary.is_success());
            odds_persisted += summary.odds_persisted;
        }

        let stats = store.stats().await.unwrap();
        assert_eq!(odds_persisted, RUNS * (6 + 2));
        assert_eq!(stats.odds as usize, odds_persisted);
        assert_eq!(stats.games, 3);
    }
}

mod scheduler_tests {
    use super::*;

    #[tokio::test]
    async fn test_first_tick_fires_immediately() {
        let store = Arc::new(InMemoryStore::new());
        let a = Arc::new(MockProvider::returning("A", &["NFL"], vec![moneyline_game("NFL", "g1", "H", "A", 1.5)]));
        let orchestrator = orchestrator(&[a.clone()], store.clone());

        let handle = Scheduler::start(orchestrator, vec![entry("NFL", "A", Duration::from_secs(3600))]).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(a.calls(), 1);
        let status = handle.status().get(&TaskKey::new("NFL", "A")).unwrap();
        assert_eq!(status.state, TaskState::Sleeping);
        assert_eq!(status.successes, 1);
        assert_eq!(status.last_odds, 1);

        let report = handle.stop(Duration::from_secs(1)).await;
        assert!(report.is_clean());
        assert_eq!(report.stopped, vec![TaskKey::new("NFL", "A")]);
    }

    #[tokio::test]
    async fn test_example_schedule_one_game_two_odds() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let a = Arc::new(MockProvider::returning("A", &["NFL"], vec![moneyline_game("NFL", "g1", "Home", "Away", 1.5)]));
        let b = Arc::new(MockProvider::returning(
            "B",
            &["NFL"],
            vec![NormalizedGame::new("NFL", "g1", "Home", "Away").with_quote("Moneyline", "Away", 2.5)],
        ));
        let orchestrator = orchestrator(&[a, b], store.clone());

        let config = ScheduleConfig::empty().with_interval("NFL", "A", 5).with_interval("NFL", "B", 5);
        let handle = Scheduler::start_from_config(orchestrator, &config).unwrap();
        assert_eq!(handle.task_count(), 2);

        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.stop(Duration::from_secs(1)).await;

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.games, 1);
        assert_eq!(stats.odds, 2);

        let games = store.list_games(Some("NFL")).await.unwrap();
        assert_eq!(games[0].external_id, "g1");
        let mut odds = store.odds_for_game(games[0].id).await.unwrap();
        odds.sort_by(|x, y| x.provider.cmp(&y.provider));
        assert_eq!(odds.len(), 2);
        assert!(odds.iter().all(|o| o.game_id == games[0].id));
        assert_eq!((odds[0].provider.as_str(), odds[0].selection.as_str(), odds[0].odds), ("A", "Home", 1.5));
        assert_eq!((odds[1].provider.as_str(), odds[1].selection.as_str(), odds[1].odds), ("B", "Away", 2.5));
    }

    #[tokio::test]
    async fn test_failing_provider_never_stops_other_loops() {
        let store = Arc::new(InMemoryStore::new());
        let good = Arc::new(MockProvider::returning(
            "good",
            &["NFL", "NBA"],
            vec![moneyline_game("NFL", "g1", "H", "A", 1.5), moneyline_game("NBA", "g2", "H", "A", 1.5)],
        ));
        let failing = Arc::new(MockProvider::failing("failing", &["NFL"]));
        let panicking = Arc::new(MockProvider::panicking("panicking", &["NBA"]));
        let orchestrator = orchestrator(&[good.clone(), failing.clone(), panicking.clone()], store);

        let interval = Duration::from_millis(20);
        let handle = Scheduler::start(
            orchestrator,
            vec![
                entry("NFL", "good", interval),
                entry("NFL", "failing", interval),
                entry("NBA", "good", interval),
                entry("NBA", "panicking", interval),
            ],
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        let board = handle.status();
        let report = handle.stop(Duration::from_secs(1)).await;
        assert!(report.is_clean());
        assert_eq!(report.stopped.len(), 4);

        // Both sports keep ticking and the failing loops keep retrying
        assert!(good.calls() >= 6, "good provider called {} times", good.calls());
        assert!(failing.calls() >= 3);
        assert!(panicking.calls() >= 3);

        let failing_status = board.get(&TaskKey::new("NFL", "failing")).unwrap();
        assert_eq!(failing_status.successes, 0);
        assert_eq!(failing_status.failures, failing_status.consecutive_failures);
        assert!(failing_status.last_error.unwrap().contains("503"));

        let panicking_status = board.get(&TaskKey::new("NBA", "panicking")).unwrap();
        assert!(panicking_status.last_error.unwrap().contains("panicked"));

        let good_status = board.get(&TaskKey::new("NBA", "good")).unwrap();
        assert_eq!(good_status.failures, 0);
        assert_eq!(good_status.state, TaskState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_mid_fetch_waits_for_tick_then_no_more_ticks() {
        let store = Arc::new(InMemoryStore::new());
        let fetch_time = Duration::from_millis(300);
        let slow = Arc::new(
            MockProvider::returning("slow", &["NFL"], vec![moneyline_game("NFL", "g1", "H", "A", 1.5)])
                .with_delay(fetch_time),
        );
        let orchestrator = orchestrator(&[slow.clone()], store.clone());

        let handle = Scheduler::start(orchestrator, vec![entry("NFL", "slow", Duration::from_millis(10))]).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(slow.calls(), 1);

        let timeout = Duration::from_secs(2);
        let started = Instant::now();
        let report = handle.stop(timeout).await;
        assert!(started.elapsed() < timeout + fetch_time);
        assert!(report.is_clean());

        // The in-flight tick completed and was persisted
        assert_eq!(store.stats().await.unwrap().odds, 1);

        let calls_at_stop = slow.calls();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(slow.calls(), calls_at_stop);
    }

    #[tokio::test]
    async fn test_stop_abandons_tasks_past_the_deadline() {
        let store = Arc::new(InMemoryStore::new());
        let stuck = Arc::new(MockProvider::returning("stuck", &["NFL"], Vec::new()).with_delay(Duration::from_secs(5)));
        let quick = Arc::new(MockProvider::returning("quick", &["NBA"], Vec::new()));
        let orchestrator = orchestrator(&[stuck, quick], store);

        let handle = Scheduler::start(
            orchestrator,
            vec![entry("NFL", "stuck", Duration::from_secs(1)), entry("NBA", "quick", Duration::from_secs(1))],
        )
        .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = Instant::now();
        let report = handle.stop(Duration::from_millis(100)).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(report.abandoned, vec![TaskKey::new("NFL", "stuck")]);
        assert_eq!(report.stopped, vec![TaskKey::new("NBA", "quick")]);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_invalid_schedule_starts_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let a = Arc::new(MockProvider::returning("A", &["NFL"], Vec::new()));
        let orchestrator = orchestrator(&[a.clone()], store);

        let result = Scheduler::start(
            orchestrator.clone(),
            vec![entry("NFL", "A", Duration::from_secs(1)), entry("NFL", "missing", Duration::from_secs(1))],
        );
        assert!(matches!(result, Err(SchedulerError::UnknownProvider(_))));

        let result = Scheduler::start(orchestrator, Vec::new());
        assert!(matches!(result, Err(SchedulerError::EmptySchedule)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_scheduler_against_file_database() {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", temp_dir.path().join("odds.db").display());
        let store = SqliteStore::connect(StoreConfig::new(url)).await.unwrap();
        store.initialize().await.unwrap();
        let store = Arc::new(store);

        let a = Arc::new(MockProvider::returning("A", &["NFL"], vec![moneyline_game("NFL", "g1", "H", "A", 1.5)]));
        let b = Arc::new(MockProvider::returning("B", &["NBA"], vec![moneyline_game("NBA", "g1", "H", "A", 1.5)]));
        let orchestrator = orchestrator(&[a.clone(), b.clone()], store.clone());

        let interval = Duration::from_millis(25);
        let handle =
            Scheduler::start(orchestrator, vec![entry("NFL", "A", interval), entry("NBA", "B", interval)]).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        let report = handle.stop(Duration::from_secs(2)).await;
        assert!(report.is_clean());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.games, 2);
        assert_eq!(stats.odds as usize, a.calls() + b.calls());
    }
}
