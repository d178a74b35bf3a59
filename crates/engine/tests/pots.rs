mod common;

use api_types::pot::{PotAmount, PotNew, PotUpdate};
use common::{ALICE, BOB, engines, file_engine, memory_engine, sql_engine};
use engine::{Engine, EngineError, ErrorKind};

fn pot(name: &str, target: i64) -> PotNew {
    PotNew {
        name: Some(name.to_string()),
        target: Some(target),
        color_tag: Some("cyan".to_string()),
    }
}

fn amount(cents: i64) -> PotAmount {
    PotAmount {
        amount: Some(cents),
    }
}

#[tokio::test]
async fn new_pots_start_empty() {
    for (backend, engine) in engines().await {
        let holiday = engine.new_pot(&pot("Holiday", 2000), ALICE).await.unwrap();
        assert_eq!(holiday.total_saved, 0, "{backend}");
        assert_eq!(holiday.target, 2000, "{backend}");
        assert_eq!(holiday.color_tag, "cyan", "{backend}");
    }
}

#[tokio::test]
async fn add_then_withdraw_moves_savings() {
    for (backend, engine) in engines().await {
        let holiday = engine.new_pot(&pot("Holiday", 2000), ALICE).await.unwrap();

        let after_add = engine.add_to_pot(holiday.id, &amount(150), ALICE).await.unwrap();
        assert_eq!(after_add.total_saved, 150, "{backend}");

        let after_withdraw = engine
            .withdraw_from_pot(holiday.id, &amount(150), ALICE)
            .await
            .unwrap();
        assert_eq!(after_withdraw.total_saved, 0, "{backend}");
        assert_eq!(after_withdraw.target, 2000, "{backend}");
    }
}

#[tokio::test]
async fn overdraw_is_rejected_and_balance_kept() {
    for (backend, engine) in engines().await {
        let holiday = engine.new_pot(&pot("Holiday", 2000), ALICE).await.unwrap();
        engine.add_to_pot(holiday.id, &amount(50), ALICE).await.unwrap();

        let err = engine
            .withdraw_from_pot(holiday.id, &amount(100), ALICE)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientFunds(_)), "{backend}: {err}");
        assert_eq!(err.kind(), ErrorKind::DomainRule);

        let holiday = engine.pot(holiday.id, ALICE).await.unwrap();
        assert_eq!(holiday.total_saved, 50, "{backend}");
    }
}

#[tokio::test]
async fn amounts_must_be_positive() {
    for (backend, engine) in engines().await {
        let holiday = engine.new_pot(&pot("Holiday", 2000), ALICE).await.unwrap();
        for bad in [amount(0), amount(-5), PotAmount { amount: None }] {
            let err = engine.add_to_pot(holiday.id, &bad, ALICE).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{backend}");
            let err = engine
                .withdraw_from_pot(holiday.id, &bad, ALICE)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{backend}");
        }
    }
}

#[tokio::test]
async fn oversized_deposit_is_rejected() {
    for (backend, engine) in engines().await {
        let holiday = engine.new_pot(&pot("Holiday", 2000), ALICE).await.unwrap();
        engine.add_to_pot(holiday.id, &amount(10), ALICE).await.unwrap();

        let err = engine
            .add_to_pot(holiday.id, &amount(i64::MAX), ALICE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{backend}");
        assert_eq!(engine.pot(holiday.id, ALICE).await.unwrap().total_saved, 10);
    }
}

#[tokio::test]
async fn other_users_cannot_move_savings() {
    for (backend, engine) in engines().await {
        let holiday = engine.new_pot(&pot("Holiday", 2000), ALICE).await.unwrap();
        engine.add_to_pot(holiday.id, &amount(50), ALICE).await.unwrap();

        let err = engine.add_to_pot(holiday.id, &amount(5), BOB).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{backend}");
        let err = engine
            .withdraw_from_pot(holiday.id, &amount(5), BOB)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{backend}");
        assert_eq!(engine.pot(holiday.id, ALICE).await.unwrap().total_saved, 50);
    }
}

#[tokio::test]
async fn updates_keep_savings() {
    for (backend, engine) in engines().await {
        let holiday = engine.new_pot(&pot("Holiday", 2000), ALICE).await.unwrap();
        engine.add_to_pot(holiday.id, &amount(75), ALICE).await.unwrap();

        let update = PotUpdate {
            target: Some(5000),
            ..PotUpdate::default()
        };
        let holiday = engine.update_pot(holiday.id, &update, ALICE).await.unwrap();
        assert_eq!(holiday.target, 5000, "{backend}");
        assert_eq!(holiday.total_saved, 75, "{backend}");
    }
}

/// Fires `attempts` concurrent withdrawals of `each` and returns how many
/// succeeded and the final balance.
async fn race_withdrawals(engine: Engine, start: i64, each: i64, attempts: usize) -> (usize, i64) {
    let holiday = engine.new_pot(&pot("Holiday", 2000), ALICE).await.unwrap();
    engine.add_to_pot(holiday.id, &amount(start), ALICE).await.unwrap();

    let handles: Vec<_> = (0..attempts)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .withdraw_from_pot(holiday.id, &amount(each), ALICE)
                    .await
            })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(pot) => {
                assert!(pot.total_saved >= 0);
                succeeded += 1;
            }
            Err(err) => assert!(matches!(err, EngineError::InsufficientFunds(_)), "{err}"),
        }
    }
    let total = engine.pot(holiday.id, ALICE).await.unwrap().total_saved;
    (succeeded, total)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw_in_memory() {
    let (succeeded, total) = race_withdrawals(memory_engine().await, 100, 30, 10).await;
    assert_eq!(succeeded, 3);
    assert_eq!(total, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw_in_sqlite() {
    let (succeeded, total) = race_withdrawals(sql_engine().await, 100, 30, 10).await;
    assert_eq!(succeeded, 3);
    assert_eq!(total, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_overdraw_on_file_db() {
    let (engine, path) = file_engine().await;
    let (succeeded, total) = race_withdrawals(engine, 100, 30, 10).await;
    assert_eq!(succeeded, 3);
    assert_eq!(total, 10);
    let _ = std::fs::remove_file(path);
}

async fn race_creates(engine: Engine, attempts: usize) -> (usize, u64) {
    let handles: Vec<_> = (0..attempts)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.new_pot(&pot("Holiday", 2000), ALICE).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(err) => assert!(matches!(err, EngineError::ExistingKey(_)), "{err}"),
        }
    }
    let stored = engine
        .list_pots(Default::default(), ALICE)
        .await
        .unwrap()
        .meta
        .pagination
        .total_items
        .unwrap_or_default();
    (created, stored)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_keep_names_unique_in_memory() {
    assert_eq!(race_creates(memory_engine().await, 16).await, (1, 1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_keep_names_unique_on_file_db() {
    let (engine, path) = file_engine().await;
    assert_eq!(race_creates(engine, 16).await, (1, 1));
    let _ = std::fs::remove_file(path);
}
