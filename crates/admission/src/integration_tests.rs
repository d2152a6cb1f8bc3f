//! Integration tests for the full admission protocol.
//!
//! Everything runs against the in-memory store, which honors the same
//! atomicity contract as the networked adapter.
//!
//! Verifies:
//! - Admitted participants never exceed initialized stock, under any
//!   interleaving
//! - Each admission decrements stock exactly once
//! - Administrative lifecycle (initialize, reset) behaves end to end

use std::sync::Arc;

use flashgate_core::{ProductId, UserId};
use flashgate_store::InMemoryAtomicStore;

use crate::coordinator::ParticipationCoordinator;
use crate::outcome::ParticipationOutcome;
use crate::schedule::SaleSchedule;

fn product(id: &str) -> ProductId {
    ProductId::new(id).unwrap()
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

/// Drive one attempt to a terminal outcome, retrying lock denials the way a
/// real caller would ("try again shortly" is the caller's retry policy, the
/// core never retries on its own).
async fn participate_until_terminal(
    coordinator: &ParticipationCoordinator<InMemoryAtomicStore>,
    user: &UserId,
    product: &ProductId,
) -> ParticipationOutcome {
    loop {
        match coordinator.participate(user, product).await.unwrap() {
            ParticipationOutcome::LockDenied => tokio::task::yield_now().await,
            terminal => return terminal,
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn oversubscribed_sale_admits_exactly_the_initialized_quantity() {
    flashgate_observability::init();

    const QUANTITY: u32 = 5;
    const CALLERS: usize = 20;

    let coordinator = ParticipationCoordinator::new(Arc::new(InMemoryAtomicStore::new()));
    let p = product("p1");
    coordinator.initialize_stock(&p, QUANTITY).await.unwrap();

    let mut handles = Vec::with_capacity(CALLERS);
    for i in 0..CALLERS {
        let coordinator = coordinator.clone();
        let p = p.clone();
        let u = user(&format!("u{i}"));
        handles.push(tokio::spawn(async move {
            participate_until_terminal(&coordinator, &u, &p).await
        }));
    }

    let mut admitted = 0u32;
    let mut sold_out = 0usize;
    for handle in handles {
        match handle.await.unwrap() {
            ParticipationOutcome::Admitted { remaining } => {
                admitted += 1;
                assert!((0..QUANTITY as i64).contains(&remaining));
            }
            ParticipationOutcome::SoldOut => sold_out += 1,
            other => panic!("unexpected terminal outcome: {other:?}"),
        }
    }

    assert_eq!(admitted, QUANTITY);
    assert_eq!(sold_out, CALLERS - QUANTITY as usize);
    assert_eq!(coordinator.participants_count(&p).await.unwrap(), QUANTITY as u64);
    assert_eq!(coordinator.available_stock(&p).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_duplicate_attempts_admit_a_user_at_most_once() {
    let coordinator = ParticipationCoordinator::new(Arc::new(InMemoryAtomicStore::new()));
    let p = product("p1");
    coordinator.initialize_stock(&p, 10).await.unwrap();

    // The same user hammering participate from many tasks at once: the
    // membership fast path alone cannot stop this, the lock must.
    let mut handles = Vec::new();
    for _ in 0..12 {
        let coordinator = coordinator.clone();
        let p = p.clone();
        let u = user("u1");
        handles.push(tokio::spawn(async move {
            participate_until_terminal(&coordinator, &u, &p).await
        }));
    }

    let mut admissions = 0;
    for handle in handles {
        if handle.await.unwrap().admitted() {
            admissions += 1;
        }
    }

    assert_eq!(admissions, 1);
    assert_eq!(coordinator.participants_count(&p).await.unwrap(), 1);
    assert_eq!(coordinator.available_stock(&p).await.unwrap(), 9);
}

#[tokio::test]
async fn admissions_account_for_stock_exactly() {
    let coordinator = ParticipationCoordinator::new(Arc::new(InMemoryAtomicStore::new()));
    let p = product("p1");
    coordinator.initialize_stock(&p, 7).await.unwrap();

    let mut admitted = 0i64;
    for i in 0..4 {
        if coordinator
            .participate(&user(&format!("u{i}")), &p)
            .await
            .unwrap()
            .admitted()
        {
            admitted += 1;
        }
    }

    // Sum of admitted participants equals initial quantity minus final
    // stock: exactly one decrement per admission.
    let final_stock = coordinator.available_stock(&p).await.unwrap();
    assert_eq!(admitted, 7 - final_stock);
    assert_eq!(coordinator.participants_count(&p).await.unwrap() as i64, admitted);
}

#[tokio::test]
async fn products_are_fully_independent() {
    let coordinator = ParticipationCoordinator::new(Arc::new(InMemoryAtomicStore::new()));
    let p1 = product("p1");
    let p2 = product("p2");
    coordinator.initialize_stock(&p1, 1).await.unwrap();
    coordinator.initialize_stock(&p2, 1).await.unwrap();

    assert!(coordinator.participate(&user("u1"), &p1).await.unwrap().admitted());
    // Same user, different product: a separate sale entirely.
    assert!(coordinator.participate(&user("u1"), &p2).await.unwrap().admitted());

    coordinator.reset_flash_sale(&p1).await.unwrap();
    assert_eq!(coordinator.available_stock(&p1).await.unwrap(), 0);
    assert_eq!(coordinator.participants_count(&p1).await.unwrap(), 0);
    // p2 untouched by p1's reset.
    assert_eq!(coordinator.participants_count(&p2).await.unwrap(), 1);
}

#[tokio::test]
async fn full_administrative_lifecycle() {
    let store = Arc::new(InMemoryAtomicStore::new());
    let coordinator = ParticipationCoordinator::new(store.clone());
    let schedule = SaleSchedule::new(store);
    let p = product("drop-42");

    let at = chrono::DateTime::parse_from_rfc3339("2026-09-01T10:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    schedule.set_start_time(at).await.unwrap();
    coordinator.initialize_stock(&p, 2).await.unwrap();

    assert_eq!(schedule.start_time().await.unwrap(), at);
    assert_eq!(coordinator.available_stock(&p).await.unwrap(), 2);

    assert!(coordinator.participate(&user("u1"), &p).await.unwrap().admitted());
    assert!(coordinator.participate(&user("u2"), &p).await.unwrap().admitted());
    assert_eq!(
        coordinator.participate(&user("u3"), &p).await.unwrap(),
        ParticipationOutcome::SoldOut
    );

    coordinator.reset_flash_sale(&p).await.unwrap();
    assert_eq!(coordinator.available_stock(&p).await.unwrap(), 0);
    assert_eq!(coordinator.participants_count(&p).await.unwrap(), 0);
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: for any quantity Q and any number N of distinct
        /// first-time users, exactly min(N, Q) are admitted, the participant
        /// count never exceeds Q, and stock accounts for every admission.
        #[test]
        fn admissions_never_exceed_quantity(
            quantity in 0u32..16,
            callers in 1usize..32,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async move {
                let coordinator =
                    ParticipationCoordinator::new(Arc::new(InMemoryAtomicStore::new()));
                let p = product("p1");
                coordinator.initialize_stock(&p, quantity).await.unwrap();

                let mut admitted = 0u32;
                for i in 0..callers {
                    let outcome = coordinator
                        .participate(&user(&format!("u{i}")), &p)
                        .await
                        .unwrap();
                    if outcome.admitted() {
                        admitted += 1;
                    }
                }

                let expected = quantity.min(callers as u32);
                assert_eq!(admitted, expected);

                let count = coordinator.participants_count(&p).await.unwrap();
                assert!(count <= quantity as u64);

                let stock = coordinator.available_stock(&p).await.unwrap();
                assert_eq!(stock, quantity as i64 - admitted as i64);
            });
        }
    }
}
