use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use docgate_access::{AccessEvaluator, DocumentMetadata, NewAccessRule, RuleStore, TargetType};
use docgate_auth::{NewUser, Role};
use docgate_core::UserId;
use docgate_infra::rule_store::InMemoryRuleStore;
use docgate_infra::users::InMemoryUserDirectory;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// One user owning `rules` rules spread over the four target types, a third of
/// them outside their window.
fn seeded_store(runtime: &tokio::runtime::Runtime, rules: usize) -> (Arc<InMemoryRuleStore>, UserId) {
    let users = Arc::new(InMemoryUserDirectory::new());
    let user = users
        .insert(
            NewUser {
                email: "bench@example.com".to_string(),
                name: "Bench".to_string(),
                role: Role::Reader,
            },
            now(),
        )
        .unwrap();
    let store = Arc::new(InMemoryRuleStore::new(users));

    runtime.block_on(async {
        for i in 0..rules {
            let offset = if i % 3 == 0 { Duration::days(60) } else { Duration::zero() };
            store
                .insert_rule(
                    NewAccessRule {
                        user_id: user.id,
                        target_type: TargetType::ALL[i % 4],
                        target_id: format!("T-{i}"),
                        target_name: None,
                        start_date: now() - Duration::days(30) + offset,
                        end_date: now() + Duration::days(30) + offset,
                        is_active: None,
                    },
                    now(),
                )
                .await
                .unwrap();
        }
    });

    (store, user.id)
}

fn bench_check_user_access(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let mut group = c.benchmark_group("check_user_access");

    for rules in [10usize, 100, 1_000] {
        let (store, user) = seeded_store(&runtime, rules);
        let evaluator = AccessEvaluator::new(store);

        group.bench_with_input(BenchmarkId::from_parameter(rules), &rules, |b, _| {
            b.iter(|| {
                let result = runtime.block_on(evaluator.check_user_access(
                    black_box(user),
                    TargetType::Document,
                    black_box("T-4"),
                    now(),
                ));
                black_box(result)
            })
        });
    }
    group.finish();
}

fn bench_check_document_access(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let (store, user) = seeded_store(&runtime, 200);
    let evaluator = AccessEvaluator::new(store);

    // Worst case: nothing grants, every container is consulted.
    let metadata = DocumentMetadata {
        folder_id: Some("missing-folder".to_string()),
        tag_ids: (0..5).map(|i| format!("missing-tag-{i}")).collect(),
        category_id: Some("missing-category".to_string()),
    };

    c.bench_function("check_document_access/miss_all_containers", |b| {
        b.iter(|| {
            let result = runtime.block_on(evaluator.check_document_access(
                black_box(user),
                black_box("nope"),
                Some(&metadata),
                now(),
            ));
            black_box(result)
        })
    });
}

fn bench_accessible_targets(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let (store, user) = seeded_store(&runtime, 1_000);
    let evaluator = AccessEvaluator::new(store);

    c.bench_function("accessible_targets/1000_rules", |b| {
        b.iter(|| black_box(runtime.block_on(evaluator.accessible_targets(black_box(user), now())).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_check_user_access,
    bench_check_document_access,
    bench_accessible_targets
);
criterion_main!(benches);
