use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use sharefair_core::{Money, ProjectId, RecordId, TenantId, UserId};
use sharefair_expense::{ExpenseProject, ExpenseRecord, MemberId, RecordDetails};

fn members(count: usize) -> Vec<MemberId> {
    (0..count)
        .map(|i| MemberId::new(format!("member-{i:03}")).unwrap())
        .collect()
}

fn record(project_id: ProjectId, owner: UserId, roster: &[MemberId], cents: i64) -> ExpenseRecord {
    ExpenseRecord::new(
        RecordId::new(),
        project_id,
        owner,
        RecordDetails {
            amount: Money::from_cents(cents),
            date: Utc::now(),
            expense_type: "bench".to_string(),
            remark: String::new(),
            payer: roster[0].clone(),
            consumers: roster[1..].to_vec(),
        },
    )
    .unwrap()
}

fn bench_calc_members_fee(c: &mut Criterion) {
    let mut group = c.benchmark_group("calc_members_fee");

    for consumer_count in [3usize, 10, 50, 200] {
        let roster = members(consumer_count + 1);
        // Uneven amount so every run hands out leftover cents.
        let r = record(ProjectId::new(), UserId::new(), &roster, 1_000_003);

        group.throughput(Throughput::Elements(consumer_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(consumer_count),
            &r,
            |b, r| b.iter(|| black_box(r.calc_members_fee().unwrap())),
        );
    }

    group.finish();
}

fn bench_aggregate_balances(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_balances");

    for record_count in [10usize, 100, 1_000] {
        let roster = members(12);
        let owner = UserId::new();
        let mut project = ExpenseProject::new(
            ProjectId::new(),
            TenantId::new(),
            owner,
            "bench",
            "",
            Utc::now(),
        )
        .unwrap();
        project.add_members(roster.clone()).unwrap();
        for i in 0..record_count {
            let r = record(project.id_typed(), owner, &roster, 10_000 + i as i64);
            project.add_record(r).unwrap();
        }

        group.throughput(Throughput::Elements(record_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(record_count),
            &project,
            |b, p| b.iter(|| black_box(p.aggregate_balances().unwrap())),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_calc_members_fee, bench_aggregate_balances);
criterion_main!(benches);
