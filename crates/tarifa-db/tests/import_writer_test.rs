// tests/import_writer_test.rs
//
// Requires a disposable PostgreSQL database:
//   DATABASE_URL=postgres://... cargo test -p tarifa-db -- --ignored

use rust_decimal_macros::dec;
use sqlx::PgPool;
use tarifa_core::models::{ImportRow, StatementGroup};
use tarifa_core::traits::{BatchWriter, RateGroupRepository};
use tarifa_db::{BatchSqlBuilder, PgBatchWriter, PgRateGroupRepository};

async fn setup() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.expect("connect");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

async fn create_rate_group(pool: &PgPool, brand_id: i32) -> i32 {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO destination_rate_groups (brand_id, name, file_base_name, file_importer_arguments) \
         VALUES ($1, 'test', 'rates.csv', '{\"columns\": []}'::jsonb) RETURNING id",
    )
    .bind(brand_id)
    .fetch_one(pool)
    .await
    .expect("insert rate group")
}

async fn count(pool: &PgPool, table: &str, brand_id: i32) -> i64 {
    let query = match table {
        "destinations" => {
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM destinations WHERE brand_id = $1")
                .bind(brand_id)
                .fetch_one(pool)
                .await
        }
        other => {
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {} WHERE tpid = $1", other))
                .bind(format!("b{}", brand_id))
                .fetch_one(pool)
                .await
        }
    };
    query.expect("count")
}

fn rows(n: usize, prefix_base: u32) -> Vec<ImportRow> {
    (0..n as u32)
        .map(|i| ImportRow {
            destination_prefix: format!("+{}", prefix_base + i),
            destination_name: format!("Destination {}", i),
            rate_cost: dec!(0.0100),
            connection_charge: dec!(0.0000),
            rate_increment: 60,
        })
        .collect()
}

fn unique_brand() -> i32 {
    (chrono::Utc::now().timestamp_micros() % 1_000_000) as i32 + 1_000
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_import_writes_every_group_with_tags() {
    let pool = setup().await;
    let brand_id = unique_brand();
    let group_id = create_rate_group(&pool, brand_id).await;

    let plan = BatchSqlBuilder::new(brand_id, group_id).build(&rows(250, 3400));
    let report = PgBatchWriter::new(pool.clone()).write(&plan).await.unwrap();

    for group in StatementGroup::ALL {
        assert_eq!(report.affected(group), 250, "{}", group);
    }
    assert!(report.created_destination_mappings());

    let (tag, destination_id): (String, i64) = sqlx::query_as(
        "SELECT tag, destination_id FROM tp_destinations WHERE tpid = $1 LIMIT 1",
    )
    .bind(format!("b{}", brand_id))
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(tag, format!("b{}dst{}", brand_id, destination_id));

    let rate_tag: String =
        sqlx::query_scalar("SELECT DISTINCT tag FROM tp_destination_rates WHERE tpid = $1")
            .bind(format!("b{}", brand_id))
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rate_tag, format!("b{}dr{}", brand_id, group_id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_rerun_is_idempotent() {
    let pool = setup().await;
    let brand_id = unique_brand();
    let group_id = create_rate_group(&pool, brand_id).await;
    let writer = PgBatchWriter::new(pool.clone());
    let plan = BatchSqlBuilder::new(brand_id, group_id).build(&rows(120, 4400));

    writer.write(&plan).await.unwrap();
    let before = (
        count(&pool, "destinations", brand_id).await,
        count(&pool, "tp_destinations", brand_id).await,
        count(&pool, "tp_rates", brand_id).await,
        count(&pool, "tp_destination_rates", brand_id).await,
    );

    let report = writer.write(&plan).await.unwrap();
    for group in StatementGroup::ALL {
        assert_eq!(report.affected(group), 0, "{}", group);
    }
    assert!(!report.created_destination_mappings());

    let after = (
        count(&pool, "destinations", brand_id).await,
        count(&pool, "tp_destinations", brand_id).await,
        count(&pool, "tp_rates", brand_id).await,
        count(&pool, "tp_destination_rates", brand_id).await,
    );
    assert_eq!(before, after);
    assert_eq!(before.0, 120);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_failing_group_rolls_back_everything() {
    let pool = setup().await;
    let brand_id = unique_brand();
    let group_id = create_rate_group(&pool, brand_id).await;

    let mut plan = BatchSqlBuilder::new(brand_id, group_id).build(&rows(10, 5400));
    let rates = plan
        .groups
        .iter_mut()
        .find(|g| g.group == StatementGroup::DestinationRates)
        .unwrap();
    rates.statements[0].sql = "INSERT INTO no_such_table VALUES (1)".to_string();
    rates.statements[0].params.clear();

    let result = PgBatchWriter::new(pool.clone()).write(&plan).await;
    assert!(result.is_err());
    assert_eq!(count(&pool, "destinations", brand_id).await, 0);
    assert_eq!(count(&pool, "tp_destinations", brand_id).await, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_rate_group_execution_bookkeeping() {
    use tarifa_core::models::{ExecutionRecord, RateGroupStatus};

    let pool = setup().await;
    let brand_id = unique_brand();
    let group_id = create_rate_group(&pool, brand_id).await;
    let repo = PgRateGroupRepository::new(pool.clone());

    repo.update_status(group_id, RateGroupStatus::InProgress)
        .await
        .unwrap();
    repo.record_execution(group_id, &ExecutionRecord::failed("boom"))
        .await
        .unwrap();

    let group = repo.find_by_id(group_id).await.unwrap().unwrap();
    assert_eq!(group.status, RateGroupStatus::Error);
    assert_eq!(group.last_execution_error.as_deref(), Some("boom"));
    assert!(group.last_execution_date.is_some());
    assert_eq!(group.file.unwrap().base_name, "rates.csv");

    repo.record_execution(group_id, &ExecutionRecord::imported())
        .await
        .unwrap();
    let group = repo.find_by_id(group_id).await.unwrap().unwrap();
    assert_eq!(group.status, RateGroupStatus::Imported);
    assert_eq!(group.last_execution_error, None);

    assert!(repo.find_by_id(-1).await.unwrap().is_none());
    let err = repo
        .record_execution(-1, &ExecutionRecord::imported())
        .await
        .unwrap_err();
    assert!(matches!(err, tarifa_core::AppError::RateGroupNotFound(-1)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_malformed_importer_arguments_load_raw() {
    let pool = setup().await;
    let brand_id = unique_brand();
    let group_id = create_rate_group(&pool, brand_id).await;
    sqlx::query(
        "UPDATE destination_rate_groups \
         SET file_importer_arguments = '{\"delimiter\": \";;\", \"columns\": []}'::jsonb \
         WHERE id = $1",
    )
    .bind(group_id)
    .execute(&pool)
    .await
    .unwrap();

    let group = PgRateGroupRepository::new(pool.clone())
        .find_by_id(group_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(group.file.unwrap().importer_arguments["delimiter"], ";;");
}
