//! Integration tests for `DieselWatermarkStore` on embedded PostgreSQL.

use fleet_proximity::domain::ports::{WatermarkAdvance, WatermarkStore};
use fleet_proximity::domain::{ObservationId, PipelineName, Watermark};
use fleet_proximity::outbound::persistence::DieselWatermarkStore;
use rstest::{fixture, rstest};

mod support;

use support::{TestDatabase, handle_cluster_setup_failure, setup_database};

struct TestContext {
    db: TestDatabase,
    store: DieselWatermarkStore,
}

fn setup_context() -> Result<TestContext, String> {
    let db = setup_database(2)?;
    let store = DieselWatermarkStore::new(db.pool.clone());
    Ok(TestContext { db, store })
}

#[fixture]
fn store_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn name(raw: &str) -> PipelineName {
    PipelineName::new(raw).expect("valid pipeline name")
}

#[rstest]
fn unknown_pipeline_loads_at_start(store_context: Option<TestContext>) {
    let Some(context) = store_context else {
        eprintln!("SKIP-TEST-CLUSTER: unknown_pipeline_loads_at_start skipped");
        return;
    };

    let watermark = context
        .db
        .runtime
        .block_on(context.store.load(&name("proximity")))
        .expect("load watermark");

    assert_eq!(watermark, Watermark::Start);
}

#[rstest]
fn watermark_only_moves_forward(store_context: Option<TestContext>) {
    let Some(context) = store_context else {
        eprintln!("SKIP-TEST-CLUSTER: watermark_only_moves_forward skipped");
        return;
    };
    let pipeline = name("proximity");
    let store = &context.store;

    let (first, backwards, equal, forward, loaded) = context.db.runtime.block_on(async {
        let first = store.advance(&pipeline, ObservationId::new(10)).await;
        let backwards = store.advance(&pipeline, ObservationId::new(4)).await;
        let equal = store.advance(&pipeline, ObservationId::new(10)).await;
        let forward = store.advance(&pipeline, ObservationId::new(12)).await;
        let loaded = store.load(&pipeline).await;
        (first, backwards, equal, forward, loaded)
    });

    assert_eq!(first.expect("first commit"), WatermarkAdvance::Advanced);
    assert_eq!(backwards.expect("stale commit"), WatermarkAdvance::AlreadyAhead);
    assert_eq!(equal.expect("repeat commit"), WatermarkAdvance::AlreadyAhead);
    assert_eq!(forward.expect("later commit"), WatermarkAdvance::Advanced);
    assert_eq!(
        loaded.expect("load watermark"),
        Watermark::After(ObservationId::new(12))
    );
}

#[rstest]
fn pipelines_keep_independent_watermarks(store_context: Option<TestContext>) {
    let Some(context) = store_context else {
        eprintln!("SKIP-TEST-CLUSTER: pipelines_keep_independent_watermarks skipped");
        return;
    };
    let store = &context.store;

    let (proximity, audit) = context.db.runtime.block_on(async {
        store
            .advance(&name("proximity"), ObservationId::new(7))
            .await
            .expect("commit proximity");
        let proximity = store.load(&name("proximity")).await.expect("load proximity");
        let audit = store.load(&name("audit")).await.expect("load audit");
        (proximity, audit)
    });

    assert_eq!(proximity, Watermark::After(ObservationId::new(7)));
    assert_eq!(audit, Watermark::Start);
}
