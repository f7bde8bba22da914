//! End-to-end pass tests: in-memory sheet and state store, wiremock store API.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use sheetsync_catalog::{CatalogApi, CatalogError, CreatedProduct, ShopifyAdminClient};
use sheetsync_core::{
    CellValue, MemoryStateStore, Product, StateStore, SyncState, SYNC_LEASE_NAME,
};
use sheetsync_engine::{
    initialize_tracking, reset_tracking, run_pass, sync_once, sync_with_lease, PassError,
    PassLease, PassOptions, RowError, RowErrorKind, RowOutcome,
};
use sheetsync_sheets::{MemorySheet, SheetSource};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCTS_PATH: &str = "/admin/api/2024-01/products.json";
const STATUS_COLUMN: usize = 25;

fn client(server: &MockServer) -> ShopifyAdminClient {
    ShopifyAdminClient::new(&server.uri(), "shpat_test", "2024-01", 5, "sheetsync-test/0.1")
        .expect("failed to build test client")
}

fn options() -> PassOptions {
    PassOptions {
        status_column: STATUS_COLUMN,
        row_delay: Duration::ZERO,
        lease_ttl: Duration::from_secs(60),
    }
}

async fn watermark(store: &MemoryStateStore) -> Option<SyncState> {
    sheetsync_core::load_sync_state(store).await.unwrap()
}

fn created(id: u64) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(&json!({"product": {"id": id}}))
}

#[tokio::test]
async fn widget_row_is_created_and_marked_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .and(body_partial_json(json!({
            "product": {
                "title": "Widget",
                "variants": [{"barcode": "012345", "price": "9.99"}]
            }
        })))
        .respond_with(created(632_910_392))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(
        &["Title", "Barcode", "Price"],
        &[&["Widget", "012345", "9.99"]],
    );
    let store = MemoryStateStore::with_watermark(1);

    let report = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap();

    assert_eq!(report.attempted(), 1);
    assert_eq!(report.succeeded(), 1);
    let text = sheet.cell_text(2, STATUS_COLUMN).await.unwrap();
    assert!(text.starts_with("SUCCESS: "), "got {text}");
    assert!(text.ends_with(" UTC | ID: 632910392"), "got {text}");
    assert_eq!(watermark(&store).await, Some(SyncState::new(2)));
    assert_eq!(store.lease_holder(SYNC_LEASE_NAME).await, None);
}

#[tokio::test]
async fn size_and_color_columns_become_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .and(body_partial_json(json!({
            "product": {
                "title": "Shirt",
                "options": [
                    {"name": "Size", "values": ["M"]},
                    {"name": "Color", "values": ["Red"]}
                ],
                "variants": [{"option1": "M", "option2": "Red"}]
            }
        })))
        .respond_with(created(7))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title", "Size", "Color"], &[&["Shirt", "M", "Red"]]);
    let store = MemoryStateStore::with_watermark(1);

    let report = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap();
    assert_eq!(report.succeeded(), 1);
}

#[tokio::test]
async fn untitled_row_fails_validation_without_remote_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(created(1))
        .expect(0)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title", "Barcode"], &[&["", "999"]]);
    let store = MemoryStateStore::with_watermark(1);

    let report = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap();

    let outcome = report.outcome_for(2).unwrap();
    assert_eq!(outcome.error(), Some(&RowError::Validation));
    let text = sheet.cell_text(2, STATUS_COLUMN).await.unwrap();
    assert!(text.starts_with("ERROR: "));
    assert!(text.ends_with("missing required fields"));
    assert_eq!(watermark(&store).await, Some(SyncState::new(2)));
}

#[tokio::test]
async fn rejected_row_is_marked_and_watermark_still_advances() {
    let server = MockServer::start().await;
    let error_body = r#"{"errors":{"title":["can't be blank"]}}"#;
    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_string(error_body))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title"], &[&["Widget"]]);
    let store = MemoryStateStore::with_watermark(1);

    let report = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(
        sheet.cell_text(2, STATUS_COLUMN).await.as_deref(),
        Some(r#"ERROR: API Error (422): {"errors":{"title":["can't be blank"]}}"#)
    );
    assert_eq!(watermark(&store).await, Some(SyncState::new(2)));
}

#[tokio::test]
async fn one_failing_row_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"product": {"title": "Bad"}})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"product": {"title": "Good"}})))
        .respond_with(created(42))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title"], &[&["Bad"], &["Good"]]);
    let store = MemoryStateStore::with_watermark(1);

    let report = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap();

    assert_eq!(report.attempted(), 2);
    assert_eq!(
        report.outcome_for(2).and_then(|o| o.error()).map(RowError::kind),
        Some(RowErrorKind::Remote)
    );
    assert!(report.outcome_for(3).unwrap().is_success());
    assert_eq!(
        sheet.cell_text(2, STATUS_COLUMN).await.as_deref(),
        Some("ERROR: API Error (500): boom")
    );
    assert_eq!(watermark(&store).await, Some(SyncState::new(3)));
}

#[tokio::test]
async fn second_pass_without_new_rows_is_a_no_op() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(created(5))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title"], &[&["Lamp"]]);
    let store = MemoryStateStore::with_watermark(1);
    let catalog = client(&server);

    let first = sync_once(&store, &sheet, &catalog, &options()).await.unwrap();
    assert!(!first.is_idle());

    let second = sync_once(&store, &sheet, &catalog, &options()).await.unwrap();
    assert!(second.is_idle());
    assert_eq!(second.state, SyncState::new(2));
    assert_eq!(watermark(&store).await, Some(SyncState::new(2)));
}

#[tokio::test]
async fn rows_appended_between_passes_are_picked_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(created(9))
        .expect(2)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title"], &[&["One"]]);
    let store = MemoryStateStore::with_watermark(1);
    let catalog = client(&server);

    sync_once(&store, &sheet, &catalog, &options()).await.unwrap();
    sheet.push_row(vec![CellValue::from("Two")]).await;
    let report = sync_once(&store, &sheet, &catalog, &options()).await.unwrap();

    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].row, 3);
    assert_eq!(watermark(&store).await, Some(SyncState::new(3)));
}

#[tokio::test]
async fn blank_rows_are_skipped_without_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(created(3))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title", "SKU"], &[&["", "  "], &["Cup", "C-1"]]);
    let store = MemoryStateStore::with_watermark(1);

    let report = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap();

    assert_eq!(report.skipped_blank, vec![2]);
    assert_eq!(report.attempted(), 1);
    assert_eq!(sheet.cell_text(2, STATUS_COLUMN).await, None);
    assert!(sheet.cell_text(3, STATUS_COLUMN).await.is_some());
    assert_eq!(watermark(&store).await, Some(SyncState::new(3)));
}

#[tokio::test]
async fn value_under_missing_header_does_not_block_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"product": {"title": "Cup"}})))
        .respond_with(created(3))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title"], &[&["Cup", "extra"]]);
    let store = MemoryStateStore::with_watermark(1);

    let report = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap();

    assert!(report.outcome_for(2).is_some_and(RowOutcome::is_success));
    assert!(sheet
        .cell_text(2, STATUS_COLUMN)
        .await
        .is_some_and(|text| text.starts_with("SUCCESS: ")));
}

#[tokio::test]
async fn transport_failure_is_recorded_per_row() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let uri = format!("http://{}", listener.local_addr().expect("local addr"));
    drop(listener);
    let catalog = ShopifyAdminClient::new(&uri, "shpat_test", "2024-01", 5, "sheetsync-test/0.1")
        .unwrap();

    let sheet = MemorySheet::from_rows(&["Title"], &[&["Cup"]]);
    let store = MemoryStateStore::with_watermark(1);

    let report = sync_once(&store, &sheet, &catalog, &options()).await.unwrap();

    assert_eq!(
        report.outcome_for(2).and_then(|o| o.error()).map(RowError::kind),
        Some(RowErrorKind::Transport)
    );
    let text = sheet.cell_text(2, STATUS_COLUMN).await.unwrap();
    assert!(text.starts_with("ERROR: Request failed: "), "got {text}");
    assert_eq!(watermark(&store).await, Some(SyncState::new(2)));
}

#[tokio::test]
async fn held_lease_aborts_without_touching_anything() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(created(1))
        .expect(0)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title"], &[&["Cup"]]);
    let store = MemoryStateStore::with_watermark(1);
    assert!(store
        .try_acquire_lease(SYNC_LEASE_NAME, "other-host", Duration::from_secs(600))
        .await
        .unwrap());

    let err = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap_err();

    assert!(matches!(err, PassError::LeaseHeld), "got {err:?}");
    assert_eq!(watermark(&store).await, Some(SyncState::new(1)));
    assert_eq!(sheet.cell_text(2, STATUS_COLUMN).await, None);
    assert_eq!(
        store.lease_holder(SYNC_LEASE_NAME).await.as_deref(),
        Some("other-host")
    );
}

#[tokio::test]
async fn unreadable_sheet_is_fatal_and_releases_lease() {
    let server = MockServer::start().await;
    let sheet = MemorySheet::unreadable();
    let store = MemoryStateStore::with_watermark(4);

    let err = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap_err();

    assert!(matches!(err, PassError::Sheet(_)), "got {err:?}");
    assert_eq!(watermark(&store).await, Some(SyncState::new(4)));
    assert_eq!(store.lease_holder(SYNC_LEASE_NAME).await, None);
}

#[tokio::test]
async fn uninitialized_tracking_starts_at_current_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(created(1))
        .expect(0)
        .mount(&server)
        .await;

    let sheet = MemorySheet::from_rows(&["Title"], &[&["Old"], &["Older"]]);
    let store = MemoryStateStore::new();

    let report = sync_once(&store, &sheet, &client(&server), &options())
        .await
        .unwrap();

    assert!(report.is_idle());
    assert_eq!(watermark(&store).await, Some(SyncState::new(3)));
}

#[tokio::test]
async fn initialize_then_reset_tracking() {
    let sheet = MemorySheet::from_rows(&["Title"], &[&["A"], &["B"]]);
    let store = MemoryStateStore::new();
    let ttl = Duration::from_secs(60);

    let state = initialize_tracking(&store, &sheet, ttl).await.unwrap();
    assert_eq!(state, SyncState::new(3));

    sheet.push_row(vec![CellValue::from("C")]).await;
    let state = initialize_tracking(&store, &sheet, ttl).await.unwrap();
    assert_eq!(state, SyncState::new(3), "initialize keeps existing watermark");

    let state = reset_tracking(&store, &sheet, ttl).await.unwrap();
    assert_eq!(state, SyncState::new(4));
    assert_eq!(watermark(&store).await, Some(SyncState::new(4)));
    assert_eq!(store.lease_holder(SYNC_LEASE_NAME).await, None);
}

/// Catalog double recording titles in call order, optionally slow.
#[derive(Default)]
struct RecordingCatalog {
    titles: Mutex<Vec<String>>,
    delay: Duration,
}

impl RecordingCatalog {
    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.titles.lock().unwrap().len()
    }
}

#[async_trait]
impl CatalogApi for RecordingCatalog {
    async fn create_product(&self, product: &Product) -> Result<CreatedProduct, CatalogError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut titles = self.titles.lock().unwrap();
        titles.push(product.title.clone().unwrap_or_default());
        Ok(CreatedProduct {
            id: titles.len().to_string(),
            data: json!({}),
        })
    }
}

#[tokio::test]
async fn run_pass_attempts_rows_in_order_and_leaves_store_alone() {
    let sheet = MemorySheet::from_rows(
        &["Title"],
        &[&["skip-me"], &["first"], &["second"], &["third"]],
    );
    let table = sheet.read_table().await.unwrap();
    let catalog = RecordingCatalog::default();

    let report = run_pass(SyncState::new(2), &table, &sheet, &catalog, &options()).await;

    assert_eq!(
        *catalog.titles.lock().unwrap(),
        vec!["first".to_string(), "second".into(), "third".into()]
    );
    assert_eq!(report.previous, SyncState::new(2));
    assert_eq!(report.state, SyncState::new(5));
    assert_eq!(sheet.cell_text(2, STATUS_COLUMN).await, None);
    assert!(sheet
        .cell_text(5, STATUS_COLUMN)
        .await
        .unwrap()
        .ends_with("| ID: 3"));
}

#[tokio::test]
async fn header_only_sheet_never_treats_header_as_data() {
    let sheet = MemorySheet::from_rows(&["Title"], &[]);
    let table = sheet.read_table().await.unwrap();
    let catalog = RecordingCatalog::default();

    let report = run_pass(SyncState::new(0), &table, &sheet, &catalog, &options()).await;

    assert!(catalog.titles.lock().unwrap().is_empty());
    assert!(report.rows.is_empty());
    assert_eq!(report.state, SyncState::new(1));
}

fn lease_options(ttl: Duration) -> PassOptions {
    PassOptions {
        lease_ttl: ttl,
        ..options()
    }
}

#[tokio::test]
async fn pass_longer_than_lease_ttl_keeps_its_lease() {
    let sheet = MemorySheet::from_rows(&["Title"], &[&["a"], &["b"], &["c"], &["d"]]);
    let store = MemoryStateStore::with_watermark(1);
    let catalog = RecordingCatalog::slow(Duration::from_millis(60));
    let options = lease_options(Duration::from_millis(100));

    let (first, second) = tokio::join!(sync_once(&store, &sheet, &catalog, &options), async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        sync_once(&store, &sheet, &catalog, &options).await
    });

    let first = first.unwrap();
    assert_eq!(first.attempted(), 4);
    assert!(!first.lease_lost);
    assert!(
        matches!(second, Err(PassError::LeaseHeld)),
        "overlapping pass must be turned away, got {second:?}"
    );
    assert_eq!(catalog.calls(), 4, "each row is created exactly once");
    assert_eq!(watermark(&store).await, Some(SyncState::new(5)));
    assert_eq!(store.lease_holder(SYNC_LEASE_NAME).await, None);
}

#[tokio::test]
async fn lease_taken_over_mid_pass_stops_before_next_row() {
    let sheet = MemorySheet::from_rows(&["Title"], &[&["a"], &["b"], &["c"]]);
    let store = MemoryStateStore::with_watermark(1);
    let catalog = RecordingCatalog::slow(Duration::from_millis(100));
    let options = lease_options(Duration::from_millis(30));

    let (report, taken) = tokio::join!(sync_once(&store, &sheet, &catalog, &options), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        store
            .try_acquire_lease(SYNC_LEASE_NAME, "other-host", Duration::from_secs(60))
            .await
            .unwrap()
    });

    assert!(taken, "expired lease should be free to take");
    let report = report.unwrap();
    assert!(report.lease_lost);
    assert_eq!(report.attempted(), 1);
    assert_eq!(catalog.calls(), 1);
    assert_eq!(report.state, SyncState::new(2));
    assert_eq!(watermark(&store).await, Some(SyncState::new(2)));
    assert!(sheet.cell_text(2, STATUS_COLUMN).await.is_some());
    assert_eq!(sheet.cell_text(3, STATUS_COLUMN).await, None);
    assert_eq!(
        store.lease_holder(SYNC_LEASE_NAME).await.as_deref(),
        Some("other-host"),
        "losing pass must not release the new holder's lease"
    );
}

#[tokio::test]
async fn caller_held_lease_turns_away_other_passes() {
    let sheet = MemorySheet::from_rows(&["Title"], &[&["a"]]);
    let store = MemoryStateStore::with_watermark(1);
    let catalog = RecordingCatalog::default();

    let lease = PassLease::acquire(&store, Duration::from_secs(60))
        .await
        .unwrap();
    let err = PassLease::acquire(&store, Duration::from_secs(60))
        .await
        .err();
    assert!(matches!(err, Some(PassError::LeaseHeld)), "got {err:?}");

    let report = sync_with_lease(&lease, &sheet, &catalog, &options())
        .await
        .unwrap();
    assert_eq!(report.attempted(), 1);
    assert_eq!(
        store.lease_holder(SYNC_LEASE_NAME).await.as_deref(),
        Some(lease.holder())
    );

    lease.release().await;
    assert_eq!(store.lease_holder(SYNC_LEASE_NAME).await, None);
}
