use grid_ragent::core::{Config, TimingConfig};
use grid_ragent::errors::{DriverError, TableError};
use grid_ragent::table::{DeleteOutcome, DeleteState, SortOrder, SpinnerWaiter, SyncOutcome, Table, TableElement};
use grid_ragent::testing::MemoryGrid;
use grid_ragent::{SnapshotDriver, WaitCondition};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

fn config() -> Config {
    Config {
        timing: TimingConfig::immediate(),
        header_mapping: HashMap::from([("Status".to_string(), "disabled".to_string())]),
        ..Default::default()
    }
}

fn inputs_grid() -> MemoryGrid {
    MemoryGrid::new(
        "inputs",
        &[
            ("Name", "name"),
            ("Interval", "interval"),
            ("Index", "index"),
            ("Status", "disabled"),
        ],
    )
    .with_row(&["input_b", "30", "main", "Enabled"])
    .with_row(&["input_a", "60", "main", "Disabled"])
    .with_row(&["input_c", "10", "summary", "Enabled"])
}

fn table_over(grid: MemoryGrid, config: &Config) -> Table<MemoryGrid> {
    let container = grid.container();
    Table::new(Arc::new(grid), &container, config).unwrap()
}

fn sorted(mut keys: Vec<String>) -> Vec<String> {
    keys.sort();
    keys
}

#[tokio::test]
async fn row_count_matches_table_keys() {
    let table = table_over(inputs_grid(), &config());

    let rows = assert_ok!(table.table().await);
    assert_eq!(table.row_count().await.unwrap(), rows.len());
    assert_eq!(rows.len(), 3);
    assert_eq!(table.count_label().await.unwrap(), "3 Inputs");
}

#[tokio::test]
async fn table_is_keyed_by_name_with_lowercased_labels() {
    let table = table_over(inputs_grid(), &config());

    assert_eq!(
        table.headers().await.unwrap(),
        vec!["Name", "Interval", "Index", "Status", ""]
    );

    let rows = table.table().await.unwrap();
    let input_a = &rows["input_a"];
    assert_eq!(input_a["name"], "input_a");
    assert_eq!(input_a["interval"], "60");
    assert_eq!(input_a["status"], "Disabled");
    assert_eq!(input_a.len(), 4);
}

#[tokio::test]
async fn mapped_label_reads_the_same_cell_as_its_key() {
    let table = table_over(inputs_grid(), &config());

    let by_label = table.cell("input_a", "Status").await.unwrap();
    let by_key = table.cell("input_a", "disabled").await.unwrap();
    assert_eq!(by_label, by_key);
    assert_eq!(by_label, "Disabled");
}

#[tokio::test]
async fn unmapped_label_without_cell_is_reported() {
    let config = Config {
        timing: TimingConfig::immediate(),
        ..Default::default()
    };
    let table = table_over(inputs_grid(), &config);

    match table.table().await {
        Err(TableError::CellNotFound { column, selector }) => {
            assert_eq!(column, "status");
            assert_eq!(selector, "#inputs td.col-status");
        }
        other => panic!("expected CellNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn single_row_projection() {
    let table = table_over(inputs_grid(), &config());

    let row = table.row("input_c").await.unwrap();
    assert_eq!(row.key, "input_c");
    assert_eq!(row.get("Index"), Some("summary"));
    assert_eq!(row.get("status"), Some("Enabled"));
}

#[tokio::test]
async fn sorting_is_idempotent_and_reported() {
    let table = table_over(inputs_grid(), &config());
    let keys_before = sorted(table.table().await.unwrap().into_keys().collect());

    assert_eq!(table.sort_by("Name", true).await.unwrap(), 1);
    assert_eq!(table.sort_by("Name", true).await.unwrap(), 0);
    assert_eq!(
        table.current_sort().await.unwrap(),
        Some(SortOrder {
            header: "name".to_string(),
            ascending: true,
        })
    );
    assert_eq!(
        table.column_values("Name").await.unwrap().collect().await.unwrap(),
        vec!["input_a", "input_b", "input_c"]
    );

    assert_eq!(table.sort_by("name", false).await.unwrap(), 1);
    assert_eq!(
        table.column_values("Name").await.unwrap().collect().await.unwrap(),
        vec!["input_c", "input_b", "input_a"]
    );

    let keys_after = sorted(table.table().await.unwrap().into_keys().collect());
    assert_eq!(keys_before, keys_after);
    assert_eq!(table.driver().header_clicks("Name").await, 2);
}

#[tokio::test]
async fn unsorted_to_descending_takes_two_clicks() {
    let table = table_over(inputs_grid(), &config());
    assert_eq!(table.current_sort().await.unwrap(), None);

    assert_eq!(table.sort_by("Interval", false).await.unwrap(), 2);
    assert_eq!(table.driver().header_clicks("Interval").await, 2);
    assert_eq!(
        table.current_sort().await.unwrap(),
        Some(SortOrder {
            header: "interval".to_string(),
            ascending: false,
        })
    );
    assert_eq!(
        table.column_values("Interval").await.unwrap().collect().await.unwrap(),
        vec!["60", "30", "10"]
    );
}

#[tokio::test]
async fn sorting_unknown_header_clicks_nothing() {
    let table = table_over(inputs_grid(), &config());

    let err = table.sort_by("Owner", true).await.unwrap_err();
    assert!(matches!(err, TableError::HeaderNotFound(ref h) if h == "Owner"));
    assert!(table.driver().click_log().await.is_empty());
}

#[tokio::test]
async fn rows_read_before_a_sort_are_stale() {
    let table = table_over(inputs_grid(), &config());

    let mut cursor = table.rows().await.unwrap();
    assert_eq!(cursor.remaining(), 3);
    table.sort_by("Name", true).await.unwrap();

    let first = cursor.next_row().await.unwrap();
    assert!(matches!(
        first,
        Err(TableError::Driver(DriverError::StaleElement(_)))
    ));

    let fresh = table.rows().await.unwrap().collect().await.unwrap();
    assert_eq!(fresh[0].key, "input_a");
}

#[tokio::test]
async fn filter_returns_matching_keys_and_clear_restores() {
    let table = table_over(inputs_grid(), &config());
    let all = table.table().await.unwrap();

    let keys = table.filter("input_a").await.unwrap().collect().await.unwrap();
    assert_eq!(keys, vec!["input_a"]);
    assert_eq!(table.row_count().await.unwrap(), 1);

    let keys = table.filter("summary").await.unwrap().collect().await.unwrap();
    assert_eq!(keys, vec!["input_c"]);
    assert!(keys.iter().all(|k| all.contains_key(k)));

    table.clear_filter().await.unwrap();
    assert_eq!(table.row_count().await.unwrap(), all.len());
    assert_eq!(table.table().await.unwrap(), all);
}

#[tokio::test]
async fn reset_filter_uses_the_clear_control() {
    let table = table_over(inputs_grid(), &config());

    let keys = table.filter("main").await.unwrap().collect().await.unwrap();
    assert_eq!(sorted(keys), vec!["input_a", "input_b"]);

    table.reset_filter().await.unwrap();
    assert_eq!(table.row_count().await.unwrap(), 3);
    assert!(table
        .driver()
        .click_log()
        .await
        .contains(&"filter-clear".to_string()));
}

#[tokio::test]
async fn filter_with_no_matches_is_empty() {
    let table = table_over(inputs_grid(), &config());

    let keys = table.filter("nothing-like-this").await.unwrap().collect().await.unwrap();
    assert!(keys.is_empty());
    assert_eq!(table.count_label().await.unwrap(), "0 Inputs");
}

#[tokio::test]
async fn cancelled_and_dismissed_deletes_keep_the_row() {
    let table = table_over(inputs_grid(), &config());

    let state = table.delete_row("input_b", DeleteOutcome::Cancel).await.unwrap();
    assert_eq!(state, DeleteState::Cancelled);
    assert!(state.row_retained());
    assert!(table.table().await.unwrap().contains_key("input_b"));

    let state = table.delete_row("input_b", DeleteOutcome::Dismiss).await.unwrap();
    assert_eq!(state, DeleteState::Dismissed);
    assert!(table.table().await.unwrap().contains_key("input_b"));

    let log = table.driver().click_log().await;
    assert!(log.contains(&"modal-cancel".to_string()));
    assert!(log.contains(&"modal-close".to_string()));
    assert!(!log.contains(&"modal-submit".to_string()));
}

#[tokio::test]
async fn committed_delete_removes_the_row() {
    let table = table_over(inputs_grid(), &config());

    let state = table.delete_row("input_b", DeleteOutcome::Commit).await.unwrap();
    assert_eq!(state, DeleteState::Committed);
    assert!(!state.row_retained());

    let rows = table.table().await.unwrap();
    assert!(!rows.contains_key("input_b"));
    assert_eq!(table.row_count().await.unwrap(), 2);
}

#[tokio::test]
async fn unknown_row_fails_without_clicking() {
    let table = table_over(inputs_grid(), &config());

    assert!(matches!(
        table.cell("ghost", "Name").await,
        Err(TableError::RowNotFound(ref k)) if k == "ghost"
    ));
    assert!(matches!(
        table.delete_row("ghost", DeleteOutcome::Commit).await,
        Err(TableError::RowNotFound(_))
    ));
    assert!(table.driver().click_log().await.is_empty());
}

#[tokio::test]
async fn duplicate_row_keys_are_rejected() {
    let grid = MemoryGrid::new("inputs", &[("Name", "name"), ("Interval", "interval")])
        .with_row(&["input_a", "30"])
        .with_row(&["input_a", "60"]);
    let table = table_over(grid, &config());

    assert!(matches!(
        table.table().await,
        Err(TableError::DuplicateRowKey(ref k)) if k == "input_a"
    ));
    // single-row lookups take the first match
    assert_eq!(table.cell("input_a", "Interval").await.unwrap(), "30");
}

#[tokio::test]
async fn action_menu_lists_labels() {
    let table = table_over(inputs_grid(), &config());

    assert_eq!(
        table.actions("input_a").await.unwrap(),
        vec!["Edit", "Clone", "Delete"]
    );

    let grid = inputs_grid().with_menu_labels(&["Edit", "Delete"]);
    let table = table_over(grid, &config());
    let menu = table.open_actions("input_c").await.unwrap();
    assert!(menu.is_open);
    assert!(menu.has_action("delete"));
    assert!(!menu.has_action("clone"));
}

#[tokio::test]
async fn edit_and_clone_open_forms_for_the_row() {
    let table = table_over(inputs_grid(), &config());

    table.edit_row("input_c").await.unwrap();
    table.clone_row("input_a").await.unwrap();

    assert_eq!(
        table.driver().opened_forms().await,
        vec![
            ("edit".to_string(), "input_c".to_string()),
            ("clone".to_string(), "input_a".to_string()),
        ]
    );
}

#[tokio::test]
async fn missing_spinner_is_a_soft_outcome() {
    let table = table_over(inputs_grid().without_spinner(), &config());

    let waiter = SpinnerWaiter::new(
        table.catalog().locate(TableElement::Spinner).clone(),
        &TimingConfig::immediate(),
    );
    assert_eq!(
        waiter.settle(table.driver()).await.unwrap(),
        SyncOutcome::SpinnerNotObserved
    );

    let keys = table.filter("input_c").await.unwrap().collect().await.unwrap();
    assert_eq!(keys, vec!["input_c"]);
    assert_eq!(table.sort_by("Name", false).await.unwrap(), 2);
}

#[tokio::test]
async fn spinner_that_never_clears_fails_the_sort() {
    let table = table_over(inputs_grid().with_stuck_spinner(), &config());

    match table.sort_by("Name", true).await {
        Err(TableError::Driver(DriverError::Timeout { condition, .. })) => {
            assert_eq!(condition, WaitCondition::Disappear);
        }
        other => panic!("expected disappear timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn bad_spinner_selector_is_not_swallowed() {
    let mut config = config();
    config.layout.spinner_class = "[[".to_string();
    let table = table_over(inputs_grid(), &config);

    assert!(matches!(
        table.filter("input_a").await,
        Err(TableError::Driver(DriverError::InvalidSelector(_)))
    ));
}

#[tokio::test]
async fn snapshot_reads_match_the_live_grid() {
    let grid = inputs_grid();
    let container = grid.container();
    let html = grid.html().await;
    let live = table_over(grid, &config());

    let snapshot = Table::new(Arc::new(SnapshotDriver::new(html)), &container, &config()).unwrap();
    assert_eq!(snapshot.table().await.unwrap(), live.table().await.unwrap());

    assert!(matches!(
        snapshot.sort_by("Name", true).await,
        Err(TableError::Driver(DriverError::Unsupported(_)))
    ));
}

#[tokio::test]
async fn two_row_walkthrough() {
    let grid = MemoryGrid::new("inputs", &[("Name", "name"), ("Interval", "interval")])
        .with_row(&["input_a", "60"])
        .with_row(&["input_b", "30"]);
    let table = table_over(grid, &config());

    assert_eq!(table.sort_by("name", false).await.unwrap(), 2);
    let rows = table.table().await.unwrap();
    assert!(rows.contains_key("input_a") && rows.contains_key("input_b"));
    assert_eq!(
        table.current_sort().await.unwrap(),
        Some(SortOrder {
            header: "name".to_string(),
            ascending: false,
        })
    );

    let keys = table.filter("input_a").await.unwrap().collect().await.unwrap();
    assert_eq!(keys, vec!["input_a"]);

    table.clear_filter().await.unwrap();
    let keys = table.column_values("name").await.unwrap().collect().await.unwrap();
    assert_eq!(sorted(keys), vec!["input_a", "input_b"]);
}

#[tokio::test(start_paused = true)]
async fn filter_waits_out_the_settle_pause() {
    let mut config = config();
    config.timing.filter_settle_ms = 1000;
    let table = table_over(inputs_grid(), &config);

    let start = tokio::time::Instant::now();
    let keys = table.filter("input_a").await.unwrap().collect().await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(keys, vec!["input_a"]);
    assert!(elapsed >= Duration::from_millis(1000), "settled after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1100), "settled after {:?}", elapsed);

    let start = tokio::time::Instant::now();
    table.clear_filter().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn zero_settle_pause_does_not_sleep() {
    let table = table_over(inputs_grid(), &config());

    let start = tokio::time::Instant::now();
    table.filter("input_b").await.unwrap().collect().await.unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn missing_count_label_is_none_but_bad_selector_fails() {
    let grid = inputs_grid();
    let container = grid.container();
    let html = grid.html().await.replace("shared-collectioncount", "caption-text");
    let snapshot = Table::new(Arc::new(SnapshotDriver::new(html)), &container, &config()).unwrap();
    assert_eq!(snapshot.try_count_label().await.unwrap(), None);
    assert!(matches!(
        snapshot.count_label().await,
        Err(TableError::Driver(DriverError::NotFound(_)))
    ));

    let table = table_over(inputs_grid(), &config());
    assert_eq!(table.try_count_label().await.unwrap().as_deref(), Some("3 Inputs"));

    let mut broken = config();
    broken.layout.count_class = "[[".to_string();
    let table = table_over(inputs_grid(), &broken);
    assert!(matches!(
        table.try_count_label().await,
        Err(TableError::Driver(DriverError::InvalidSelector(_)))
    ));
}
