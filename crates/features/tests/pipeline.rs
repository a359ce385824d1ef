//! End-to-end tests of the render pipeline against files on disk.

use anyhow::{Context, Result};
use orderbook_core::{Config, SnapshotColumn, SnapshotKey};
use orderbook_features::pipeline::export_selection;
use orderbook_features::{render, render_uncached, ItemView, Selection};
use orderbook_ingestion::{CsvCatalog, DepthSource, ManualClock, OrderBookLoader};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const WIDGET: &str = "side,price_vnd,quantity,created_at\n\
                      bid,100,5,2024-03-01 09:00:00\n\
                      bid,100,3,2024-03-01 09:00:00\n\
                      ask,110,2,2024-03-01 09:00:00\n";

fn data_dir(files: &[(&str, &str)]) -> Result<TempDir> {
    let dir = tempfile::tempdir()?;
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents)?;
    }
    Ok(dir)
}

fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.catalog.data_dir = dir.to_path_buf();
    config
}

fn key(label: &str) -> SnapshotKey {
    SnapshotKey::parse_label(label).expect("valid snapshot label")
}

fn points(curve: &[orderbook_core::DepthPoint]) -> Vec<(f64, f64)> {
    curve.iter().map(|p| (p.price, p.cum_qty)).collect()
}

#[test]
fn widget_scenario() -> Result<()> {
    let dir = data_dir(&[("widget.csv", WIDGET)])?;
    let config = config_for(dir.path());

    let model = render_uncached(&config, &Selection::default().at(key("2024-03-01 09:00:00")));
    assert_eq!(model.files.len(), 1);
    assert_eq!(model.files[0].item_name, "widget");

    let book = model.book().context("widget book")?;
    let bids: Vec<_> = book.bids.iter().map(|e| (e.price.0, e.quantity)).collect();
    let asks: Vec<_> = book.asks.iter().map(|e| (e.price.0, e.quantity)).collect();
    assert_eq!(bids, vec![(100.0, Some(5.0)), (100.0, Some(3.0))]);
    assert_eq!(asks, vec![(110.0, Some(2.0))]);
    assert_eq!(points(&book.bid_depth), vec![(100.0, 5.0), (100.0, 8.0)]);
    assert_eq!(points(&book.ask_depth), vec![(110.0, 2.0)]);
    assert_eq!(book.summary.spread, Some(10.0));
    assert_eq!(book.snapshot_column, Some(SnapshotColumn::CreatedAt));
    assert_eq!(
        book.export_file_name.as_deref(),
        Some("widget_orderbook_2024-03-01 09-00-00.csv")
    );
    Ok(())
}

#[test]
fn denylisted_file_never_discovered() -> Result<()> {
    let dir = data_dir(&[
        ("prices_overall.csv", WIDGET),
        ("alerts.csv", WIDGET),
        ("widget.csv", WIDGET),
    ])?;

    let mut config = config_for(dir.path());
    config.catalog.denylist.push("prices_overall.csv".to_string());

    let model = render_uncached(&config, &Selection::file("prices_overall.csv"));
    let names: Vec<_> = model.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["widget.csv"]);
    // The denied name falls back to the first listed file.
    assert_eq!(model.book().context("fallback book")?.file.file_name, "widget.csv");
    Ok(())
}

#[test]
fn wrong_price_column_excluded() -> Result<()> {
    let dir = data_dir(&[("widget.csv", "side,price,quantity\nbid,100,5\n")])?;
    let model = render_uncached(&config_for(dir.path()), &Selection::default());

    assert!(model.files.is_empty());
    assert!(matches!(model.view, ItemView::NoSources { .. }));
    Ok(())
}

#[test]
fn absent_snapshot_gives_empty_sides() -> Result<()> {
    let dir = data_dir(&[("widget.csv", WIDGET)])?;
    let table = OrderBookLoader::load_path(&dir.path().join("widget.csv"))?;

    let sides = orderbook_features::split(&table, &key("2031-01-01 00:00:00"));
    assert!(sides.bids.is_empty());
    assert!(sides.asks.is_empty());

    let curves = orderbook_features::DepthCurves::build(&sides, false);
    assert!(curves.bids.is_empty() && curves.asks.is_empty());
    Ok(())
}

#[test]
fn discovered_files_have_required_columns() -> Result<()> {
    let dir = data_dir(&[
        ("a.csv", WIDGET),
        ("b.csv", "quantity,price_vnd,side,timestamp\n"),
        ("c.csv", "side,quantity\nbid,1\n"),
        ("d.csv", "\"unterminated\nbid,1,1\n"),
    ])?;

    let files = CsvCatalog::new(Vec::<String>::new(), 2).discover(dir.path())?;
    assert_eq!(files.len(), 2);
    for file in &files {
        for column in orderbook_core::REQUIRED_COLUMNS {
            assert!(file.has_column(column), "{} lacks {}", file.file_name, column);
        }
    }
    Ok(())
}

#[test]
fn newest_snapshot_selected_by_default() -> Result<()> {
    let dir = data_dir(&[(
        "widget.csv",
        "side,price_vnd,quantity,timestamp\n\
         bid,100,1,2024-03-01 09:00:00\n\
         bid,101,2,2024-03-01 10:00:00\n\
         ask,111,4,2024-03-01 10:00:00\n",
    )])?;

    let model = render_uncached(&config_for(dir.path()), &Selection::default());
    let book = model.book().context("book")?;
    assert_eq!(book.snapshots.len(), 2);
    assert_eq!(book.snapshot, Some(key("2024-03-01 10:00:00")));
    assert_eq!(book.bids.len(), 1);
    assert_eq!(book.bids[0].price.0, 101.0);

    let older = render_uncached(
        &config_for(dir.path()),
        &Selection::default().at(key("2024-03-01 09:00:00")),
    );
    assert_eq!(older.book().context("older book")?.bids[0].price.0, 100.0);

    // Unknown snapshots fall back to the newest one.
    let unknown = render_uncached(
        &config_for(dir.path()),
        &Selection::default().at(key("2020-01-01 00:00:00")),
    );
    assert_eq!(unknown.book().context("fallback book")?.snapshot, book.snapshot);
    Ok(())
}

#[test]
fn file_without_key_column_is_one_snapshot() -> Result<()> {
    let dir = data_dir(&[("widget.csv", "side,price_vnd,quantity\nbid,1,1\nask,2,3\nbid,0.5,1\n")])?;

    let model = render_uncached(&config_for(dir.path()), &Selection::default());
    let book = model.book().context("book")?;
    assert_eq!(book.snapshots, vec![SnapshotKey::WholeFile]);
    assert_eq!(book.bids.len(), 2);
    assert_eq!(book.snapshot_column, None);
    assert_eq!(book.export_file_name.as_deref(), Some("widget_orderbook_all.csv"));
    Ok(())
}

#[test]
fn unreadable_selection_keeps_file_list() -> Result<()> {
    let dir = data_dir(&[("a.csv", WIDGET), ("b.csv", WIDGET)])?;
    let clock = Arc::new(ManualClock::new(0));
    let mut source = DepthSource::with_clock(config_for(dir.path()), clock);

    let first = render(&mut source, &Selection::file("b.csv"));
    assert_eq!(first.book().context("book")?.file.file_name, "b.csv");

    fs::write(dir.path().join("b.csv"), "side,price,quantity\n")?;
    let model = render(&mut source, &Selection::file("b.csv"));
    assert_eq!(model.files.len(), 2);
    match &model.view {
        ItemView::Unavailable { file, reason } => {
            assert_eq!(file.file_name, "b.csv");
            assert!(reason.contains("price_vnd"), "{reason}");
        }
        other => panic!("expected unavailable view, got {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_directory_is_no_data() {
    let config = config_for(Path::new("/definitely/not/a/data/dir"));
    let model = render_uncached(&config, &Selection::default());
    assert!(model.files.is_empty());
    assert!(matches!(model.view, ItemView::NoSources { .. }));
}

#[test]
fn deleted_file_is_not_served_stale() -> Result<()> {
    let dir = data_dir(&[("widget.csv", WIDGET)])?;
    let mut source = DepthSource::with_clock(config_for(dir.path()), Arc::new(ManualClock::new(0)));

    assert!(render(&mut source, &Selection::default()).book().is_some());

    fs::remove_file(dir.path().join("widget.csv"))?;
    let model = render(&mut source, &Selection::default());
    assert!(model.files.is_empty());
    assert!(matches!(model.view, ItemView::NoSources { .. }));
    Ok(())
}

#[test]
fn aggregated_depth_when_configured() -> Result<()> {
    let dir = data_dir(&[("widget.csv", WIDGET)])?;
    let mut config = config_for(dir.path());
    config.depth.aggregate_price_levels = true;

    let model = render_uncached(&config, &Selection::default());
    let book = model.book().context("book")?;
    assert_eq!(book.bids.len(), 2);
    assert_eq!(points(&book.bid_depth), vec![(100.0, 8.0)]);
    Ok(())
}

#[test]
fn export_matches_selection() -> Result<()> {
    let dir = data_dir(&[(
        "widget.csv",
        "side,price_vnd,quantity,timestamp\n\
         bid,100,1,2024-03-01 09:00:00\n\
         info,0,0,2024-03-01 10:00:00\n\
         ask,111,4,2024-03-01 10:00:00\n",
    )])?;
    let mut source = DepthSource::new(config_for(dir.path()));

    let export = export_selection(&mut source, &Selection::file("widget.csv"))?;
    assert_eq!(export.file_name, "widget_orderbook_2024-03-01 10-00-00.csv");
    assert_eq!(
        String::from_utf8(export.data)?,
        "side,price_vnd,quantity,timestamp\n\
         info,0,0,2024-03-01 10:00:00\n\
         ask,111,4,2024-03-01 10:00:00\n"
    );
    Ok(())
}

#[test]
fn render_model_serializes() -> Result<()> {
    let dir = data_dir(&[("widget.csv", WIDGET)])?;
    let model = render_uncached(&config_for(dir.path()), &Selection::default());

    let json: serde_json::Value = serde_json::to_value(&model)?;
    assert_eq!(json["view"]["state"], "book");
    assert_eq!(json["view"]["snapshot"], "2024-03-01 09:00:00");
    assert_eq!(json["view"]["bid_depth"][1]["cum_qty"], 8.0);
    // (8 - 2) / (8 + 2)
    assert_eq!(json["view"]["summary"]["imbalance"], 0.6);
    assert_eq!(json["files"][0]["item_name"], "widget");
    Ok(())
}

#[test]
fn depth_total_matches_side_quantity() -> Result<()> {
    let dir = data_dir(&[(
        "widget.csv",
        "side,price_vnd,quantity,timestamp\n\
         bid,100,5,2024-03-01 09:00:00\n\
         bid,99,,2024-03-01 09:00:00\n\
         bid,98,2.5,2024-03-01 09:00:00\n\
         ask,110,1,2024-03-01 09:00:00\n",
    )])?;

    let model = render_uncached(&config_for(dir.path()), &Selection::default());
    let book = model.book().context("book")?;

    let bid_rows: Vec<_> = book.bids.iter().map(|e| (e.price.0, e.quantity)).collect();
    assert_eq!(bid_rows, vec![(100.0, Some(5.0)), (99.0, None), (98.0, Some(2.5))]);
    assert_eq!(book.bid_depth.len(), 2);

    let last = book.bid_depth.last().context("bid depth")?;
    assert_eq!(last.cum_qty, book.summary.bid_qty);
    assert_eq!(last.cum_qty, 7.5);
    Ok(())
}

#[test]
fn file_without_snapshots_has_no_export_name() -> Result<()> {
    let dir = data_dir(&[("widget.csv", "side,price_vnd,quantity,timestamp\n")])?;

    let model = render_uncached(&config_for(dir.path()), &Selection::default());
    let book = model.book().context("book")?;
    assert!(book.snapshots.is_empty());
    assert_eq!(book.snapshot, None);
    assert_eq!(book.export_file_name, None);

    let json = serde_json::to_value(&model)?;
    assert!(json["view"]["export_file_name"].is_null());
    Ok(())
}
