//! Integration tests for the stock and project analyses.
//!
//! These run end to end on saved fixtures; nothing here touches the network.

use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::process::Command;
use wrangle::{
    FillScope, FrequencyEntry, ProjectTable, ProjectsConfig, ReportWriter, StockDataset,
    StockReport, StockSummary, projects,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_stock_fixture() -> StockDataset {
    StockDataset::from_path(fixtures_path().join("afx_x_2017_sample.json"))
        .expect("Failed to load stock fixture")
}

fn load_projects_fixture() -> ProjectTable {
    ProjectTable::from_path(
        fixtures_path().join("world_bank_projects_sample.json"),
        "mjtheme_namecode",
    )
    .expect("Failed to load projects fixture")
}

fn run_cli(args: &[&str]) -> serde_json::Value {
    let output = Command::new(env!("CARGO_BIN_EXE_wrangle"))
        .args(args)
        .output()
        .expect("Failed to run wrangle binary");
    assert!(
        output.status.success(),
        "wrangle failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be pure JSON")
}

// ============================================================================
// Stock Summary Tests
// ============================================================================

#[test]
fn test_stock_fixture_metadata() {
    let dataset = load_stock_fixture();
    assert_eq!(dataset.len(), 8);
    assert_eq!(dataset.database_code.as_deref(), Some("FSE"));
    assert_eq!(dataset.dataset_code.as_deref(), Some("AFX_X"));
    assert_eq!(dataset.frequency.as_deref(), Some("daily"));
    assert_eq!(dataset.start_date.as_deref(), Some("2017-01-02"));
    assert_eq!(dataset.end_date.as_deref(), Some("2017-01-11"));
    assert_eq!(dataset.column_names.len(), 11);
}

#[test]
fn test_stock_summary_end_to_end() {
    let summary = StockSummary::from_dataset(&load_stock_fixture()).unwrap();

    assert_eq!(
        summary,
        StockSummary {
            trading_days: 8,
            first_date: Some("2017-01-02".to_string()),
            last_date: Some("2017-01-11".to_string()),
            max_opening: 35.9,
            min_opening: 34.8,
            max_daily_spread: 1.16,
            max_close_change: Some(0.51),
            max_open_close_difference: 0.81,
            average_volume: 54296.43,
            median_volume: 48412.0,
        }
    );
}

#[test]
fn test_stock_report_json_shape() {
    let dataset = load_stock_fixture();
    let summary = StockSummary::from_dataset(&dataset).unwrap();
    let report = StockReport::new("afx_x_2017_sample.json", &dataset, summary);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["dataset_code"], "FSE/AFX_X");
    assert_eq!(json["dataset_name"], "Carl Zeiss Meditec (AFX_X)");
    assert_eq!(json["start_date"], "2017-01-02");
    assert_eq!(json["end_date"], "2017-01-11");
    assert_eq!(json["summary"]["median_volume"], 48412.0);
    assert!(json["generated_at"].is_string());
}

// ============================================================================
// Project Frequency Tests
// ============================================================================

#[test]
fn test_projects_load() {
    let table = load_projects_fixture();
    assert_eq!(table.len(), 11);
    assert_eq!(table.themes.len(), 25);
    assert_eq!(table.themes.missing_names().unwrap(), 7);
    // "_id" and "sector" are nested and stay out of the flat table.
    assert!(table.frame.column("_id").is_err());
    assert!(table.frame.column("regionname").is_ok());
}

#[test]
fn test_projects_analysis_within_code() {
    let mut table = load_projects_fixture();
    let config = ProjectsConfig::builder().top_n(3).build().unwrap();

    let analysis = projects::analyze(&mut table, &config).unwrap();

    assert_eq!(
        analysis.top_countries,
        vec![
            FrequencyEntry::new("Ethiopia", 3),
            FrequencyEntry::new("Kenya", 2),
            FrequencyEntry::new("China", 1),
        ]
    );
    assert_eq!(
        analysis.top_themes_before_fill[0],
        FrequencyEntry::new("Environment and natural resources management", 3)
    );

    assert_eq!(analysis.fill.scope, FillScope::WithinCode);
    assert_eq!(analysis.fill.missing_before, 7);
    assert_eq!(analysis.fill.filled, 6);
    assert_eq!(analysis.fill.still_missing, 1);

    assert_eq!(
        analysis.top_themes_after_fill,
        vec![
            FrequencyEntry::new("Environment and natural resources management", 4),
            FrequencyEntry::new("Social protection and risk management", 4),
            FrequencyEntry::new("Human development", 3),
        ]
    );
}

#[test]
fn test_projects_analysis_global_fill() {
    let mut table = load_projects_fixture();
    let config = ProjectsConfig::builder()
        .top_n(20)
        .fill_scope(FillScope::Global)
        .build()
        .unwrap();

    let analysis = projects::analyze(&mut table, &config).unwrap();
    assert_eq!(analysis.fill.filled, 7);
    assert_eq!(analysis.fill.still_missing, 0);

    // The code "3" entry has no named sibling and borrows the next code's name.
    let financial = analysis
        .top_themes_after_fill
        .iter()
        .find(|e| e.value == "Financial and private sector development")
        .unwrap();
    assert_eq!(financial.count, 3);

    let total: usize = analysis.top_themes_after_fill.iter().map(|e| e.count).sum();
    assert_eq!(total, 25);
}

#[test]
fn test_projects_unknown_country_field() {
    let mut table = load_projects_fixture();
    let config = ProjectsConfig::builder()
        .country_field("borrower")
        .build()
        .unwrap();

    let err = projects::analyze(&mut table, &config).unwrap_err();
    assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
}

#[test]
fn test_report_written_to_disk() {
    let mut table = load_projects_fixture();
    let analysis = projects::analyze(&mut table, &ProjectsConfig::default()).unwrap();
    let report = wrangle::ProjectsReport::new("world_bank_projects_sample.json", analysis);

    let dir = std::env::temp_dir().join(format!("wrangle-it-{}", std::process::id()));
    let path = ReportWriter::new(&dir).write(&report, "world_bank").unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["record_count"], 11);
    assert_eq!(written["fill"]["still_missing"], 1);

    let _ = std::fs::remove_dir_all(&dir);
}

// ============================================================================
// CLI Tests
// ============================================================================

#[test]
fn test_cli_stocks_offline_json() {
    let input = fixtures_path().join("afx_x_2017_sample.json");
    let json = run_cli(&["stocks", "--input", input.to_str().unwrap(), "--json"]);

    assert_eq!(json["summary"]["trading_days"], 8);
    assert_eq!(json["summary"]["max_daily_spread"], 1.16);
}

#[test]
fn test_cli_projects_json() {
    let input = fixtures_path().join("world_bank_projects_sample.json");
    let json = run_cli(&[
        "projects",
        "--input",
        input.to_str().unwrap(),
        "--top",
        "2",
        "--json",
    ]);

    assert_eq!(json["top_countries"][0]["value"], "Ethiopia");
    assert_eq!(json["top_countries"].as_array().unwrap().len(), 2);
    assert_eq!(json["fill"]["scope"], "within_code");
}

#[test]
fn test_cli_projects_missing_input() {
    let output = Command::new(env!("CARGO_BIN_EXE_wrangle"))
        .args(["projects", "--input", "does/not/exist.json", "--json"])
        .output()
        .expect("Failed to run wrangle binary");
    assert_eq!(output.status.code(), Some(1));

    // The error is reported once, as JSON on stdout.
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"]["code"], "ERROR");
    assert!(
        json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Input file not found")
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn test_cli_empty_dataset_is_data_error() {
    let dir = std::env::temp_dir().join(format!("wrangle-empty-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let input = dir.join("empty.json");
    std::fs::write(
        &input,
        r#"{"dataset": {"column_names": ["Date", "Open", "High", "Low", "Close", "Traded Volume"], "data": []}}"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_wrangle"))
        .args(["stocks", "--input", input.to_str().unwrap(), "--json"])
        .output()
        .expect("Failed to run wrangle binary");
    let _ = std::fs::remove_dir_all(&dir);

    assert_eq!(output.status.code(), Some(2));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["error"]["code"], "NO_VALID_VALUES");
}

#[test]
fn test_cli_projects_bar_width() {
    let input = fixtures_path().join("world_bank_projects_sample.json");
    let output = Command::new(env!("CARGO_BIN_EXE_wrangle"))
        .args([
            "projects",
            "--input",
            input.to_str().unwrap(),
            "--top",
            "1",
            "--bar-width",
            "5",
            "--quiet",
        ])
        .output()
        .expect("Failed to run wrangle binary");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Ethiopia"));
    assert!(stdout.contains(&"#".repeat(5)));
    assert!(!stdout.contains(&"#".repeat(6)));
}
