use ratewatch::cli::dashboard::SortKey;
use ratewatch::core::{ConversionRequest, RateBoard, RateSource, RefreshScheduler};
use ratewatch::providers::cbr::CbrRateSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wiremock::Mock;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const DAILY_JSON: &str = r#"{
        "Date": "2025-09-20T11:30:00+03:00",
        "Valute": {
            "USD": {"ID": "R01235", "NumCode": "840", "CharCode": "USD", "Nominal": 1,
                    "Name": "Доллар США", "Value": 80.0, "Previous": 81.2},
            "EUR": {"ID": "R01239", "NumCode": "978", "CharCode": "EUR", "Nominal": 1,
                    "Name": "Евро", "Value": 100.0, "Previous": 99.5},
            "JPY": {"ID": "R01820", "NumCode": "392", "CharCode": "JPY", "Nominal": 100,
                    "Name": "Японских иен", "Value": 55.0, "Previous": 55.0}
        }
    }"#;

    pub async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/daily_json.js"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(file: &tempfile::NamedTempFile, base_url: &str) {
        let config_content = format!(
            r#"
            providers:
              cbr:
                base_url: {base_url}
                timeout_secs: 5
            refresh_interval_minutes: 30
        "#
        );
        std::fs::write(file.path(), config_content).expect("Failed to write config file");
    }
}

#[test_log::test(tokio::test)]
async fn test_rates_command_with_mock() {
    let mock_server = test_utils::create_mock_server(200, test_utils::DAILY_JSON).await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let result = ratewatch::run_command(
        ratewatch::AppCommand::Rates {
            sort: SortKey::Value,
            descending: true,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Rates command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_convert_command_with_mock() {
    let mock_server = test_utils::create_mock_server(200, test_utils::DAILY_JSON).await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let result = ratewatch::run_command(
        ratewatch::AppCommand::Convert {
            amount: 100.0,
            from: "usd".to_string(),
            to: "JPY".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Convert command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_convert_unknown_currency_fails() {
    let mock_server = test_utils::create_mock_server(200, test_utils::DAILY_JSON).await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let result = ratewatch::run_command(
        ratewatch::AppCommand::Convert {
            amount: 1.0,
            from: "USD".to_string(),
            to: "GBP".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    let err = result.expect_err("Conversion to an unknown currency should fail");
    assert!(format!("{err:#}").contains("Unknown currency: GBP"));
}

#[test_log::test(tokio::test)]
async fn test_convert_negative_amount_fails() {
    let mock_server = test_utils::create_mock_server(200, test_utils::DAILY_JSON).await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let result = ratewatch::run_command(
        ratewatch::AppCommand::Convert {
            amount: -5.0,
            from: "USD".to_string(),
            to: "EUR".to_string(),
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    let err = result.expect_err("A negative amount should fail");
    assert!(format!("{err:#}").contains("Invalid amount: -5"));
}

#[test_log::test(tokio::test)]
async fn test_feed_outage_is_reported() {
    let mock_server = test_utils::create_mock_server(500, "").await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let result = ratewatch::run_command(
        ratewatch::AppCommand::Rates {
            sort: SortKey::Feed,
            descending: false,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    let err = result.expect_err("A failing feed should fail the one-shot command");
    assert!(format!("{err:#}").contains("HTTP error: 500"));
}

#[test_log::test(tokio::test)]
async fn test_convert_through_base_currency() {
    let mock_server = test_utils::create_mock_server(200, test_utils::DAILY_JSON).await;
    let source = CbrRateSource::new(&mock_server.uri(), Duration::from_secs(5))
        .expect("Failed to build rate source");

    // 100 USD = 8000 RUB = 80 EUR = 14545.45 JPY (55 RUB per 100 JPY)
    let eur = ratewatch::cli::convert::convert(&source, &ConversionRequest::new(100.0, "USD", "EUR"))
        .await
        .unwrap();
    assert!((eur - 80.0).abs() < 1e-9);

    let jpy = ratewatch::cli::convert::convert(&source, &ConversionRequest::new(100.0, "USD", "JPY"))
        .await
        .unwrap();
    assert!((jpy - 14_545.454_545).abs() < 1e-3);

    let rub = ratewatch::cli::convert::convert(&source, &ConversionRequest::new(2.0, "EUR", "RUB"))
        .await
        .unwrap();
    assert!((rub - 200.0).abs() < 1e-9);
    info!(eur, jpy, rub, "Converted through base currency");
}

#[test_log::test(tokio::test)]
async fn test_scheduler_keeps_rates_through_outage() {
    let mock_server = test_utils::create_mock_server(200, test_utils::DAILY_JSON).await;
    let source: Arc<dyn RateSource> =
        Arc::new(CbrRateSource::new(&mock_server.uri(), Duration::from_secs(5)).unwrap());
    let board = Arc::new(RateBoard::new());
    let mut updates = board.subscribe();

    let scheduler = RefreshScheduler::start(source, Arc::clone(&board), Duration::from_secs(3600));
    tokio::time::timeout(
        Duration::from_secs(10),
        updates.wait_for(|view| view.state.is_some()),
    )
    .await
    .expect("Initial refresh timed out")
    .expect("Board closed before first refresh");

    let state = board.current().unwrap();
    assert_eq!(state.stats.max.record.code, "EUR");
    assert_eq!(state.stats.min.record.code, "JPY");
    assert_eq!(state.snapshot.len(), 3);

    mock_server.reset().await;
    Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    assert!(scheduler.refresh_now());
    tokio::time::timeout(
        Duration::from_secs(10),
        updates.wait_for(|view| view.last_error.is_some()),
    )
    .await
    .expect("Failed refresh timed out")
    .expect("Board closed before failed refresh");

    let view = board.view();
    assert!(view.is_stale());
    assert_eq!(view.state.unwrap().snapshot.len(), 3);

    scheduler.stop().await;
    assert!(board.view().is_closed());
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("missing.yaml");
    assert!(!path.exists());

    let result = ratewatch::run_command(
        ratewatch::AppCommand::Rates {
            sort: SortKey::Feed,
            descending: false,
        },
        Some(path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_err());
}
