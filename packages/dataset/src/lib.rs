#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading and validation of the regional statistics dataset.
//!
//! The dashboard reads a single JSON document (`data/series.json` by
//! default) once at startup, either from disk or over HTTP. Every load
//! path goes through [`parse_dataset`], which normalizes the year list
//! and rejects row sets that would break region-keyed rendering.
//!
//! The [`ranks`] module derives the per-year rankings shown in the
//! region detail panel.

pub mod ranks;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chile_dashboard_dataset_models::{Dataset, Year};

/// Default location of the dataset, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/series.json";

/// Errors that can occur while loading the dataset.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// URL that was requested.
        url: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading the dataset file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document parsed but violates a dataset invariant.
    #[error("Invalid dataset: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Where the dataset is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// Local JSON file.
    Path(PathBuf),
    /// `http://` or `https://` URL.
    Url(String),
}

impl DatasetSource {
    /// Classifies `location` as a URL when it has an HTTP scheme, otherwise
    /// as a file path.
    #[must_use]
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_owned())
        } else {
            Self::Path(PathBuf::from(location))
        }
    }

    /// Loads the dataset from this source.
    ///
    /// # Errors
    ///
    /// Returns [`DataLoadError`] if the read, fetch, parse or validation fails.
    pub async fn load(&self) -> Result<Dataset, DataLoadError> {
        match self {
            Self::Path(path) => load_from_path(path),
            Self::Url(url) => fetch_dataset(url).await,
        }
    }
}

impl std::fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Parses and validates a dataset document.
///
/// Years are sorted ascending and deduplicated. When the document has no
/// `years` list, the years are taken from the `rows` keys.
///
/// # Errors
///
/// Returns [`DataLoadError::Json`] for malformed JSON and
/// [`DataLoadError::Invalid`] when a `rows` key is not a year or a region
/// appears twice within the same year.
pub fn parse_dataset(json: &str) -> Result<Dataset, DataLoadError> {
    let mut dataset: Dataset = serde_json::from_str(json)?;
    validate(&mut dataset)?;

    log::info!(
        "Loaded dataset with {} year(s), {} record(s)",
        dataset.years.len(),
        dataset.all_rows().count()
    );
    Ok(dataset)
}

fn validate(dataset: &mut Dataset) -> Result<(), DataLoadError> {
    let mut row_years = BTreeSet::new();

    for (key, rows) in &dataset.rows {
        let year: Year = key.trim().parse().map_err(|_| DataLoadError::Invalid {
            message: format!("rows key '{key}' is not a year"),
        })?;
        row_years.insert(year);

        let mut seen = BTreeSet::new();
        for record in rows {
            if !seen.insert(record.region.as_str()) {
                return Err(DataLoadError::Invalid {
                    message: format!("region '{}' appears twice in {key}", record.region),
                });
            }
        }
    }

    if dataset.years.is_empty() {
        dataset.years = row_years.iter().copied().collect();
    } else {
        dataset.years.sort_unstable();
        dataset.years.dedup();

        for year in &row_years {
            if !dataset.years.contains(year) {
                log::warn!("Rows for {year} are not listed in years; they will not be selectable");
            }
        }
        for year in &dataset.years {
            if !row_years.contains(year) {
                log::debug!("Year {year} has no rows");
            }
        }
    }

    Ok(())
}

/// Reads and parses the dataset from a local JSON file.
///
/// # Errors
///
/// Returns [`DataLoadError`] if the file cannot be read or is not a valid
/// dataset.
pub fn load_from_path(path: &Path) -> Result<Dataset, DataLoadError> {
    log::info!("Reading dataset from {}", path.display());
    let json = std::fs::read_to_string(path)?;
    parse_dataset(&json)
}

/// Fetches and parses the dataset over HTTP.
///
/// # Errors
///
/// Returns [`DataLoadError::Status`] for a non-success response, and the
/// other variants for transport, parse or validation failures.
pub async fn fetch_dataset(url: &str) -> Result<Dataset, DataLoadError> {
    log::info!("Fetching dataset from {url}");
    let response = reqwest::get(url).await?;

    let status = response.status();
    if !status.is_success() {
        return Err(DataLoadError::Status {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }

    let body = response.text().await?;
    parse_dataset(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> String {
        serde_json::json!({
            "years": [2023, 2021, 2021],
            "rows": {
                "2021": [
                    {"region": "Maule", "satisfaccion": 80.1, "vif": 0.011, "delitos": 0.021},
                    {"region": "Ñuble", "satisfaccion": 77.4, "vif": 0.014, "delitos": 0.018}
                ],
                "2023": [
                    {"region": "Maule", "satisfaccion": 82.0, "vif": 0.012, "delitos": null}
                ]
            },
            "delitos_estudiados": ["Robo con violencia", "Hurto"]
        })
        .to_string()
    }

    #[test]
    fn parses_and_sorts_years() {
        let dataset = parse_dataset(&sample_json()).unwrap();
        assert_eq!(dataset.years, vec![2021, 2023]);
        assert_eq!(dataset.rows_for(2021).len(), 2);
        assert!(dataset.rows_for(2023)[0].delitos.is_nan());
    }

    #[test]
    fn derives_years_from_rows_when_missing() {
        let json = serde_json::json!({
            "rows": {
                "2019": [{"region": "Maule", "satisfaccion": 79.0, "vif": 0.01, "delitos": 0.02}],
                "2017": []
            }
        })
        .to_string();
        let dataset = parse_dataset(&json).unwrap();
        assert_eq!(dataset.years, vec![2017, 2019]);
    }

    #[test]
    fn rejects_duplicate_region_within_year() {
        let json = serde_json::json!({
            "years": [2021],
            "rows": {
                "2021": [
                    {"region": "Maule", "satisfaccion": 80.0, "vif": 0.01, "delitos": 0.02},
                    {"region": "Maule", "satisfaccion": 81.0, "vif": 0.01, "delitos": 0.02}
                ]
            }
        })
        .to_string();

        let err = parse_dataset(&json).unwrap_err();
        assert!(
            matches!(err, DataLoadError::Invalid { ref message } if message.contains("Maule")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rejects_non_year_rows_key() {
        let json = r#"{"years": [], "rows": {"latest": []}}"#;
        assert!(matches!(
            parse_dataset(json),
            Err(DataLoadError::Invalid { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_load_error() {
        assert!(matches!(
            parse_dataset("{\"years\": [2021"),
            Err(DataLoadError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("chile_dashboard_missing_dataset.json");
        assert!(matches!(
            load_from_path(&path),
            Err(DataLoadError::Io(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!(
            "chile_dashboard_dataset_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, sample_json()).unwrap();

        let dataset = load_from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(dataset.studied_crimes.len(), 2);
    }

    #[test]
    fn source_classification() {
        assert_eq!(
            DatasetSource::parse("https://example.org/series.json"),
            DatasetSource::Url("https://example.org/series.json".to_owned())
        );
        assert_eq!(
            DatasetSource::parse(DEFAULT_DATA_PATH),
            DatasetSource::Path(PathBuf::from("data/series.json"))
        );
    }

    /// Serves one canned HTTP response on a local port and returns its URL.
    async fn serve_once(status_line: &'static str, body: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await.unwrap();
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/series.json")
    }

    #[tokio::test]
    async fn non_success_status_fails_fetch() {
        let url = serve_once("404 Not Found", String::new()).await;

        let err = fetch_dataset(&url).await.unwrap_err();
        assert!(
            matches!(err, DataLoadError::Status { status: 404, url: ref failed } if *failed == url),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn url_source_fetches_over_http() {
        let url = serve_once("200 OK", sample_json()).await;
        let source = DatasetSource::parse(&url);
        assert_eq!(source, DatasetSource::Url(url.clone()));

        let dataset = source.load().await.unwrap();
        assert_eq!(dataset.years, vec![2021, 2023]);
        assert_eq!(dataset.studied_crimes.len(), 2);
    }
}
