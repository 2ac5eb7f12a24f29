use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::{
    pipeline::{FacilityScope, ReportArtifact, ReportError, ReportPipeline},
    report::{Category, ReportSummary},
    sources::DataSource,
};

const FAILED_FACILITIES_HEADER: HeaderName = HeaderName::from_static("x-report-failed-facilities");

#[derive(Debug, serde::Deserialize)]
pub struct ReportQuery {
    pub facility: Option<String>,
}

#[derive(Debug)]
pub enum HttpError {
    UnknownCategory(String),
    Report(ReportError),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            Self::UnknownCategory(c) => {
                (StatusCode::NOT_FOUND, format!("unknown report category '{c}'")).into_response()
            }
            Self::Report(e @ ReportError::FacilityList(_)) => {
                (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
            }
            Self::Report(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        }
    }
}

/// `GET /reports/{category}` serves the CSV, `GET /reports/{category}/summary` its JSON summary.
pub fn router<D>(pipeline: Arc<ReportPipeline<D>>) -> Router
where
    D: DataSource + 'static,
{
    Router::new()
        .route("/reports/:category", get(download_report::<D>))
        .route("/reports/:category/summary", get(report_summary::<D>))
        .with_state(pipeline)
}

fn parse_category(raw: &str) -> Result<Category, HttpError> {
    raw.parse()
        .map_err(|_| HttpError::UnknownCategory(raw.to_string()))
}

pub async fn download_report<D>(
    State(pipeline): State<Arc<ReportPipeline<D>>>,
    Path(category): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, HttpError>
where
    D: DataSource + 'static,
{
    metrics::counter!("http_report_requests_total").increment(1);

    let category = parse_category(&category)?;
    let scope = FacilityScope::from(query.facility);
    let outcome = pipeline.run(category, &scope).await.map_err(HttpError::Report)?;

    Ok(artifact_response(outcome.artifact, outcome.failures.len()))
}

pub async fn report_summary<D>(
    State(pipeline): State<Arc<ReportPipeline<D>>>,
    Path(category): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportSummary>, HttpError>
where
    D: DataSource + 'static,
{
    let category = parse_category(&category)?;
    let scope = FacilityScope::from(query.facility);
    let outcome = pipeline.run(category, &scope).await.map_err(HttpError::Report)?;

    Ok(Json(outcome.summary()))
}

fn artifact_response(artifact: ReportArtifact, failed_facilities: usize) -> Response {
    let disposition = content_disposition(&artifact.filename);
    let mut response = (StatusCode::OK, artifact.bytes).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(artifact.content_type));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.insert(FAILED_FACILITIES_HEADER, HeaderValue::from(failed_facilities));

    response
}

/// ASCII fallback plus an RFC 5987 `filename*` for non-ASCII facility names.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();

    let mut encoded = String::with_capacity(filename.len() * 3);
    for b in filename.bytes() {
        if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{report::Taxonomy, sources::SourceError};
    use facility_client::domain::{Facility, Meter, MeterType, Reading};

    struct EmptySource {
        fail_list: bool,
    }

    #[async_trait::async_trait]
    impl DataSource for EmptySource {
        async fn facilities(&self) -> Result<Vec<Facility>, SourceError> {
            if self.fail_list {
                Err(SourceError::Database("down".to_string()))
            } else {
                Ok(vec![])
            }
        }

        async fn meters(&self, _facility: &str) -> Result<Vec<Meter>, SourceError> {
            Ok(vec![])
        }

        async fn readings(&self, _facility: &str, _types: &[MeterType]) -> Result<Vec<Reading>, SourceError> {
            Ok(vec![])
        }
    }

    fn pipeline(fail_list: bool) -> Arc<ReportPipeline<EmptySource>> {
        Arc::new(ReportPipeline::new(EmptySource { fail_list }, Taxonomy::default()))
    }

    #[test]
    fn disposition_encodes_non_ascii_names() {
        let value = content_disposition("Raport_Woda_Łódź.csv");
        assert!(value.starts_with("attachment; filename=\"Raport_Woda___d_.csv\";"));
        assert!(value.contains("filename*=UTF-8''Raport_Woda_%C5%81%C3%B3d%C5%BA.csv"));
        assert!(HeaderValue::from_str(&value).is_ok());
    }

    #[tokio::test]
    async fn download_sets_csv_headers() {
        let response = download_report(
            State(pipeline(false)),
            Path("heat".to_string()),
            Query(ReportQuery {
                facility: Some("Blok A".to_string()),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv;charset=utf-8");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("Raport_Cieplo_Blok_A.csv"));
        assert_eq!(headers[FAILED_FACILITIES_HEADER], "0");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("Lokal;nr licznika;PPE;jednostka;mnozna;grudzien 2024;"));
        assert_eq!(text.matches("\r\n").count(), 2);
    }

    #[tokio::test]
    async fn unknown_category_is_not_found() {
        let res = download_report(
            State(pipeline(false)),
            Path("gas".to_string()),
            Query(ReportQuery { facility: None }),
        )
        .await;

        let response = res.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn facility_list_failure_is_bad_gateway() {
        let res = report_summary(
            State(pipeline(true)),
            Path("water".to_string()),
            Query(ReportQuery { facility: None }),
        )
        .await;

        let response = res.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
