#![cfg(feature = "web")]

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::Router;
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use serde_json::{Value, json};
use sheetplot::app::{AppState, router};
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "sheetplot-test-boundary";

fn app() -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new());
    (state.clone(), router(state, 1024 * 1024))
}

/// Workbook whose first sheet has a header `A, B` and the given rows.
fn workbook(rows: &[[Option<f64>; 2]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "A").unwrap();
    sheet.write_string(0, 1, "B").unwrap();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if let Some(v) = value {
                sheet.write_number(r as u32 + 1, c as u16, *v).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

fn upload_request(field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn page_and_assets_are_served() {
    let (_, app) = app();

    let (status, body) = send(&app, request(Method::GET, "/")).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("id=\"dropzone\""));

    let (status, _) = send(&app, request(Method::GET, "/static/app.js")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn fresh_app_has_nothing_to_render() {
    let (_, app) = app();

    let (status, state) = send_json(&app, request(Method::GET, "/api/state")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["status"], "empty");
    assert_eq!(state["charts_enabled"], false);

    let (status, body) = send(&app, request(Method::GET, "/api/figure")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn selecting_a_chart_before_upload_renders_nothing() {
    let (_, app) = app();

    let (status, payload) = send_json(&app, request(Method::PUT, "/api/chart/bar")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["figure"], Value::Null);
    assert_eq!(payload["state"]["selected"], "bar");
}

#[tokio::test]
async fn upload_then_pie_counts_rows() {
    let (_, app) = app();
    let bytes = workbook(&[[Some(1.0), Some(2.0)], [None, None], [Some(3.0), Some(4.0)]]);

    let (status, state) = send_json(&app, upload_request("file", "data.xlsx", &bytes)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["status"], "loaded");
    assert_eq!(state["file_name"], "data.xlsx");
    assert_eq!(state["columns"], json!(["A", "B"]));
    assert_eq!(state["row_count"], 2);

    let (status, payload) = send_json(&app, request(Method::PUT, "/api/chart/pie")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        payload["figure"]["data"],
        json!([{ "type": "pie", "name": "Pie Chart", "labels": ["A", "B"], "values": [2, 2] }])
    );

    let active: Vec<&Value> = payload["state"]["buttons"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b["active"] == true)
        .map(|b| &b["kind"])
        .collect();
    assert_eq!(active, vec![&json!("pie")]);
}

#[tokio::test]
async fn reupload_replaces_rows_and_keeps_selection() {
    let (state, app) = app();

    let first = workbook(&[[Some(1.0), Some(1.0)], [Some(2.0), Some(2.0)], [Some(3.0), Some(3.0)]]);
    send(&app, upload_request("file", "first.xlsx", &first)).await;
    send(&app, request(Method::PUT, "/api/chart/line")).await;

    let second = workbook(&[[Some(9.0), None]]);
    let (status, summary) = send_json(&app, upload_request("file", "second.xlsx", &second)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["row_count"], 1);
    assert_eq!(summary["selected"], "line");

    let (_, figure) = send_json(&app, request(Method::GET, "/api/figure")).await;
    assert_eq!(figure["data"][0]["x"], json!([9]));
    assert_eq!(figure["data"][1]["x"], json!([null]));
    assert_eq!(state.current().file_name(), Some("second.xlsx"));
}

#[tokio::test]
async fn undecodable_upload_is_reported_and_disables_charts() {
    let (_, app) = app();
    let good = workbook(&[[Some(1.0), Some(2.0)]]);
    send(&app, upload_request("file", "good.xlsx", &good)).await;
    send(&app, request(Method::PUT, "/api/chart/scatter")).await;

    let (status, state) =
        send_json(&app, upload_request("file", "broken.xlsx", b"this is not a workbook")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(state["status"], "failed");
    assert_eq!(state["file_name"], "broken.xlsx");
    assert_eq!(state["charts_enabled"], false);
    assert_eq!(state["row_count"], 0);
    assert!(state["error"].as_str().unwrap().contains("broken.xlsx"));

    let (status, _) = send(&app, request(Method::GET, "/api/figure")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request(Method::GET, "/api/export/csv")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_without_file_field_is_a_bad_request() {
    let (_, app) = app();

    let (status, body) = send_json(&app, upload_request("other", "x.xlsx", b"abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn unknown_chart_kind_is_rejected() {
    let (_, app) = app();

    let (status, body) = send_json(&app, request(Method::PUT, "/api/chart/area")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("area"));
}

#[tokio::test]
async fn clearing_the_chart_stops_rendering() {
    let (_, app) = app();
    let bytes = workbook(&[[Some(1.0), Some(2.0)]]);
    send(&app, upload_request("file", "data.xlsx", &bytes)).await;
    send(&app, request(Method::PUT, "/api/chart/histogram")).await;

    let (status, state) = send_json(&app, request(Method::DELETE, "/api/chart")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["selected"], Value::Null);

    let (status, _) = send(&app, request(Method::GET, "/api/figure")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request(Method::GET, "/api/chart.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cleaned_rows_download_as_csv() {
    let (_, app) = app();
    let bytes = workbook(&[[Some(1.0), Some(2.0)], [None, None], [Some(3.5), None]]);
    send(&app, upload_request("file", "sales 2024.xlsx", &bytes)).await;

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/api/export/csv"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"sales_2024-clean.csv\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"A,B\n1,2\n3.5,\n");

    let (status, _) = send(&app, request(Method::GET, "/api/export/xlsx")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, request(Method::GET, "/api/export/pdf")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_upload_is_refused() {
    let state = Arc::new(AppState::new());
    let app = router(state, 64);
    let bytes = vec![b'x'; 4096];

    let (status, body) = send_json(&app, upload_request("file", "big.csv", &bytes)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn page_script_reports_failed_requests() {
    let (_, app) = app();

    let (_, body) = send(&app, request(Method::GET, "/static/app.js")).await;
    let script = String::from_utf8(body).unwrap();
    assert!(script.contains("Unexpected response from the server"));
    assert!(script.contains(".catch((err) => showError(err.message))"));
    assert_eq!(script.matches("showError(err.message);").count(), 2);
}

#[tokio::test]
async fn text_upload_without_csv_extension_is_sniffed() {
    let (_, app) = app();

    let (status, state) =
        send_json(&app, upload_request("file", "export.txt", b"a\n1,2\n,5\n")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["columns"], json!(["a", "__EMPTY"]));
    assert_eq!(state["row_count"], 2);
}
