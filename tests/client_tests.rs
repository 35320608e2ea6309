/// `StatsClient` against a local HTTP server.
///
/// The server answers a fixed list of (status, body) pairs in order, then
/// shuts down.
use std::thread;

use statdash::analytics::logger;
use statdash::api::{Endpoint, FetchError, Query, StatsClient};
use statdash::config::StatdashConfig;
use tiny_http::{Header, Response, Server, StatusCode};

fn serve(replies: Vec<(u16, &'static str)>) -> (String, thread::JoinHandle<Vec<String>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in replies {
            let request = server.recv().unwrap();
            seen.push(request.url().to_string());
            let header = Header::from_bytes("Content-Type", "application/json").unwrap();
            let response = Response::from_string(body)
                .with_header(header)
                .with_status_code(StatusCode(status));
            request.respond(response).unwrap();
        }
        seen
    });

    (format!("http://{addr}"), handle)
}

fn client_for(base: &str, log: &std::path::Path) -> StatsClient {
    let mut config = StatdashConfig::default();
    config.api.base_url = base.to_string();
    config.api.timeout_ms = 5_000;
    config.logging.path = log.to_string_lossy().into_owned();
    StatsClient::from_config(&config)
}

#[test]
fn fetch_decodes_json_and_sends_query() {
    let (base, server) = serve(vec![(200, r#"[{"Age": 55, "pres": 1.2}]"#)]);
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&base, &dir.path().join("fetch.jsonl"));

    let query = Query::new().with("var", "Age");
    let body = client.fetch_json(Endpoint::Scatter, &query).unwrap();
    assert_eq!(body[0]["pres"], 1.2);

    let seen = server.join().unwrap();
    assert_eq!(seen, vec!["/scatter?var=Age"]);
}

#[test]
fn http_error_status_is_reported_with_code() {
    let (base, server) = serve(vec![(500, r#"{"detail": "boom"}"#)]);
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&base, &dir.path().join("fetch.jsonl"));

    let err = client.fetch_json(Endpoint::Lm, &Query::new()).unwrap_err();
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(err.kind(), "status");
    server.join().unwrap();
}

#[test]
fn non_json_body_is_malformed() {
    let (base, server) = serve(vec![(200, "<html>waking up</html>")]);
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&base, &dir.path().join("fetch.jsonl"));

    let err = client.fetch_json(Endpoint::Summary, &Query::new()).unwrap_err();
    assert!(matches!(err, FetchError::Malformed { .. }));
    server.join().unwrap();
}

#[test]
fn every_fetch_is_logged() {
    let (base, server) = serve(vec![(203, "[]"), (503, "{}"), (200, "not json")]);
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("fetch.jsonl");
    let client = client_for(&base, &log);

    client.fetch_json(Endpoint::Data, &Query::new()).unwrap();
    client.fetch_json(Endpoint::Stats, &Query::new()).unwrap_err();
    client.fetch_json(Endpoint::Calibration, &Query::new()).unwrap_err();
    server.join().unwrap();

    let entries = logger::read_all_entries(&log);
    assert_eq!(entries.len(), 3);
    assert!(entries[0].ok);
    assert_eq!(entries[0].endpoint, "/data");
    assert_eq!(entries[0].status, Some(203));
    assert!(!entries[1].ok);
    assert_eq!(entries[1].status, Some(503));
    assert_eq!(entries[2].status, Some(200));
    assert_eq!(entries[2].error_kind.as_deref(), Some("malformed"));
}

#[test]
fn default_config_fetches_without_timeout() {
    let (base, server) = serve(vec![(200, "{}")]);

    let mut config = StatdashConfig::default();
    assert_eq!(config.api.timeout_ms, 0);
    config.api.base_url = base;
    config.logging.enabled = false;
    let client = StatsClient::from_config(&config);

    assert!(client.fetch_json(Endpoint::Stats, &Query::new()).is_ok());
    server.join().unwrap();
}

#[test]
fn unreachable_api_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let server = Server::http("127.0.0.1:0").unwrap();
        server.server_addr().to_ip().unwrap()
    };
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(&format!("http://{addr}"), &dir.path().join("fetch.jsonl"));

    let err = client.fetch_json(Endpoint::Variables, &Query::new()).unwrap_err();
    assert_eq!(err.kind(), "transport");
    assert!(!client.is_healthy());
}
