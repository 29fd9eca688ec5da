//! End-to-end tests of the ureq transport against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port on a background thread,
//! then drives `HttpClient::default()` (global registry, ureq backend) over
//! real HTTP.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use httpkit_core::{
    HttpClient, HttpError, Method, QueryParam, RequestOptions, TransportRegistry, UreqTransport,
};
use mock_server::Echo;

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

#[test]
fn get_sends_user_agent_and_appends_body_as_query() {
    let addr = start_server();
    let opts = RequestOptions::default()
        .with_user_agent("httpkit-test/1")
        .with_body("q=rust");
    let response = HttpClient::default()
        .request(&format!("http://{addr}/echo"), opts)
        .unwrap();

    assert_eq!(response.status_code, 200);
    let echo: Echo = serde_json::from_str(&response.body).unwrap();
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.as_deref(), Some("q=rust"));
    assert_eq!(
        echo.headers.get("user-agent").map(String::as_str),
        Some("httpkit-test/1")
    );
    assert_eq!(response.header("content-type"), Some("application/json"));
}

#[test]
fn post_form_body_is_encoded() {
    let addr = start_server();
    let mut form = std::collections::BTreeMap::new();
    form.insert("tags".to_string(), QueryParam::List(vec!["b".into(), "a".into()]));
    form.insert("name".to_string(), QueryParam::from("Ada Lovelace"));

    let response = HttpClient::default()
        .post(&format!("http://{addr}/echo"), form)
        .unwrap();

    let echo: Echo = serde_json::from_str(&response.body).unwrap();
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, "name=Ada%20Lovelace&tags=a&tags=b");
    assert_eq!(
        echo.headers.get("content-type").map(String::as_str),
        Some("application/x-www-form-urlencoded")
    );
}

#[test]
fn redirect_chain_records_every_hop() {
    let addr = start_server();
    let response = HttpClient::default()
        .get(&format!("http://{addr}/redirect/3"))
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "done");
    assert_eq!(response.headers.len(), 4);
    assert_eq!(response.headers[0].status_code, 200);
    assert_eq!(response.headers[0].get("x-final"), Some("yes"));
    assert_eq!(response.headers[1].get("location"), Some("/redirect/0"));
    assert_eq!(response.headers[3].status_code, 302);
    assert_eq!(response.headers[3].get("location"), Some("/redirect/2"));
    assert_eq!(response.headers[3].status_text, "Found");
}

#[test]
fn max_redirects_limits_hops() {
    let addr = start_server();
    let client = HttpClient::default();
    let url = format!("http://{addr}/redirect/3");

    let response = client
        .request(&url, RequestOptions::default().with_max_redirects(1))
        .unwrap();
    assert_eq!(response.status_code, 302);
    assert_eq!(response.headers.len(), 2);

    let response = client
        .request(&url, RequestOptions::default().with_max_redirects(0))
        .unwrap();
    assert_eq!(response.status_code, 302);
    assert_eq!(response.headers.len(), 1);
    assert_eq!(response.header("location"), Some("/redirect/2"));
}

#[test]
fn relative_location_is_resolved() {
    let addr = start_server();
    let response = HttpClient::default()
        .get(&format!("http://{addr}/relative/start"))
        .unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "finished from=start");
    assert_eq!(response.headers[1].status_code, 303);
}

#[test]
fn error_statuses_are_returned_as_data() {
    let addr = start_server();
    let response = HttpClient::default()
        .get(&format!("http://{addr}/status/404"))
        .unwrap();
    assert_eq!(response.status_code, 404);
    assert_eq!(response.body, "status 404");
    assert!(!response.is_success());
}

#[test]
fn head_request_has_no_body() {
    let addr = start_server();
    let response = HttpClient::default()
        .head(&format!("http://{addr}/bytes/10"))
        .unwrap();
    assert_eq!(response.status_code, 200);
    assert!(response.body.is_empty());
}

#[test]
fn timeout_is_transport_failure() {
    let addr = start_server();
    let opts = RequestOptions::default().with_timeout_secs(1.0);
    let err = HttpClient::default()
        .request(&format!("http://{addr}/slow/3000"), opts)
        .unwrap_err();
    assert!(matches!(err, HttpError::TransportIo { .. }), "got {err}");
}

#[test]
fn timeout_covers_the_whole_redirect_chain() {
    let addr = start_server();
    let opts = RequestOptions::default().with_timeout_secs(1.0);
    let started = Instant::now();
    let err = HttpClient::default()
        .request(&format!("http://{addr}/slow-redirect/4"), opts)
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, HttpError::TransportIo { .. }), "got {err}");
    assert!(elapsed < Duration::from_millis(1900), "took {elapsed:?}");
}

#[test]
fn slow_redirect_chain_within_timeout_succeeds() {
    let addr = start_server();
    let opts = RequestOptions::default().with_timeout_secs(5.0);
    let response = HttpClient::default()
        .request(&format!("http://{addr}/slow-redirect/1"), opts)
        .unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "end");
    assert_eq!(response.headers.len(), 2);
}

#[test]
fn large_body_is_read_in_full() {
    let addr = start_server();
    let len = 11 * 1024 * 1024;
    let response = HttpClient::default()
        .request(
            &format!("http://{addr}/bytes/{len}"),
            RequestOptions::default().with_timeout_secs(30.0),
        )
        .unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body.len(), len);
    assert!(response.body.starts_with("abcdefghijklmnopqrstuvwxyza"));
}

#[test]
fn connection_refused_is_transport_failure() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let err = HttpClient::default()
        .get(&format!("http://{addr}/"))
        .unwrap_err();
    assert!(matches!(err, HttpError::TransportIo { .. }), "got {err}");
}

#[test]
fn body_can_be_saved_to_file() {
    let addr = start_server();
    let path = std::env::temp_dir().join(format!("httpkit-download-{}.bin", std::process::id()));
    let opts = RequestOptions::default().with_save_to_file(&path);
    let response = HttpClient::default()
        .request(&format!("http://{addr}/bytes/100"), opts)
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert!(response.body.is_empty());
    let saved = std::fs::read(&path).unwrap();
    assert_eq!(saved.len(), 100);
    assert_eq!(&saved[..4], b"abcd");
    std::fs::remove_file(path).unwrap();
}

#[test]
fn missing_download_directory_fails_before_io() {
    let opts = RequestOptions::default()
        .with_save_to_file(std::env::temp_dir().join("httpkit-no-such-dir/file.bin"));
    let registry = TransportRegistry::new().with(UreqTransport::new());
    let err = HttpClient::new(&registry)
        .request("http://127.0.0.1:9/never", opts)
        .unwrap_err();
    assert!(matches!(err, HttpError::FileSinkUnavailable { .. }), "got {err}");
}

#[test]
fn concurrent_requests_keep_their_own_headers() {
    let addr = start_server();
    let handles: Vec<_> = (0..4u32)
        .map(|hops| {
            std::thread::spawn(move || {
                let response = HttpClient::default()
                    .get(&format!("http://{addr}/redirect/{hops}"))
                    .unwrap();
                (hops, response.headers.len())
            })
        })
        .collect();

    for handle in handles {
        let (hops, blocks) = handle.join().unwrap();
        assert_eq!(blocks, hops as usize + 1);
    }
}

#[test]
fn options_from_json_drive_the_request() {
    let addr = start_server();
    let response = HttpClient::default()
        .request_with_json(
            &format!("http://{addr}/echo"),
            r#"{"method":"DELETE","headers":{"X-Trace":"42"}}"#,
        )
        .unwrap();
    let echo: Echo = serde_json::from_str(&response.body).unwrap();
    assert_eq!(echo.method, Method::Delete.as_str());
    assert_eq!(echo.headers.get("x-trace").map(String::as_str), Some("42"));
}
