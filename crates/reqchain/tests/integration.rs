//! Integration tests for reqchain using mockito

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use mockito::Matcher;
use reqchain::{request, Cookie, HttpClient, HttpError, Params, TYPE_JSON};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Content {
    code: String,
    msg: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestPayload {
    name: String,
    value: i32,
    tags: Vec<String>,
}

fn init_logging() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    // several tests race to install the subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

fn echo_body(request: &mockito::Request) -> Vec<u8> {
    request.body().cloned().unwrap_or_default()
}

const SLOW_RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nslow";

/// Server answering every connection with `200 slow` after `delay`
async fn slow_server(delay: Duration) -> (SocketAddr, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Bind listener");
    let addr = listener.local_addr().expect("Local addr");
    let handle = tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(delay).await;
                let _ = socket.write_all(SLOW_RESPONSE).await;
            });
        }
    });
    (addr, handle)
}

// === Request assembly on the wire ===

#[tokio::test]
async fn test_get_params_in_query() {
    init_logging();
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("foo".into(), "bar".into()),
            Matcher::UrlEncoded("name".into(), "中文".into()),
        ]))
        .with_status(200)
        .with_body("found")
        .create_async()
        .await;

    let mut params = Params::new();
    params.set("foo", "bar");
    params.set("name", "中文");

    let mut response = request("get", format!("{}/search", server.url()))
        .params(params)
        .exec()
        .await;

    assert!(response.error().is_none());
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text().await.expect("Body"), "found");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_form_body() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/form")
        .match_header(
            "content-type",
            "application/x-www-form-urlencoded;charset=utf-8",
        )
        .match_body(Matcher::Exact("foo=bar&hello=world".to_string()))
        .with_status(200)
        .create_async()
        .await;

    let response = request("post", format!("{}/form", server.url()))
        .param("foo", "bar")
        .param("hello", "world")
        .exec()
        .await;

    assert!(response.error().is_none());
    assert!(response.is_success());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_raw_body_with_query_params() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/raw")
        .match_query(Matcher::UrlEncoded("foo".into(), "bar".into()))
        .match_body(Matcher::Exact("success".to_string()))
        .with_status(200)
        .with_body_from_request(echo_body)
        .create_async()
        .await;

    let mut response = request("post", format!("{}/raw", server.url()))
        .body("success")
        .param("foo", "bar")
        .exec()
        .await;

    assert_eq!(response.text().await.expect("Body"), "success");
    assert_eq!(&response.bytes().await.expect("Cached body")[..], b"success");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_file_upload_multipart() {
    init_logging();
    let mut file = tempfile::NamedTempFile::new().expect("Temp file");
    file.write_all(b"line one\nline two").expect("Write");

    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/upload")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=[0-9a-f]+$".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="attachment"; filename="notes.txt""#.to_string()),
            Matcher::Regex("line one\nline two".to_string()),
            Matcher::Regex("name=\"owner\"\r\n\r\nalice".to_string()),
        ]))
        .with_status(201)
        .create_async()
        .await;

    let response = request("post", format!("{}/upload", server.url()))
        .file("attachment", "notes.txt", file.path())
        .param("owner", "alice")
        .exec()
        .await;

    assert!(response.error().is_none());
    assert_eq!(response.status_code(), 201);

    mock.assert_async().await;
}

// === Decoding ===

#[tokio::test]
async fn test_json_decode() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/data")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"code":"0","msg":"success"}"#)
        .create_async()
        .await;

    let mut response = request("get", format!("{}/api/data", server.url()))
        .exec()
        .await;
    let content: Content = response.json().await.expect("Valid JSON");

    assert_eq!(
        content,
        Content {
            code: "0".to_string(),
            msg: "success".to_string()
        }
    );

    mock.assert_async().await;
}

#[tokio::test]
async fn test_json_round_trip() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/echo")
        .match_header("content-type", TYPE_JSON)
        .match_body(Matcher::Json(serde_json::json!({
            "name": "test",
            "value": 42,
            "tags": ["a", "b"]
        })))
        .with_status(200)
        .with_body_from_request(echo_body)
        .create_async()
        .await;

    let payload = TestPayload {
        name: "test".to_string(),
        value: 42,
        tags: vec!["a".to_string(), "b".to_string()],
    };
    let mut response = request("post", format!("{}/echo", server.url()))
        .json(&payload)
        .exec()
        .await;
    let echoed: TestPayload = response.json().await.expect("Valid JSON");

    assert_eq!(echoed, payload);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_xml_round_trip() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("PUT", "/echo")
        .match_header("content-type", "application/xml;charset=utf-8")
        .with_status(200)
        .with_body_from_request(echo_body)
        .create_async()
        .await;

    let content = Content {
        code: "0".to_string(),
        msg: "success".to_string(),
    };
    let mut response = request("put", format!("{}/echo", server.url()))
        .xml(&content)
        .exec()
        .await;
    let echoed: Content = response.xml().await.expect("Valid XML");

    assert_eq!(echoed, content);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_for_status() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let mut response = request("get", format!("{}/missing", server.url()))
        .exec()
        .await;

    assert!(response.is_client_error());
    assert_eq!(
        response.error_for_status().await,
        Err(HttpError::Status {
            status: 404,
            message: "Not Found".to_string()
        })
    );

    mock.assert_async().await;
}

// === Cookies ===

#[tokio::test]
async fn test_cookies_sent_and_received() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/profile")
        .match_header("cookie", "session=abc; theme=dark")
        .with_status(200)
        .with_header("set-cookie", "visited=yes; Path=/")
        .create_async()
        .await;

    let response = request("get", format!("{}/profile", server.url()))
        .add_cookie(Cookie::new("session", "abc"))
        .add_cookie(Cookie::new("theme", "dark"))
        .exec()
        .await;

    let cookies = response.cookies();
    assert_eq!(cookies.len(), 1);
    assert_eq!(cookies[0].name(), "visited");
    assert_eq!(cookies[0].value(), "yes");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_shared_client_keeps_cookie_jar() {
    let mut server = mockito::Server::new_async().await;

    let login = server
        .mock("POST", "/login")
        .with_status(200)
        .with_header("set-cookie", "session=xyz; Path=/")
        .create_async()
        .await;
    let account = server
        .mock("GET", "/account")
        .match_header("cookie", Matcher::Regex("session=xyz".to_string()))
        .with_status(200)
        .create_async()
        .await;

    let client = HttpClient::new();
    let first = client.post(&format!("{}/login", server.url())).exec().await;
    assert!(first.is_success());
    let second = client
        .get(&format!("{}/account", server.url()))
        .exec()
        .await;
    assert!(second.is_success());

    login.assert_async().await;
    account.assert_async().await;
}

// === Diagnostics ===

#[tokio::test]
async fn test_dump_request_and_response() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/dump")
        .with_status(200)
        .with_header("x-served-by", "mockito")
        .with_body("dumped")
        .create_async()
        .await;

    let mut response = request("post", format!("{}/dump", server.url()))
        .header("X-Request-Id", "42")
        .body("payload")
        .param("q", "1")
        .exec()
        .await;

    let dumped_request = response.dump_request(true).expect("Request dump");
    assert!(dumped_request.starts_with("POST /dump?q=1 HTTP/1.1\r\n"));
    assert!(dumped_request.contains("X-Request-Id: 42\r\n"));
    assert!(dumped_request.ends_with("\r\n\r\npayload"));

    let dumped_response = response.dump_response(true).await.expect("Response dump");
    assert!(dumped_response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(dumped_response.contains("X-Served-By: mockito\r\n"));
    assert!(dumped_response.ends_with("dumped"));

    assert!(response.took() > Duration::ZERO);

    mock.assert_async().await;
}

// === Client settings ===

#[tokio::test]
async fn test_client_fractional_timeout() {
    init_logging();
    let (addr, server) = slow_server(Duration::from_millis(1200)).await;

    let client = HttpClient::builder()
        .timeout(Duration::from_millis(1500))
        .build()
        .expect("Client");
    let mut response = client.get(&format!("http://{addr}/slow")).exec().await;

    assert!(response.error().is_none(), "{:?}", response.error());
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text().await.expect("Body"), "slow");

    server.abort();
}

#[tokio::test]
async fn test_client_sub_second_timeout() {
    let (addr, server) = slow_server(Duration::from_secs(5)).await;

    let client = HttpClient::builder()
        .timeout(Duration::from_millis(300))
        .build()
        .expect("Client");
    let response = client.get(&format!("http://{addr}/slow")).exec().await;

    assert_eq!(response.error(), Some(&HttpError::Timeout));
    assert!(response.took() >= Duration::from_millis(250));
    assert!(response.took() < Duration::from_secs(1));

    server.abort();
}

#[tokio::test]
async fn test_request_routed_through_proxy() {
    init_logging();
    let mut proxy = mockito::Server::new_async().await;

    let mock = proxy
        .mock("GET", Matcher::Regex("/x$".to_string()))
        .with_status(200)
        .with_body("via proxy")
        .create_async()
        .await;

    // the upstream host does not resolve, only the proxy can answer
    let builder = request("get", "http://upstream.invalid/x")
        .proxy(proxy.url())
        .danger_accept_invalid_certs(true);
    assert_eq!(builder.client_config().proxy.as_deref(), Some(proxy.url().as_str()));
    assert!(builder.client_config().accept_invalid_certs);

    let mut response = builder.exec().await;

    assert!(response.error().is_none(), "{:?}", response.error());
    assert_eq!(response.text().await.expect("Body"), "via proxy");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_shared_client_routed_through_proxy() {
    let mut proxy = mockito::Server::new_async().await;

    let mock = proxy
        .mock("POST", Matcher::Regex("/submit$".to_string()))
        .match_body(Matcher::Exact("a=1".to_string()))
        .with_status(202)
        .create_async()
        .await;

    let client = HttpClient::builder()
        .proxy(url::Url::parse(&proxy.url()).expect("Proxy URL"))
        .build()
        .expect("Client");
    let response = client
        .post("http://upstream.invalid/submit")
        .param("a", "1")
        .exec()
        .await;

    assert_eq!(response.status_code(), 202);

    mock.assert_async().await;
}

// === Failures ===

#[tokio::test]
async fn test_builder_error_makes_no_request() {
    let mut server = mockito::Server::new_async().await;

    let mock = server.mock("POST", "/never").expect(0).create_async().await;

    let mut unserializable = std::collections::HashMap::new();
    unserializable.insert((1, 2), "tuple keys are not JSON");

    let mut response = request("post", format!("{}/never", server.url()))
        .json(&unserializable)
        .exec()
        .await;

    assert!(matches!(response.error(), Some(HttpError::Serialization(_))));
    assert_eq!(response.status_code(), 503);
    assert!(response.bytes().await.is_err());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_timeout() {
    init_logging();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Bind listener");
    let addr = listener.local_addr().expect("Local addr");
    // accept and hold connections without answering
    let holder = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let response = request("get", format!("http://{addr}/slow"))
        .timeout(Duration::from_millis(200))
        .exec()
        .await;

    assert_eq!(response.error(), Some(&HttpError::Timeout));
    assert_eq!(response.status_code(), 503);
    assert!(response.request().is_some());

    holder.abort();
}
