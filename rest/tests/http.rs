//! End-to-end tests of the request loop against a scripted local server.

use std::time::{Duration, Instant};

use reqwest::Method;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use accord_model::{Snowflake, User};
use accord_rest::{Endpoint, Error, RestClient};

fn response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {}\r\n", status);
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str(&format!(
        "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    out
}

/// Serves one scripted response per connection, in order, then stops.
async fn serve_script(listener: TcpListener, responses: Vec<String>) {
    for scripted in responses {
        let (mut sock, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(_) => return,
        };
        let mut buf = vec![0u8; 8192];
        let mut read = 0;
        loop {
            match sock.read(&mut buf[read..]).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
            }
        }
        let _ = sock.write_all(scripted.as_bytes()).await;
        let _ = sock.shutdown().await;
    }
}

async fn client_against(responses: Vec<String>) -> RestClient {
    let _ = env_logger::builder().is_test(true).try_init();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_script(listener, responses));
    RestClient::new(String::from("Bot test"), true)
        .set_base_url(format!("http://{}/api/v6", addr))
}

fn user_body(id: u64) -> String {
    format!(r#"{{"id":"{}","username":"aya","discriminator":"0001"}}"#, id)
}

#[tokio::test]
async fn a_global_429_delays_and_then_succeeds() {
    let client = client_against(vec![
        response(
            "429 Too Many Requests",
            &[("X-RateLimit-Global", "true"), ("Retry-After", "300")],
            r#"{"message":"You are being rate limited.","retry_after":300,"global":true}"#,
        ),
        response("200 OK", &[], &user_body(1)),
    ])
    .await;

    let start = Instant::now();
    let user: User = client
        .request(Endpoint::new(Method::GET, String::from("/users/1")))
        .await
        .unwrap();
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert_eq!(user.id, Snowflake(1));
}

#[tokio::test]
async fn server_relative_redirects_inside_the_base_are_followed() {
    let client = client_against(vec![
        response("302 Found", &[("Location", "/api/v6/users/2")], ""),
        response("200 OK", &[], &user_body(2)),
    ])
    .await;

    let user: User = client
        .request(Endpoint::new(Method::GET, String::from("/users/1")))
        .await
        .unwrap();
    assert_eq!(user.id, Snowflake(2));
}

#[tokio::test]
async fn absolute_redirects_outside_the_base_are_refused() {
    let client = client_against(vec![response(
        "302 Found",
        &[("Location", "https://elsewhere.example/api/v6/users/2")],
        "",
    )])
    .await;

    let err = client
        .request::<User>(Endpoint::new(Method::GET, String::from("/users/1")))
        .await
        .unwrap_err();
    match err {
        Error::BadRedirect(location) => assert!(location.contains("elsewhere.example")),
        other => panic!("expected BadRedirect, got {:?}", other),
    }
}

#[tokio::test]
async fn client_errors_surface_with_their_body() {
    let client = client_against(vec![response(
        "404 Not Found",
        &[],
        r#"{"message":"Unknown Channel","code":10003}"#,
    )])
    .await;

    let err = client
        .request::<User>(Endpoint::new(Method::GET, String::from("/channels/42")))
        .await
        .unwrap_err();
    match err {
        Error::Http { status: 404, body } => assert!(body.contains("Unknown Channel")),
        other => panic!("expected Http, got {:?}", other),
    }
}

#[tokio::test]
async fn persistent_rate_limiting_exhausts_after_five_attempts() {
    let rate_limited = response(
        "429 Too Many Requests",
        &[("X-RateLimit-Global", "true"), ("Retry-After", "50")],
        r#"{"message":"You are being rate limited.","retry_after":50,"global":true}"#,
    );
    let client = client_against(vec![rate_limited.clone(); 5]).await;

    let err = client
        .request::<User>(Endpoint::new(Method::GET, String::from("/users/1")))
        .await
        .unwrap_err();
    match err {
        Error::RetryExhausted => {}
        other => panic!("expected RetryExhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn no_content_maps_to_unit() {
    let client = client_against(vec![response("204 No Content", &[], "")]).await;
    client
        .request::<()>(Endpoint::new(Method::DELETE, String::from("/channels/1/pins/2")))
        .await
        .unwrap();
}
