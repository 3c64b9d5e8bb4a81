use std::sync::{Arc, Mutex};
use std::time::Duration;

use fincoach_core::{CoachError, FetchStatus, Store};
use fincoach_finance::{HttpApi, Orchestrator, RemoteApi};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const TWO_ROWS: &str = r#"[
    {"id": 1, "date": "2025-03-02", "merchant": "Cafe", "amount": -10.0, "category": "Food"},
    {"id": 2, "date": "2025-03-09", "merchant": "Airline", "amount": -20.0, "category": "Travel"}
]"#;

/// One canned reply, written verbatim after the status line.
struct Reply {
    status: &'static str,
    body: &'static str,
    /// Omit `Content-Length` (for 204).
    bare: bool,
}

fn reply(status: &'static str, body: &'static str) -> Reply {
    Reply {
        status,
        body,
        bare: false,
    }
}

/// Serve `replies` in order, one connection each, and record every request line.
async fn serve(replies: Vec<Reply>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        for r in replies {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let head = String::from_utf8_lossy(&buf);
            log.lock().unwrap().push(head.lines().next().unwrap_or("").to_string());

            let mut out = format!("HTTP/1.1 {}\r\nConnection: close\r\n", r.status);
            if !r.bare {
                out.push_str(&format!(
                    "Content-Type: application/json\r\nContent-Length: {}\r\n",
                    r.body.len()
                ));
            }
            out.push_str("\r\n");
            out.push_str(r.body);
            sock.write_all(out.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
        }
    });

    (format!("http://{addr}"), seen)
}

fn client(base_url: &str) -> HttpApi {
    HttpApi::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_transactions_query_carries_expenses_flag() {
    let (url, seen) = serve(vec![reply("200 OK", TWO_ROWS)]).await;
    let txns = client(&url).transactions(true).await.unwrap();
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[1].category.as_deref(), Some("Travel"));
    assert!(seen.lock().unwrap()[0].starts_with("GET /api/transactions?expenses_only=true "));
}

#[tokio::test]
async fn test_server_error_keeps_cached_transactions() {
    let (url, _) = serve(vec![
        reply("200 OK", TWO_ROWS),
        reply("500 Internal Server Error", "Internal Server Error"),
    ])
    .await;
    let orch = Orchestrator::new(client(&url));
    let store = Store::new();
    orch.get_transactions(&store, true).await.unwrap();

    let err = orch.refresh_transactions(&store, true).await.unwrap_err();
    assert!(matches!(err, CoachError::Network(ref m) if m.contains("500")));

    let state = store.transactions.list.snapshot();
    assert_eq!(state.data.items.len(), 2);
    assert!(!state.loading);
    assert_eq!(state.status, FetchStatus::Fetched);
    assert!(state.error.as_deref().is_some_and(|e| e.contains("Internal Server Error")));
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let (url, _) = serve(vec![reply(
        "400 Bad Request",
        r#"{"detail": "Missing required columns: merchant"}"#,
    )])
    .await;
    let err = client(&url).summary().await.unwrap_err();
    match err {
        CoachError::Network(m) => {
            assert!(m.contains("400"), "{m}");
            assert!(m.contains("Missing required columns: merchant"), "{m}");
            assert!(!m.contains("detail"), "{m}");
        }
        other => panic!("expected Network, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_success_body_is_malformed() {
    let (url, _) = serve(vec![reply("200 OK", r#"{"oops": "#)]).await;
    let orch = Orchestrator::new(client(&url));
    let store = Store::new();

    let err = orch.get_transactions(&store, true).await.unwrap_err();
    assert!(matches!(err, CoachError::Malformed { ref endpoint, .. } if endpoint == "/api/transactions"));
    assert!(store.transactions.list.read(|s| s.error.is_some()));
}

#[tokio::test]
async fn test_delete_all_with_no_content_empties_cache() {
    let (url, seen) = serve(vec![
        reply("200 OK", TWO_ROWS),
        Reply {
            status: "204 No Content",
            body: "",
            bare: true,
        },
    ])
    .await;
    let orch = Orchestrator::new(client(&url));
    let store = Store::new();
    orch.get_transactions(&store, true).await.unwrap();
    assert_eq!(store.transactions.items().len(), 2);

    assert_eq!(orch.delete_all(&store).await.unwrap(), None);
    assert!(store.transactions.items().is_empty());
    assert_eq!(store.transactions.list.read(|s| s.status), FetchStatus::NotFetched);
    assert!(seen.lock().unwrap()[1].starts_with("DELETE /api/transactions/all "));
}

#[tokio::test]
async fn test_delete_all_with_empty_ok_body_empties_cache() {
    let (url, _) = serve(vec![reply("200 OK", TWO_ROWS), reply("200 OK", "")]).await;
    let orch = Orchestrator::new(client(&url));
    let store = Store::new();
    orch.get_transactions(&store, true).await.unwrap();

    assert_eq!(orch.delete_all(&store).await.unwrap(), None);
    assert!(store.transactions.items().is_empty());
}

#[tokio::test]
async fn test_delete_all_message_is_returned() {
    let (url, _) = serve(vec![reply("200 OK", r#"{"message": "Deleted 2 transactions"}"#)]).await;
    let message = client(&url).delete_all().await.unwrap();
    assert_eq!(message.as_deref(), Some("Deleted 2 transactions"));
}

#[tokio::test]
async fn test_failed_delete_over_http_keeps_cache() {
    let (url, _) = serve(vec![
        reply("200 OK", TWO_ROWS),
        reply("503 Service Unavailable", r#"{"detail": "database locked"}"#),
    ])
    .await;
    let orch = Orchestrator::new(client(&url));
    let store = Store::new();
    orch.get_transactions(&store, true).await.unwrap();

    let err = orch.delete_all(&store).await.unwrap_err();
    assert!(matches!(err, CoachError::Network(ref m) if m.contains("database locked")));
    assert_eq!(store.transactions.items().len(), 2);
    assert_eq!(store.transactions.list.read(|s| s.status), FetchStatus::Fetched);
}
