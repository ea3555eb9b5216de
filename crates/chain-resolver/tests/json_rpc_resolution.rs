//! End-to-end resolution through a JSON-RPC chain id lookup against a
//! single-shot local HTTP responder.

use chain_resolver::{
    builtin_chains, resolve_chain, ChainConfig, ChainIdSource, ChainResolutionError,
    FixedChainId, JsonRpcChainIdSource, LOCAL_NETWORK_NAME,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one HTTP request with `body`, returning the request text seen.
async fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            request.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if request.len() >= header_end + 4 + content_length || n == 0 {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).into_owned()
    });

    (url, handle)
}

fn custom(name: &str, id: u64) -> ChainConfig {
    ChainConfig::new(name, id, &format!("https://api.{name}"), &format!("https://{name}"))
}

#[tokio::test]
async fn test_json_rpc_chain_id_resolves_last_custom() {
    let (url, server) = serve_once(r#"{"jsonrpc":"2.0","id":1,"result":"0x1388"}"#).await;
    let source = JsonRpcChainIdSource::new(&url).unwrap();
    let customs = [custom("c1", 5000), custom("c2", 5000), custom("c3", 4999)];

    let chain = resolve_chain("mynet", &source, &customs, &builtin_chains())
        .await
        .unwrap();
    assert_eq!(chain.network, "c2");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST"));
    assert!(request.contains("eth_chainId"));
}

#[tokio::test]
async fn test_json_rpc_error_object_is_surfaced() {
    let (url, _server) = serve_once(
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
    )
    .await;
    let source = JsonRpcChainIdSource::new(&url).unwrap();

    let err = source.chain_id().await.unwrap_err();
    match err {
        ChainResolutionError::Rpc { reason, .. } => {
            assert!(reason.contains("method not found"));
            assert!(reason.contains("-32601"));
        }
        other => panic!("expected Rpc, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_node_is_rpc_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let source = JsonRpcChainIdSource::new(&url).unwrap();
    let err = resolve_chain("mainnet", &source, &[], &builtin_chains())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainResolutionError::Rpc { .. }));
}

#[tokio::test]
async fn test_local_network_without_custom_chain_fails() {
    let err = resolve_chain(LOCAL_NETWORK_NAME, &FixedChainId(31337), &[], &builtin_chains())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("hardhat"));
}

#[tokio::test]
async fn test_unmatched_chain_id_fails_with_id() {
    let err = resolve_chain("devnet", &FixedChainId(123456789), &[custom("c1", 5000)], &builtin_chains())
        .await
        .unwrap_err();
    assert!(matches!(err, ChainResolutionError::ChainNotFound { chain_id: 123456789 }));
}
