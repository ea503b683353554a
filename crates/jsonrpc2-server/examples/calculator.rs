//! Calculator JSON-RPC Example
//!
//! Registers a few arithmetic methods and drives the server with single
//! requests, a notification and a batch, printing what goes on the wire.
//!
//! Run with `RUST_LOG=debug` to see the server's own tracing output.

use std::time::Duration;

use jsonrpc2_server::prelude::*;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Operands {
    a: f64,
    b: f64,
}

const DIVISION_BY_ZERO: i64 = 1;

async fn divide(_ctx: RequestContext, ops: Operands) -> Result<f64, ErrorObject> {
    if ops.b == 0.0 {
        return Err(ErrorObject::application(
            DIVISION_BY_ZERO,
            "Division by zero",
            Some(json!({"a": ops.a})),
        )
        .unwrap_or_else(|reserved| ErrorObject::internal_error(Some(reserved.to_string()))));
    }
    Ok(ops.a / ops.b)
}

fn build_server() -> Server {
    Server::builder()
        .method(
            "add",
            typed(|_ctx: RequestContext, ops: Operands| async move {
                Ok::<_, ErrorObject>(ops.a + ops.b)
            }),
        )
        .method(
            "subtract",
            typed(|_ctx: RequestContext, ops: Operands| async move {
                Ok::<_, ErrorObject>(ops.a - ops.b)
            }),
        )
        .method("divide", typed(divide))
        .method("slow_square", |ctx: RequestContext, params: Params| async move {
            let x: f64 = params.parse()?;
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(50)) => to_result(&(x * x)),
                _ = ctx.cancelled() => Err(ErrorObject::internal_error(Some("cancelled".into()))),
            }
        })
        .method("log", |_ctx: RequestContext, params: Params| async move {
            info!(payload = params.get().unwrap_or("null"), "log notification");
            to_result(&())
        })
        .build()
}

async fn send_single(server: &Server, request: &str) {
    let mut out = Vec::new();
    server
        .single_request(&RequestContext::new(), &mut request.as_bytes(), &mut out)
        .await;
    print_exchange(request, &out);
}

async fn send_batch(server: &Server, request: &str) {
    let mut out = Vec::new();
    server
        .batch_request(&RequestContext::new(), &mut request.as_bytes(), &mut out)
        .await;
    print_exchange(request, &out);
}

fn print_exchange(request: &str, out: &[u8]) {
    println!("--> {}", request);
    if out.is_empty() {
        println!("<-- (no response)");
    } else {
        print!("<-- {}", String::from_utf8_lossy(out));
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server = build_server();
    info!(methods = ?server.registry().methods(), "Calculator server ready");

    send_single(&server, r#"{"jsonrpc":"2.0","method":"add","params":{"a":5,"b":3},"id":1}"#).await;
    send_single(&server, r#"{"jsonrpc":"2.0","method":"subtract","params":{"a":10,"b":4},"id":"two"}"#).await;
    send_single(&server, r#"{"jsonrpc":"2.0","method":"divide","params":{"a":1,"b":0},"id":3}"#).await;
    send_single(&server, r#"{"jsonrpc":"2.0","method":"multiply","params":{"a":2,"b":3},"id":4}"#).await;
    send_single(&server, r#"{"jsonrpc":"2.0","method":"add","params":{"a":"x"},"id":5}"#).await;
    send_single(&server, r#"{"jsonrpc":"2.0","method":"log","params":"hello"}"#).await;
    send_single(&server, r#"{"jsonrpc":"2.0","method":"add","params":"#).await;

    send_batch(
        &server,
        r#"[{"jsonrpc":"2.0","method":"slow_square","params":4,"id":"a"},{"jsonrpc":"2.0","method":"add","params":{"a":1,"b":1},"id":"b"},{"jsonrpc":"2.0","method":"log","params":"batched"}]"#,
    )
    .await;
}
