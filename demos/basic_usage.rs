//! Example tracing a small OpenAI-style SDK
//!
//! This example shows how to:
//! - Wrap an SDK object with `observe_openai`
//! - Make a regular call and a streaming call through the wrapper
//! - Flush pending trace writes before exit
//!
//! Threads are kept in memory by a `RecordingSink` and printed at the end.
//! Set `THREADLINE_API_KEY` and `THREADLINE_PROJECT_ID` and drop the
//! `with_parent` line to send them to the trace store instead.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug cargo run --example basic_usage
//! ```

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Value, json};
use std::sync::Arc;
use threadline::{
    Member, ObserveConfig, Output, RecordingSink, SdkMethod, SdkObject, SdkObjectExt, TraceParent,
    init_telemetry, observe_openai,
};

/// Stand-in for a real client: `chat.completions.create` only
struct DemoClient;

struct DemoChat;

struct DemoCompletions;

struct DemoCreate;

impl SdkObject for DemoClient {
    fn type_name(&self) -> &str {
        "OpenAI"
    }

    fn member(&self, name: &str) -> Option<Member> {
        (name == "chat").then(|| Member::Object(Arc::new(DemoChat)))
    }
}

impl SdkObject for DemoChat {
    fn type_name(&self) -> &str {
        "Chat"
    }

    fn member(&self, name: &str) -> Option<Member> {
        (name == "completions").then(|| Member::Object(Arc::new(DemoCompletions)))
    }
}

impl SdkObject for DemoCompletions {
    fn type_name(&self) -> &str {
        "Completions"
    }

    fn member(&self, name: &str) -> Option<Member> {
        (name == "create").then(|| Member::Method(Arc::new(DemoCreate)))
    }
}

#[async_trait]
impl SdkMethod for DemoCreate {
    async fn call(&self, request: Value) -> anyhow::Result<Output> {
        let answer = "Rust keeps ownership explicit.";

        if request["stream"] == json!(true) {
            return Ok(Output::Stream(Box::pin(stream! {
                for word in answer.split_inclusive(' ') {
                    yield Ok(json!({"choices": [{"delta": {"content": word}}]}));
                }
                yield Ok(json!({"choices": [], "usage": {"prompt_tokens": 7, "completion_tokens": 5, "total_tokens": 12}}));
            })));
        }

        Ok(Output::Response(json!({
            "choices": [{"message": {"role": "assistant", "content": answer}}],
            "usage": {"prompt_tokens": 7, "completion_tokens": 5, "total_tokens": 12}
        })))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_telemetry(true);

    println!("Threadline Basic Usage Example");
    println!("==============================\n");

    let sink = RecordingSink::new(1);
    let config = ObserveConfig::new()
        .with_parent(TraceParent::new("demo", Arc::new(sink.clone())))
        .with_user_id("demo-user")
        .with_metadata("environment", "local")
        .with_tags(["demo"]);

    let client = observe_openai(Arc::new(DemoClient), Some(config));

    let request = json!({
        "model": "gpt-4o-mini",
        "messages": [{"role": "user", "content": "Describe Rust in one sentence."}]
    });

    let reply = client
        .call("chat.completions.create", request.clone())
        .await?
        .into_response()
        .unwrap_or_default();
    println!("Reply: {}", reply["choices"][0]["message"]["content"]);

    let mut streaming = request;
    streaming["stream"] = json!(true);
    let mut stream = client
        .call("chat.completions.create", streaming)
        .await?
        .into_stream()
        .unwrap_or_else(|| Box::pin(futures::stream::empty()));

    print!("Streamed: ");
    while let Some(chunk) = stream.next().await {
        if let Some(text) = chunk?["choices"][0]["delta"]["content"].as_str() {
            print!("{}", text);
        }
    }
    println!("\n");

    client.flush().await?;

    for thread in sink.attempts() {
        println!(
            "{} -> {} messages, total_tokens={:?}",
            thread.external_id,
            thread.messages.len(),
            thread.metadata.get("total_tokens").and_then(|value| value.as_u64())
        );
    }

    client.shutdown().await?;
    Ok(())
}
