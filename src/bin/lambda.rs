//! Lambda entry point for the purchase-order robot.
//!
//! One deployed function serves every stage; the invocation payload names
//! the stage to run. The handler always resolves with a [`FunctionReply`]
//! so the scheduler sees stage failures in the body, not as runtime errors.

use lambda_runtime::{service_fn, Error, LambdaEvent};
use po_robot::config::Settings;
use po_robot::pipeline::{self, Invocation};
use po_robot::storage::S3Store;
use serde_json::{json, Value};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let (payload, context) = event.into_parts();
    info!(request_id = %context.request_id, "invocation received");

    let invocation: Invocation = match serde_json::from_value(payload) {
        Ok(invocation) => invocation,
        Err(e) => {
            error!("bad invocation payload: {e}");
            return Ok(json!({
                "function_name": "unknown",
                "error_message": format!("bad invocation payload: {e}"),
                "error_details": null,
            }));
        }
    };

    let settings = Settings::from_env();
    let store = S3Store::from_env(settings.bucket.clone()).await;

    let reply = pipeline::dispatch(&store, &settings, &invocation).await;
    Ok(serde_json::to_value(reply)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    lambda_runtime::run(service_fn(handler)).await
}
