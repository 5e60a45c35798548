/**
 * Minimal test harness for the telemetry sink.
 *
 * Replace ENDPOINT with a real ingestion URL, then run:
 *
 *   cargo run -p sink-demo-basic
 *   cargo run -p sink-demo-basic -- --with-context   # submit via Context
 */
use serde_json::json;
use sink::{Context, Sink};

const ENDPOINT: &str = "https://ingest.example.com";
const TOKEN: &str = "PASTE_YOUR_TOKEN_HERE";

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let use_context = args.iter().any(|a| a == "--with-context");

    let sink = Sink::builder()
        .with_endpoint(ENDPOINT)
        .with_error_handler(|err| {
            eprintln!("[example] flush failed for {}: status {}", err.token, err.status);
        })
        .build()
        .expect("valid sink configuration");

    let datapoint = json!({
        "metric": "requests_total",
        "value": 1,
        "unit": "count",
    });

    if use_context {
        println!("[example] Submitting via Context");
        let ctx = Context::new().with_token(TOKEN);
        sink.submit_datapoints_with_context(&ctx, vec![sink::Record::new(datapoint)])
            .expect("queued");
    } else {
        sink.submit_datapoints(TOKEN, vec![sink::Record::new(datapoint)])
            .expect("queued");
    }

    sink.submit_events(
        TOKEN,
        vec![sink::Record::new(json!({
            "name": "example.started",
        }))],
    )
    .expect("queued");

    println!("[example] Submitted a datapoint and an event");

    for point in sink.stats().await {
        println!("[example] {} {:?} = {}", point.name, point.dims, point.value);
    }

    match sink.close().await {
        Ok(()) => println!("[example] Clean shutdown"),
        Err(err) => eprintln!("[example] Shutdown did not fully drain: {err}"),
    }
}
