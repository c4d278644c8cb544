//! Stream a URL through a fetch exchange
//!
//! Demonstrates late attach: the body is buffered until the response head has
//! been printed, then flushed and streamed as events.
//!
//! Run with: cargo run --example fetch_stream -- https://example.com/

use fetch_relay::{ClientConfig, FetchEvent, NetworkFetchModule, ResponseState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com/".to_string());

    println!("Fetch Relay Stream Example");
    println!("==========================\n");

    let (module, mut events) = NetworkFetchModule::new(ClientConfig::default())?;
    let id = module.construct();
    module.send_request(&id, url.parse()?)?;

    let state = module
        .wait_for_states(
            &id,
            &[ResponseState::ResponseReceived, ResponseState::BodyCompleted, ResponseState::ErrorReceived],
        )
        .await?;

    if state == ResponseState::ErrorReceived {
        println!("Request failed: {:?}", module.error(&id)?);
        return Ok(());
    }

    if let Some(init) = module.response_init(&id)? {
        println!("{} {} ({})", init.status, init.status_text, init.url);
        for (name, value) in &init.headers {
            println!("  {}: {}", name, value);
        }
    }

    module.start_streaming(&id)?;

    let mut total = 0usize;
    while let Some(event) = events.next().await {
        match event.event {
            FetchEvent::DidReceiveResponseData(chunk) => {
                total += chunk.len();
                println!("received {} bytes", chunk.len());
            }
            FetchEvent::DidComplete => {
                println!("\nComplete: {} bytes", total);
                break;
            }
            FetchEvent::DidFailWithError(message) => {
                println!("\nFailed: {}", message);
                break;
            }
        }
    }

    module.release(&id);
    Ok(())
}
