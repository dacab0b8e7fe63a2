//! Basic example of deferred submissions.
//!
//! Sets up a client that admits 3 submissions per second, then submits a
//! burst of 8. Three go out at once; the rest are redelivered by the
//! dispatcher as the window frees up.

use std::time::{Duration, Instant};
use submit_throttle::{ThrottledClient, TimeUnit, Transport, TransportError};
use tracing::Level;

/// Transport that prints what it would have sent.
#[derive(Debug)]
struct Console {
    start: Instant,
}

impl Transport<String> for Console {
    async fn send(&self, payload: &String, _credential: &str) -> Result<(), TransportError> {
        println!("  [{:>5}ms] sent {}", self.start.elapsed().as_millis(), payload);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .init();

    println!("=== Basic Throttling Example ===\n");
    println!("Limit: 3 submissions per rolling second\n");

    let console = Console {
        start: Instant::now(),
    };
    let client = ThrottledClient::builder(TimeUnit::Second, 3, console)
        .build()
        .expect("invalid throttle config");

    println!("Submitting a burst of 8:");
    for i in 1..=8 {
        client.submit(format!("document #{}", i), "demo-signature");
    }

    println!("\nImmediately after the burst:");
    println!("  in window: {}", client.in_window());
    println!("  pending:   {}\n", client.pending());

    // Enough for two more windows to drain the queue
    tokio::time::sleep(Duration::from_millis(2200)).await;

    let snapshot = client.metrics().snapshot();
    println!("\n=== Metrics ===");
    println!("  admitted:           {}", snapshot.admitted);
    println!("  deferred:           {}", snapshot.deferred);
    println!("  retries dispatched: {}", snapshot.retries_dispatched);
    println!("  rejection rate:     {:.1}%", snapshot.rejection_rate() * 100.0);

    client.shutdown().await.expect("shutdown failed");
    println!("\n=== Example Complete ===");
}
