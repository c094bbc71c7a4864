use std::thread;
use std::time::Instant;

use anyhow::Result;

use fast_market_data::core::types::{price_to_f64, stock_symbol};
use fast_market_data::engine::recorder::Recorder;
use fast_market_data::feed::decoder::ItchDecoder;
use fast_market_data::feed::gen::FeedGenerator;
use fast_market_data::storage::sink::WriteMode;
use fast_market_data::core::messages::MessageBody;

const DEMO_OUTPUT: &str = "demo_output.bin";

fn print_message(msg: &MessageBody) {
    match msg {
        MessageBody::AddOrder(order) => {
            let side = if order.buy_sell_indicator == b'B' { "BUY" } else { "SELL" };
            println!(
                "ADD ORDER: {} {} {} @ ${:.4} (ref: {})",
                stock_symbol(&order.stock),
                side,
                order.shares,
                price_to_f64(order.price),
                order.order_reference_number
            );
        }
        MessageBody::Trade(trade) => {
            let side = if trade.buy_sell_indicator == b'B' { "BUY" } else { "SELL" };
            println!(
                "TRADE: {} {} {} @ ${:.4} (match: {})",
                stock_symbol(&trade.stock),
                side,
                trade.shares,
                price_to_f64(trade.price),
                trade.match_number
            );
        }
        MessageBody::ExecuteOrder(exec) => {
            println!(
                "EXECUTE: ref {} executed {} shares (match: {})",
                exec.order_reference_number, exec.executed_shares, exec.match_number
            );
        }
        MessageBody::SystemEvent(event) => {
            println!("SYSTEM EVENT: {}", event.event_code as char);
        }
        other => println!("{:?}", other.message_type()),
    }
}

fn demo_basic_parsing() {
    println!("\n=== Demo 1: Basic Message Parsing ===\n");

    let decoder = ItchDecoder::new();
    let mut gen = FeedGenerator::new();

    let messages = [
        gen.add_order("AAPL", b'B', 100, 1_500_000),
        gen.add_order("MSFT", b'S', 50, 3_200_000),
        gen.trade("GOOGL", b'B', 25, 1_400_000),
    ];

    for wire in &messages {
        if let Some(parsed) = decoder.decode(wire) {
            print_message(&parsed.body);
        }
    }
}

fn demo_async_recording() -> Result<()> {
    println!("\n=== Demo 2: Async Recording ===\n");

    let producer_count = num_cpus::get().min(4);
    let messages_per_producer = 1000u32;

    let recorder = std::sync::Arc::new(Recorder::new(DEMO_OUTPUT, WriteMode::Buffered));
    recorder.start()?;

    println!(
        "Recording {} messages from {} producers...",
        producer_count as u32 * messages_per_producer,
        producer_count
    );

    let mut producers = Vec::with_capacity(producer_count);
    for _ in 0..producer_count {
        let recorder = std::sync::Arc::clone(&recorder);
        producers.push(thread::spawn(move || {
            let decoder = ItchDecoder::new();
            let mut gen = FeedGenerator::new();
            for i in 0..messages_per_producer {
                let wire = if i % 2 == 0 {
                    gen.add_order("TSLA", b'B', 100 + i, 2_500_000 + i * 100)
                } else {
                    gen.trade("NVDA", b'S', 50 + i, 5_000_000 + i * 100)
                };
                if let Some(parsed) = decoder.decode(&wire) {
                    while !recorder.publish(parsed) {
                        thread::yield_now();
                    }
                }
            }
        }));
    }

    for handle in producers {
        if handle.join().is_err() {
            tracing::error!("producer thread panicked");
        }
    }

    println!("Ring backlog before stop: {}", recorder.ring_len());
    recorder.stop();
    println!("Total bytes written: {}", recorder.total_written());
    println!("Write errors: {}", recorder.write_errors());
    println!("Output file: {}", DEMO_OUTPUT);

    Ok(())
}

fn demo_decode_latency() {
    println!("\n=== Demo 3: Decode Latency ===\n");

    let decoder = ItchDecoder::new();
    let mut gen = FeedGenerator::new();
    let wire = gen.add_order("AAPL", b'B', 100, 1_500_000);

    const ITERATIONS: usize = 100_000;
    let mut latencies = Vec::with_capacity(ITERATIONS);

    // Warmup
    for _ in 0..10_000 {
        std::hint::black_box(decoder.decode(&wire));
    }

    for _ in 0..ITERATIONS {
        let start = Instant::now();
        let parsed = decoder.decode(&wire);
        let elapsed = start.elapsed().as_nanos() as u64;
        std::hint::black_box(&parsed);
        latencies.push(elapsed);
    }

    latencies.sort_unstable();
    let percentile = |p: f64| latencies[((latencies.len() - 1) as f64 * p) as usize];

    println!("Decode latency over {} iterations:", ITERATIONS);
    println!("  Min:    {} ns", latencies[0]);
    println!("  Median: {} ns", percentile(0.50));
    println!("  P99:    {} ns", percentile(0.99));
    println!("  P99.9:  {} ns", percentile(0.999));
    println!("  Max:    {} ns", latencies[latencies.len() - 1]);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("======================================");
    println!(" Fast Market Data - Demo");
    println!(" Zero-Copy NASDAQ ITCH 5.0 Decoder");
    println!("======================================");

    demo_basic_parsing();
    demo_async_recording()?;
    demo_decode_latency();

    println!("\n=== Demo Complete ===");
    Ok(())
}
