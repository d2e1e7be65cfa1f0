use clap::Parser;
use log::info;
use std::time::Duration;
use tokio::sync::mpsc;
use worker::channel::{spawn_reader, spawn_writer};
use worker::scheduler::{Worker, WorkerEvent};

#[derive(Parser, Debug)]
#[command(author, version, about = "Combat worker: resolves attacks over stdin/stdout", long_about = None)]
struct Args {
    /// Collision tick period in milliseconds
    #[arg(short = 't', long, default_value_t = shared::TICK_INTERVAL_MS)]
    tick_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries messages.
    env_logger::init();

    let args = Args::parse();
    if args.tick_ms == 0 {
        return Err("tick period must be at least 1ms".into());
    }

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    let reader = spawn_reader(tokio::io::stdin(), move |message| {
        events_tx.send(WorkerEvent::Inbound(message)).is_ok()
    });
    let writer = spawn_writer(tokio::io::stdout(), outbound_rx);

    let worker = Worker::new(Duration::from_millis(args.tick_ms), events_rx, outbound_tx);

    tokio::select! {
        engine = worker.run() => {
            info!(
                "Worker stopped after {} ticks with {} characters mirrored",
                engine.tick_count(),
                engine.registry().len()
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    reader.abort();
    // Worker dropped its sender, so the writer drains and returns.
    writer.await??;

    Ok(())
}
