use cbuff::ring::{ByteRing, MirroredRing};
use cbuff::storage::Region;
use cbuff::telemetry::init_tracing;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "stress", version)]
#[command(about = "SPSC stress run over a mirrored-index byte ring")]
struct Args {
    /// Ring capacity in bytes
    #[arg(short, long, default_value_t = 64 * 1024)]
    capacity: usize,

    /// Seconds to run before stopping (Ctrl+C stops early)
    #[arg(short, long, default_value_t = 5)]
    duration: u64,

    /// Back the ring with a memory-mapped file instead of anonymous memory
    #[arg(long, value_name = "FILE")]
    storage: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log);

    if let Err(e) = run(args) {
        tracing::error!(error = %e, "stress run failed");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| format!("Failed to set Ctrl+C handler: {}", e))?;

    let mut region = match &args.storage {
        Some(path) => Region::create(path, args.capacity)?,
        None => Region::anonymous(args.capacity)?,
    };

    let mut ring = MirroredRing::with_capacity(args.capacity, region.as_mut_slice())?;
    let (mut prod, mut cons) = ring.split();

    let started = Instant::now();
    let done_flag = AtomicBool::new(false);
    let producer_done = &done_flag;

    let (written, read) = std::thread::scope(|scope| {
        let writer_running = running.clone();
        let writer = scope.spawn(move || {
            let mut count = 0u64;
            let mut chunk = [0u8; 256];

            while writer_running.load(Ordering::Relaxed) {
                for (i, slot) in chunk.iter_mut().enumerate() {
                    *slot = count.wrapping_add(i as u64) as u8;
                }
                count += prod.enqueue_slice(&chunk) as u64;
            }

            producer_done.store(true, Ordering::Release);
            count
        });

        let reader = scope.spawn(move || -> Result<u64, String> {
            let mut count = 0u64;
            let mut chunk = [0u8; 256];

            loop {
                let n = cons.dequeue_into(&mut chunk);
                for &byte in &chunk[..n] {
                    if byte != count as u8 {
                        return Err(format!(
                            "sequence broken at byte {}: expected {:#04x}, got {:#04x}",
                            count, count as u8, byte
                        ));
                    }
                    count += 1;
                }

                // Checked before emptiness so the producer's last chunk is visible.
                if n == 0 && producer_done.load(Ordering::Acquire) && cons.is_empty() {
                    break;
                }
            }

            Ok(count)
        });

        tracing::info!(capacity = args.capacity, duration_secs = args.duration, "running");
        let deadline = started + Duration::from_secs(args.duration);
        while running.load(Ordering::SeqCst) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        running.store(false, Ordering::SeqCst);

        let written = writer.join().map_err(|_| "producer thread panicked")?;
        let read = reader.join().map_err(|_| "consumer thread panicked")??;
        Ok::<_, Box<dyn std::error::Error>>((written, read))
    })?;

    let elapsed = started.elapsed().as_secs_f64();
    if written != read {
        return Err(format!("producer wrote {} bytes but consumer read {}", written, read).into());
    }

    debug_assert!(ring.is_empty());
    region.flush()?;

    tracing::info!(
        bytes = written,
        throughput_mb_s = written as f64 / elapsed / 1_000_000.0,
        "stress run complete"
    );

    if let Some(path) = &args.storage {
        std::fs::remove_file(path).ok();
    }
    Ok(())
}
