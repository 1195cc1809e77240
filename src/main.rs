use cbuff::consumer::{ByteSink, Dispatcher, DrainStats};
use cbuff::ring::{ByteRing, CountedRing, MirroredRing, PointerRing};
use cbuff::storage::Region;
use cbuff::telemetry::init_tracing;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variant {
    Counted,
    Mirrored,
    Pointer,
}

#[derive(Debug, Parser)]
#[command(name = "cbuff", version)]
#[command(about = "Feed a byte ring and drain it into sinks until Ctrl+C")]
struct Args {
    /// Ring strategy
    #[arg(short, long, value_enum, default_value = "mirrored")]
    variant: Variant,

    /// Ring capacity in bytes
    #[arg(short, long, default_value_t = 64 * 1024)]
    capacity: usize,

    /// Bytes offered to the ring per tick
    #[arg(long, default_value_t = 4096)]
    burst: usize,

    /// Evict oldest bytes instead of dropping new ones when full
    #[arg(long)]
    overwrite: bool,

    /// Back the ring with a memory-mapped file instead of anonymous memory
    #[arg(long, value_name = "FILE")]
    storage: Option<PathBuf>,

    /// Seconds between status lines
    #[arg(long, default_value_t = 5)]
    report_secs: u64,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

/// Folds every byte into a running checksum.
struct ChecksumSink {
    sum: u64,
}

impl ByteSink for ChecksumSink {
    fn consume(&mut self, byte: u8) -> bool {
        self.sum = self.sum.rotate_left(5) ^ u64::from(byte);
        true
    }

    fn flush(&mut self) {
        tracing::trace!(checksum = self.sum, "checksum");
    }

    fn name(&self) -> &str {
        "checksum"
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log);

    if let Err(e) = run(args) {
        tracing::error!(error = %e, "cbuff failed");
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
    let storage = region.as_mut_slice();

    tracing::info!(
        variant = ?args.variant,
        capacity = args.capacity,
        overwrite = args.overwrite,
        "service running, press Ctrl+C to stop"
    );

    let totals = match args.variant {
        Variant::Counted => pump(&mut CountedRing::with_capacity(args.capacity, storage)?, &args, &running),
        Variant::Mirrored => pump(&mut MirroredRing::with_capacity(args.capacity, storage)?, &args, &running),
        Variant::Pointer => pump(&mut PointerRing::with_capacity(args.capacity, storage)?, &args, &running),
    };

    region.flush()?;

    tracing::info!(
        bytes_read = totals.bytes_read,
        bytes_delivered = totals.bytes_delivered,
        success_rate = totals.success_rate(),
        "shutting down"
    );

    if let Some(path) = &args.storage {
        std::fs::remove_file(path).ok();
    }
    Ok(())
}

fn pump<R: ByteRing>(ring: &mut R, args: &Args, running: &AtomicBool) -> DrainStats {
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_sink(ChecksumSink { sum: 0 });

    let mut totals = DrainStats::default();
    let mut next = 0u8;
    let mut offered = 0u64;
    let mut rejected = 0u64;
    let mut evicted = 0u64;
    let mut last_report = Instant::now();
    let report_every = Duration::from_secs(args.report_secs);

    while running.load(Ordering::SeqCst) {
        for _ in 0..args.burst {
            offered += 1;
            if args.overwrite {
                if ring.enqueue_overwrite(next).is_some() {
                    evicted += 1;
                }
            } else if ring.enqueue(next).is_err() {
                rejected += 1;
            }
            next = next.wrapping_add(1);
        }

        // Leave a backlog behind so overwrite and full paths are exercised.
        let stats = dispatcher.drain_batch(ring, args.burst / 2);
        totals.merge(stats);

        if last_report.elapsed() >= report_every {
            tracing::info!(
                offered,
                drained = totals.bytes_read,
                rejected,
                evicted,
                ring_count = ring.count(),
                ring_available = ring.available(),
                "status"
            );
            last_report = Instant::now();
        }

        std::thread::sleep(Duration::from_millis(10));
    }

    totals.merge(dispatcher.drain(ring));
    totals
}
