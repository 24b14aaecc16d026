//! mtrace - synthetic workload driver for microtrace
//!
//! Spawns a handful of registered worker threads, records nested spans over
//! a CPU-bound workload, and writes the resulting Chrome trace file. Useful
//! for producing example traces and exercising the tracer end to end.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mtrace")]
#[command(author, version, about = "Record a synthetic workload as a Chrome trace", long_about = None)]
struct Cli {
    /// Number of worker threads to spawn
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Spans recorded per worker
    #[arg(short, long, default_value_t = 1000)]
    spans: usize,

    /// Trace output path
    #[arg(short, long, default_value = "trace.json")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // The explicit dump below reports failures through the exit code, so the
    // teardown dump is disabled rather than writing the file twice.
    let _guard = microtrace::init(microtrace::TracerConfig {
        default_path: cli.output.clone(),
        dump_on_teardown: false,
    });

    microtrace::register_thread("main");
    {
        let _workload = microtrace::span("workload");
        run_workers(cli.threads, cli.spans);
    }

    microtrace::dump(&cli.output)?;
    println!("Wrote trace to {}", cli.output.display());
    Ok(())
}

fn run_workers(threads: usize, spans: usize) {
    std::thread::scope(|scope| {
        for worker in 0..threads {
            scope.spawn(move || {
                microtrace::register_thread(format!("worker-{worker}"));
                let mut acc = worker as u64;
                for iteration in 0..spans {
                    let _span = microtrace::span("iteration");
                    acc = busy_work(acc, iteration);
                    {
                        let _checksum = microtrace::span("checksum");
                        acc ^= acc >> 7;
                    }
                }
                std::hint::black_box(acc);
            });
        }
    });
}

/// A small deterministic mix so the spans measure real work.
fn busy_work(mut acc: u64, salt: usize) -> u64 {
    for i in 0..64u64 {
        acc = acc
            .wrapping_mul(6364136223846793005)
            .wrapping_add(salt as u64 ^ i);
    }
    acc
}
