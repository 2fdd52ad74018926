mod terminal;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use lansweep_core::ScanJob;
use lansweep_core::scanner::interface;
use tracing::info;

#[derive(Parser)]
#[command(name = "lansweep")]
#[command(about = "Discover and profile hosts on the local network.")]
struct CommandLine {
    /// Network to scan in CIDR form; autodetected when omitted
    #[arg(short, long)]
    range: Option<String>,
    /// Ports to probe, e.g. "80,443,8000-8010"
    #[arg(short, long, default_value = "1-1000")]
    ports: String,
    /// Per-probe timeout in milliseconds
    #[arg(short, long, default_value_t = 3000)]
    timeout: u64,
    /// How many hosts are examined concurrently
    #[arg(long, default_value_t = 100)]
    threads: usize,
    /// Report closed ports as well as open ones
    #[arg(long)]
    show_closed: bool,
    /// Probe a curated set of UDP ports on each live host
    #[arg(long)]
    udp: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CommandLine::parse();
    terminal::logging::init();

    let network = match args.range {
        Some(range) => range,
        None => {
            let detected = interface::detect_local_network()?;
            info!("autodetected network {detected}");
            detected
        }
    };

    let mut job = ScanJob::new(
        &network,
        Duration::from_millis(args.timeout),
        &args.ports,
        args.threads,
        args.show_closed,
    )?;
    job.set_udp_enabled(args.udp);

    let bar = terminal::progress_bar();
    {
        let bar = bar.clone();
        job.set_progress_callback(move |stage, current, total, message| {
            bar.set_length(total.max(1) as u64);
            bar.set_position(current as u64);
            bar.set_message(format!("[{stage}] {message}"));
        });
    }

    let job = Arc::new(job);
    let runner = job.clone();
    let scan = tokio::spawn(async move { runner.scan().await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, stopping scan");
            job.stop().await;
        }
        joined = scan => {
            let _ = joined;
        }
    }
    bar.finish_and_clear();

    let results = job.get_results();
    terminal::print::render(&results);
    terminal::print::summary(&results);
    Ok(())
}
