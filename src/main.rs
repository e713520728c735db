use std::io::{self, BufRead};

use anyhow::Context;
use blogbench::{config::Config, report::Reporter, workload};
use log::{info, LevelFilter};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .init();

    let config = Config::default();
    let mut reporter = Reporter::new(io::stdout());

    let summary = workload::run(&config, &mut reporter).context("Benchmark run failed")?;
    info!(
        "Persisted {} blogs and {} authors",
        summary.blog_count, summary.autor_count
    );

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed waiting for input")?;

    Ok(())
}
