use std::{env, fs::File, path::Path};

use payroll_streams::dlq::LogDlq;
use payroll_streams::ingestion::CsvReader;
use payroll_streams::runner::Runner;
use payroll_streams::{MemoryDirectory, MemoryStore, PayrollEngine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args();
    let file_path = args
        .nth(1)
        .ok_or("No operations file was provided")?;
    let file = File::open(Path::new(&file_path))?;

    let ingestion = CsvReader::new(file)?;
    let engine = PayrollEngine::new(MemoryStore::new(), MemoryDirectory::new());
    let mut runner = Runner::new(engine, LogDlq::default());

    runner.run(ingestion).await?;
    runner.report(&mut std::io::stdout().lock()).await?;

    Ok(())
}
