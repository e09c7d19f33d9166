use std::io::{self, BufWriter};

use accesslog::runtime::{boot, run};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let (format, config) = boot::boot()?;

    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    let summary = run(&format, &config, stdin, stdout)?;

    tracing::debug!("Run summary: {}", serde_json::to_string(&summary)?);
    Ok(())
}
