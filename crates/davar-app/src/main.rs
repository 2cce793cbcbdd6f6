// davar entry point.
//
// 1. Resolve the base directory (DAVAR_HOME, else the working directory)
// 2. Initialize tracing (log to file, stdout is for results)
// 3. Dispatch the command and exit with its code

mod cli;

use std::env;
use std::path::PathBuf;

use anyhow::Context;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let base_dir = match resolve_base_dir() {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(&base_dir) {
        // logging is best-effort; the command still runs
        eprintln!("warning: {err:#}");
    }

    let code = cli::run_with_args(&base_dir, &args).await;
    std::process::exit(code);
}

fn resolve_base_dir() -> anyhow::Result<PathBuf> {
    match env::var_os("DAVAR_HOME") {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => env::current_dir().context("failed to read working directory"),
    }
}

/// Initialize tracing to log to `logs/davar.log` under `base_dir`.
fn init_tracing(base_dir: &std::path::Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("davar.log"))
        .context("failed to create log file")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("davar=info,davar_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
