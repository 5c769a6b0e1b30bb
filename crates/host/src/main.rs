//! `scriptinvoker-host` -- minimal function host for script invokers.
//!
//! Given a script file, invokes it with the provided input and writes the
//! script's stdout to this process's stdout. Given a directory, lists the
//! script files that would be registered as functions.
//!
//! # Environment variables
//!
//! | Variable                    | Default                  | Description                      |
//! |-----------------------------|--------------------------|----------------------------------|
//! | `SCRIPT_TIMEOUT_SECS`       | `300`                    | Per-invocation timeout, `0` = none |
//! | `SCRIPT_OUTPUT_LIMIT_BYTES` | `10485760`               | Captured bytes per stream        |
//! | `SCRIPT_POWERSHELL_BIN`     | `PowerShell.exe`/`pwsh`  | PowerShell interpreter           |
//! | `SCRIPT_CMD_BIN`            | `cmd`                    | Command shell                    |
//! | `SCRIPT_PYTHON_BIN`         | `python.exe`/`python3`   | Python interpreter               |
//! | `RUST_LOG`                  | `..=info`                | Log filter (logs go to stderr)   |

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use scriptinvoker_core::{InvocationStatus, InvokerConfig, ScriptInvoker};
use scriptinvoker_host::{discovery, exit_codes};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "scriptinvoker-host",
    version,
    about = "Invoke a PowerShell, batch or Python script function"
)]
struct Cli {
    /// Script to invoke, or a directory whose scripts should be listed.
    path: PathBuf,

    /// Input passed to the script.
    #[arg(default_value = "")]
    input: String,

    /// Override `SCRIPT_TIMEOUT_SECS` (`0` disables the timeout).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print an invocation summary as JSON on stderr.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scriptinvoker_host=info,scriptinvoker_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Host error");
            exit_codes::USAGE
        }
    };
    ExitCode::from(code as u8)
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    if cli.path.is_dir() {
        let scripts = discovery::discover_scripts(&cli.path)
            .await
            .with_context(|| format!("read directory {}", cli.path.display()))?;
        tracing::info!(
            dir = %cli.path.display(),
            count = scripts.len(),
            "Script discovery complete",
        );
        for script in scripts {
            println!("{}", script.display());
        }
        return Ok(exit_codes::OK);
    }

    let mut config = InvokerConfig::from_env().context("load invoker configuration")?;
    if let Some(secs) = cli.timeout_secs {
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    let invoker = match ScriptInvoker::from_config(&cli.path, &config) {
        Ok(invoker) => invoker,
        Err(e) => {
            tracing::error!(path = %cli.path.display(), error = %e, "Cannot register script");
            return Ok(exit_codes::for_status(InvocationStatus::from_error(&e)));
        }
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling invocation");
            on_interrupt.cancel();
        }
    });

    let mut stdout = tokio::io::stdout();
    let result = invoker
        .invoke_with_cancel(&cli.input, &mut stdout, &cancel)
        .await;
    let status = InvocationStatus::from_result(&result);

    if let Err(e) = &result {
        tracing::error!(status = %status, error = %e, "Invocation failed");
    }

    if cli.json {
        let summary = serde_json::json!({
            "script": invoker.script_path().display().to_string(),
            "kind": invoker.kind(),
            "status": status,
            "output": result.as_ref().ok(),
            "error": result.as_ref().err().map(ToString::to_string),
        });
        eprintln!("{summary}");
    }

    Ok(exit_codes::for_status(status))
}
