//! Command-line entry point for build pipelines.

use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;

use clap::{
    ArgAction,
    Parser,
};
use i18n_coverage::config::{
    ConfigError,
    ConfigManager,
    EngineConfig,
};
use i18n_coverage::report::{
    self,
    Gate,
    ReportError,
};
use i18n_coverage::{
    Engine,
    EngineError,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Exit code for runs that could not produce a report.
const EXIT_RUN_FAILED: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "i18n-coverage",
    version,
    about = "Check that every translation key used in source code is translated"
)]
struct Cli {
    /// Project root; relative config paths resolve against it.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Config file to use instead of `<root>/.i18n-coverage.json`.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Draft missing keys into each locale's overlay file.
    #[arg(long)]
    fix: bool,

    /// Also write the report as JSON.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Fail when any locale's coverage is below this percentage, instead of
    /// on any missing key.
    #[arg(long, value_name = "PCT")]
    min_coverage: Option<f64>,

    /// Locale codes to check (default: every directory under the locales dir).
    #[arg(long, value_delimiter = ',')]
    locales: Vec<String>,

    #[arg(long, value_name = "DIR")]
    source_root: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    locales_dir: Option<PathBuf>,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// -v for progress, -vv for per-file detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply_overrides(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(source_root) = &self.source_root {
            config.source_root.clone_from(source_root);
        }
        if let Some(locales_dir) = &self.locales_dir {
            config.locales_dir.clone_from(locales_dir);
        }
        if !self.locales.is_empty() {
            config.locales.codes.clone_from(&self.locales);
        }
        if let Some(percent) = self.min_coverage {
            config.policy = config.policy.with_min_coverage(percent);
        }
        config
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = log_file
        && let Some(file_name) = path.file_name()
    {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
        return Some(guard);
    }

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    None
}

async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let mut config_manager = ConfigManager::new();
    config_manager.load_settings(Some(cli.root.clone()), cli.config.as_deref())?;
    let settings = cli.apply_overrides(config_manager.get_settings().clone());
    config_manager.update_settings(settings)?;

    let outcome = Engine::new(&config_manager).run(cli.fix).await?;
    if let Some(remediation) = &outcome.remediation {
        tracing::info!(
            drafted = remediation.drafted,
            files = ?remediation.written,
            "Overlay files updated"
        );
    }

    if let Some(path) = &cli.report {
        report::write_json(&outcome.report, path).await?;
    }

    let decision = Gate::new(config_manager.get_settings().policy).decide(&outcome.report);
    decision.announce(&outcome.report);
    Ok(decision.process_exit_code())
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose, cli.log_file.as_deref());

    match run(&cli).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error}");
            eprintln!("i18n-coverage: {error}");
            ExitCode::from(EXIT_RUN_FAILED)
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[googletest::test]
    fn overrides_replace_config_values() {
        let cli = Cli::parse_from([
            "i18n-coverage",
            "--locales",
            "en,es",
            "--source-root",
            "app",
            "--min-coverage",
            "90",
        ]);

        let config = cli.apply_overrides(EngineConfig::default());

        expect_that!(config.locales.codes, elements_are![eq("en"), eq("es")]);
        assert_eq!(config.source_root, PathBuf::from("app"));
        expect_that!(config.policy.min_coverage_percent, some(approx_eq(90.0)));
        expect_that!(config.policy.max_missing, none());
    }

    #[googletest::test]
    fn verbosity_flags_are_counted() {
        let cli = Cli::parse_from(["i18n-coverage", "-vv", "--fix"]);

        expect_that!(cli.verbose, eq(2));
        expect_that!(cli.fix, eq(true));
    }
}
