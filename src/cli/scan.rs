//! Scan subcommand implementation.
//!
//! Handles `titlescan scan --start-ip IP --end-ip IP ...`.

use super::prompt::{ask_terminal, ask_until};
use super::ScanExit;
use crate::config::AppSettings;
use crate::error::{ScanResult, ValidationError};
use crate::logging::{LogConfig, ScanLogger};
use crate::output;
use crate::scanner::{
    run_scan, HttpProber, HttpSettings, Prober, ScanJobConfig, ScanPlan, Shutdown,
};
use crate::types::{IpRange, PortList, ProtocolPolicy};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument::WithSubscriber;
use tracing::{error, info, warn};

/// Scan an IPv4 range for web servers and record their page titles.
#[derive(Parser, Debug, Clone, Default)]
pub struct ScanCommand {
    /// First address of the range (prompted for when omitted)
    #[arg(long = "start-ip", value_name = "IP")]
    pub start_ip: Option<String>,

    /// Last address of the range, inclusive (prompted for when omitted)
    #[arg(long = "end-ip", value_name = "IP")]
    pub end_ip: Option<String>,

    /// Ports to probe (e.g. "80 443", "80,443", "8000-8010") [default: 80 443]
    #[arg(short, long, num_args = 1.., value_name = "PORT")]
    pub ports: Vec<String>,

    /// Per-request timeout in seconds [default: 5]
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Maximum number of concurrent probes [default: 10]
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// CSV output file [default: scan_results_<timestamp>.csv]
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Which protocols to try on each port [default: mirror-443]
    #[arg(long, value_enum)]
    pub policy: Option<ProtocolPolicy>,

    /// Verify TLS certificates on https probes
    #[arg(long)]
    pub verify_tls: bool,

    /// Directory for the scan log file [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Show a progress bar
    #[arg(long)]
    pub progress: bool,
}

/// Scan parameters after merging flags with settings, before validation.
#[derive(Debug, Clone)]
pub(crate) struct ScanParams {
    pub start_ip: String,
    pub end_ip: String,
    pub ports: Vec<String>,
    pub timeout_secs: u64,
    pub workers: usize,
    pub output: PathBuf,
    pub policy: ProtocolPolicy,
    pub verify_tls: bool,
    pub user_agent: Option<String>,
    pub log_dir: PathBuf,
}

impl ScanParams {
    /// Check every parameter and expand them into a plan.
    pub fn validate(&self) -> Result<ScanPlan, ValidationError> {
        let range = IpRange::parse(&self.start_ip, &self.end_ip)?;
        let ports = PortList::parse_all(self.ports.as_slice())?;
        if self.workers == 0 {
            return Err(ValidationError::ZeroWorkers);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::ZeroTimeout);
        }
        Ok(ScanPlan::new(range, ports, self.policy))
    }

    fn http_settings(&self) -> HttpSettings {
        let defaults = HttpSettings::default();
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            verify_tls: self.verify_tls,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
        }
    }
}

impl ScanCommand {
    /// Merge flags over settings. Missing addresses are left empty.
    pub(crate) fn resolve(&self, settings: &AppSettings) -> ScanParams {
        let ports = if self.ports.is_empty() {
            vec![settings.ports.to_string()]
        } else {
            self.ports.clone()
        };

        let output = self.output.clone().unwrap_or_else(|| match &settings.output_dir {
            Some(dir) => dir.join(output::default_output_name()),
            None => output::default_output_name(),
        });

        ScanParams {
            start_ip: self.start_ip.clone().unwrap_or_default(),
            end_ip: self.end_ip.clone().unwrap_or_default(),
            ports,
            timeout_secs: self.timeout.unwrap_or(settings.timeout_secs),
            workers: self.workers.unwrap_or(settings.workers),
            output,
            policy: self.policy.unwrap_or(settings.protocol_policy),
            verify_tls: self.verify_tls || settings.verify_tls,
            user_agent: settings.user_agent.clone(),
            log_dir: self
                .log_dir
                .clone()
                .or_else(|| settings.log_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    /// Execute the scan command.
    pub async fn execute(
        &self,
        settings: &AppSettings,
        verbose: bool,
        quiet: bool,
    ) -> anyhow::Result<ScanExit> {
        let params = self.resolve(settings);
        let logger = ScanLogger::open(&LogConfig {
            dir: params.log_dir.clone(),
            verbose,
            console: !quiet,
        })?;

        let exit = self
            .prompt_and_run(params, quiet)
            .with_subscriber(logger.dispatch().clone())
            .await;

        if !quiet {
            output::print_info(&format!("Log written to {}", logger.path().display()));
        }
        exit
    }

    /// Install the interrupt handler, fill in missing addresses, then scan.
    async fn prompt_and_run(&self, params: ScanParams, quiet: bool) -> anyhow::Result<ScanExit> {
        let shutdown = Shutdown::new();
        shutdown.listen_for_ctrl_c();

        let Some(params) = self.ask_missing(params, &shutdown).await? else {
            warn!("Interrupted before the scan started");
            return Ok(ScanExit::Interrupted);
        };

        run(params, quiet, self.progress, &shutdown).await
    }

    /// Prompt for addresses not given on the command line.
    ///
    /// `None` when the user interrupts the prompt.
    async fn ask_missing(
        &self,
        mut params: ScanParams,
        shutdown: &Shutdown,
    ) -> anyhow::Result<Option<ScanParams>> {
        if self.start_ip.is_none() {
            let answer = ask_until(|| ask_terminal("Enter starting IP address:"), shutdown)
                .await
                .context("failed to read start IP")?;
            let Some(ip) = answer else {
                return Ok(None);
            };
            params.start_ip = ip;
        }
        if self.end_ip.is_none() {
            let answer = ask_until(|| ask_terminal("Enter ending IP address:"), shutdown)
                .await
                .context("failed to read end IP")?;
            let Some(ip) = answer else {
                return Ok(None);
            };
            params.end_ip = ip;
        }
        Ok(Some(params))
    }
}

/// Scan with a real HTTP client.
async fn run(
    params: ScanParams,
    quiet: bool,
    progress: bool,
    shutdown: &Shutdown,
) -> anyhow::Result<ScanExit> {
    run_with(params, quiet, progress, shutdown, |params| {
        HttpProber::from_settings(&params.http_settings())
    })
    .await
}

/// Validate, scan, persist and report. Runs under the scan's logger.
///
/// `make_prober` is only called once the parameters are valid.
async fn run_with<P, F>(
    params: ScanParams,
    quiet: bool,
    progress: bool,
    shutdown: &Shutdown,
    make_prober: F,
) -> anyhow::Result<ScanExit>
where
    P: Prober + 'static,
    F: FnOnce(&ScanParams) -> ScanResult<P>,
{
    let plan = match params.validate() {
        Ok(plan) => plan,
        Err(e) => {
            error!("Invalid scan parameters: {e}");
            return Err(e.into());
        }
    };

    let prober = Arc::new(make_prober(&params).context("cannot start scan")?);

    let mut job = ScanJobConfig::new(params.workers);
    if progress && !quiet {
        job = job.with_progress();
    }

    if !quiet {
        output::print_scan_header(
            &plan.range.to_string(),
            &plan.ports.to_string(),
            plan.total_targets(),
            params.workers,
        );
    }

    let report = run_scan(prober, &plan, &job, shutdown).await?;

    let saved = match output::save_results(&params.output, &report.results) {
        Ok(()) => {
            info!("Results saved to {}", params.output.display());
            true
        }
        Err(e) => {
            error!("Error saving results: {e}");
            false
        }
    };

    if !quiet || !saved {
        output::print_report(&report).context("failed to print report")?;
    }
    if saved && !quiet {
        output::print_success(&format!(
            "{} titles saved to {}",
            report.results.len(),
            params.output.display()
        ));
    } else if !saved {
        output::print_warning("results could not be saved; see the report above");
    }

    // Ctrl+C while saving or printing still counts.
    Ok(if report.interrupted || shutdown.is_triggered() {
        ScanExit::Interrupted
    } else {
        ScanExit::Completed
    })
}
