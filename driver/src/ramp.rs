use crate::command::{CommandSpec, LaunchError};
use crate::config::ResperfConfig;
use crate::runlog::RunLog;
use crate::split;
use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use regex::Regex;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// Build the resperf ramp argument set: attempt up to `max_qps`,
/// increasing by `ramp_rate` per second, then hold for `hold_secs`.
pub fn resperf_command(config: &ResperfConfig, server: &str, data_file: &Path) -> CommandSpec {
    CommandSpec::new(
        config.binary.clone(),
        vec![
            "-s".to_string(),
            server.to_string(),
            "-d".to_string(),
            data_file.display().to_string(),
            "-m".to_string(),
            config.max_qps.to_string(),
            "-r".to_string(),
            config.ramp_rate.to_string(),
            "-c".to_string(),
            config.hold_secs.to_string(),
            "-C".to_string(),
            config.clients.to_string(),
        ],
    )
}

/// Running maximum over throughput figures scraped from resperf output.
///
/// Only lines mentioning `responses/sec` or `qps` qualify; on those,
/// every whitespace-separated token that is entirely numeric (digits,
/// comma group separators, optional decimal part) is parsed and the
/// largest value seen so far is kept.
pub struct PeakTracker {
    token: Regex,
    peak: f64,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self {
            token: Regex::new(r"^\d[\d,]*(\.\d+)?$").expect("static pattern"),
            peak: 0.0,
        }
    }

    pub fn observe(&mut self, line: &str) {
        let lower = line.to_ascii_lowercase();
        if !lower.contains("responses/sec") && !lower.contains("qps") {
            return;
        }
        for token in line.split_whitespace() {
            if !self.token.is_match(token) {
                continue;
            }
            if let Ok(value) = token.replace(',', "").parse::<f64>() {
                if value > self.peak {
                    self.peak = value;
                }
            }
        }
    }

    pub fn peak(&self) -> f64 {
        self.peak
    }
}

impl Default for PeakTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn terminate(child: &mut Child) {
    if let Some(pid) = child.id() {
        match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!("failed to signal pid {}: {}", pid, e),
        }
    }
}

enum StreamOutcome {
    Completed(ExitStatus),
    Interrupted,
}

/// Stream the child's stdout and stderr to the console, the capture
/// buffer, and the peak tracker until it exits. Terminates the child
/// itself on an operator interrupt; any read failure is returned with
/// the child still running for the caller to tear down.
async fn stream_child(
    child: &mut Child,
    tracker: &mut PeakTracker,
    captured: &mut String,
) -> Result<StreamOutcome> {
    let stdout = child
        .stdout
        .take()
        .context("resperf stdout not captured")?;
    let stderr = child
        .stderr
        .take()
        .context("resperf stderr not captured")?;
    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            line = stdout_lines.next_line(), if stdout_open => {
                match line.context("failed to read resperf stdout")? {
                    Some(line) => {
                        println!("{}", line);
                        tracker.observe(&line);
                        captured.push_str(&line);
                        captured.push('\n');
                    }
                    None => stdout_open = false,
                }
            }
            line = stderr_lines.next_line(), if stderr_open => {
                match line.context("failed to read resperf stderr")? {
                    Some(line) => {
                        println!("{}", line);
                        tracker.observe(&line);
                        captured.push_str(&line);
                        captured.push('\n');
                    }
                    None => stderr_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nInterrupted by user");
                terminate(child);
                if let Err(e) = child.wait().await {
                    warn!("failed to reap resperf: {}", e);
                }
                return Ok(StreamOutcome::Interrupted);
            }
        }
    }

    let status = child.wait().await.context("failed to wait for resperf")?;
    Ok(StreamOutcome::Completed(status))
}

/// Drive resperf through an increasing-load ramp against `server`,
/// streaming its output to the console while scraping for the peak
/// throughput figure. The full captured output and the peak are
/// appended to the run log when the child exits. Returns the peak.
pub async fn run_ramp(config: &ResperfConfig, server: &str, ranking: &Path) -> Result<f64> {
    if !ranking.exists() {
        anyhow::bail!("ranking file {} not found", ranking.display());
    }

    let data_file = Path::new(&config.data_file);
    let count = split::convert_ranking(ranking, data_file)?;

    let log = RunLog::new(&config.log_file);

    println!("{}", "=".repeat(60));
    println!("Running resperf to find maximum QPS");
    println!("  DNS server: {}", server);
    println!("  Data file: {} ({} domains)", data_file.display(), count);
    println!("  Max QPS target: {}", config.max_qps);
    println!("  Ramp rate: {} QPS/second", config.ramp_rate);
    println!("{}", "=".repeat(60));
    println!("\nThis will gradually increase load until the server breaks.\n");

    log.log(&format!("RESPERF STARTED - DNS: {}", server))?;

    let spec = resperf_command(config, server, data_file);
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            let launch = LaunchError::from_io(&spec.program, e);
            log.log(&format!("RESPERF ERROR - {}", launch))?;
            return Err(launch.into());
        }
    };

    let mut tracker = PeakTracker::new();
    let mut captured = String::new();

    let status = match stream_child(&mut child, &mut tracker, &mut captured).await {
        Ok(StreamOutcome::Completed(status)) => status,
        Ok(StreamOutcome::Interrupted) => {
            log.log("RESPERF INTERRUPTED by user")?;
            anyhow::bail!("interrupted by user");
        }
        Err(e) => {
            terminate(&mut child);
            if let Err(reap) = child.wait().await {
                warn!("failed to reap resperf: {}", reap);
            }
            log.log(&format!("RESPERF ERROR - {}", e))?;
            return Err(e);
        }
    };

    if !status.success() {
        warn!("resperf exited with {}", status);
    }

    let peak = tracker.peak();
    log.log(&format!("RESPERF COMPLETED - Max QPS observed: {:.0}", peak))?;
    log.log(&format!("Full output:\n{}", captured))?;

    println!("\n{}", "=".repeat(60));
    println!("Maximum QPS observed: {:.0}", peak);
    println!("Results logged to {}", config.log_file);
    println!("{}", "=".repeat(60));

    info!("ramp complete, peak {:.0} responses/sec", peak);
    Ok(peak)
}
