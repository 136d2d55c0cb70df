use crate::command::{CommandSpec, LaunchError};
use crate::config::DnsperfConfig;
use anyhow::Result;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Build the fixed dnsperf argument set for one shard against one
/// target resolver.
pub fn dnsperf_command(config: &DnsperfConfig, server: &str, shard: &Path) -> CommandSpec {
    CommandSpec::new(
        config.binary.clone(),
        vec![
            "-s".to_string(),
            server.to_string(),
            "-d".to_string(),
            shard.display().to_string(),
            "-c".to_string(),
            config.clients.to_string(),
            "-Q".to_string(),
            config.max_queries.to_string(),
            "-q".to_string(),
            config.max_outstanding.to_string(),
            "-T".to_string(),
            config.threads.to_string(),
            "-l".to_string(),
            config.run_length_secs.to_string(),
            "-S".to_string(),
            config.stats_interval_secs.to_string(),
            "-t".to_string(),
            config.timeout_secs.to_string(),
        ],
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Restarting,
    Stopped,
}

/// Restart-on-timer supervisor for one benchmarking child process.
///
/// Holds a single owned child handle: the current child is always
/// killed and reaped before its replacement is spawned, so at most one
/// child is alive at any point in the cycle.
pub struct Supervisor {
    command: CommandSpec,
    restart_interval: Duration,
    total_runtime: Option<Duration>,
    state: SupervisorState,
    child: Option<Child>,
}

impl Supervisor {
    pub fn new(
        command: CommandSpec,
        restart_interval: Duration,
        total_runtime: Option<Duration>,
    ) -> Self {
        Self {
            command,
            restart_interval,
            total_runtime,
            state: SupervisorState::Idle,
            child: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn has_child(&self) -> bool {
        self.child.is_some()
    }

    /// Pid of the current child, if one is running.
    pub fn child_id(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.id())
    }

    fn spawn_child(&mut self) -> Result<(), LaunchError> {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            // Own process group, so a terminal interrupt reaches only
            // the supervisor and the child stops when we say so.
            .process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| LaunchError::from_io(&self.command.program, e))?;
        debug!(pid = child.id(), "spawned {}", self.command.program);
        self.child = Some(child);
        Ok(())
    }

    /// Hard-kill and reap the current child, if any. Never fails: a
    /// child that already exited is simply reaped.
    async fn kill_current(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Some(pid) = child.id() {
                match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    Ok(()) | Err(Errno::ESRCH) => {}
                    Err(e) => warn!("failed to signal pid {}: {}", pid, e),
                }
            }
            if let Err(e) = child.wait().await {
                warn!("failed to reap child: {}", e);
            }
        }
    }

    /// Idle -> Running: launch the child. A spawn failure is escalated
    /// to the caller, never swallowed.
    pub fn start(&mut self) -> Result<(), LaunchError> {
        if self.child.is_some() {
            warn!("child already running");
            return Ok(());
        }
        self.spawn_child()?;
        self.state = SupervisorState::Running;
        Ok(())
    }

    /// Running -> Restarting -> Running: kill-and-relaunch, not a drain.
    pub async fn restart(&mut self) -> Result<(), LaunchError> {
        self.state = SupervisorState::Restarting;
        self.kill_current().await;
        self.spawn_child()?;
        self.state = SupervisorState::Running;
        Ok(())
    }

    /// Terminate any still-running child unconditionally. -> Stopped.
    pub async fn shutdown(&mut self) {
        self.kill_current().await;
        self.state = SupervisorState::Stopped;
    }

    /// Run the full restart cycle: spawn, then kill-and-relaunch every
    /// `restart_interval` until the total-runtime budget elapses, or
    /// forever when no budget is set.
    pub async fn run(&mut self) -> Result<(), LaunchError> {
        let deadline = self.total_runtime.map(|budget| Instant::now() + budget);

        self.start()?;
        loop {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }
            sleep(self.restart_interval).await;
            self.restart().await?;
        }
        self.shutdown().await;
        Ok(())
    }
}

/// Launch `workers` independent supervisors against the same shard and
/// target. There is no coordination or shared rate limiting between
/// workers; aggregate load is workers x the per-worker configuration.
///
/// A worker failure is logged and does not stop its siblings, but any
/// failure makes the overall run fail. An operator interrupt tears all
/// workers down (their children die with them) and is reported as an
/// error so the process exits nonzero.
pub async fn run_parallel(
    config: &DnsperfConfig,
    server: &str,
    shard: &Path,
    workers: usize,
) -> Result<()> {
    let command = dnsperf_command(config, server, shard);
    let restart_interval = Duration::from_secs(config.restart_interval_secs);
    let total_runtime = config.total_runtime_secs.map(Duration::from_secs);

    info!(
        "starting {} worker(s): {} against {} (restart every {}s)",
        workers,
        config.binary,
        server,
        config.restart_interval_secs
    );

    let mut set = JoinSet::new();
    for worker in 0..workers {
        let mut supervisor = Supervisor::new(command.clone(), restart_interval, total_runtime);
        set.spawn(
            async move { supervisor.run().await }.instrument(info_span!("worker", id = worker)),
        );
    }

    let mut failures = 0usize;
    loop {
        tokio::select! {
            joined = set.join_next() => match joined {
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(e))) => {
                    error!("worker failed: {}", e);
                    failures += 1;
                }
                Some(Err(e)) => {
                    error!("worker task panicked: {}", e);
                    failures += 1;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, stopping workers");
                set.shutdown().await;
                anyhow::bail!("interrupted by user");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} worker(s) failed", failures);
    }
    Ok(())
}
