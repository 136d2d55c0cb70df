#[cfg(test)]
mod tests {
    use dnsload_driver::command::{CommandSpec, LaunchError};
    use dnsload_driver::config::DnsperfConfig;
    use dnsload_driver::supervisor::{dnsperf_command, Supervisor, SupervisorState};
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    use std::path::Path;
    use std::time::{Duration, Instant};

    fn sleep_command(secs: &str) -> CommandSpec {
        CommandSpec::new("sleep", vec![secs.to_string()])
    }

    #[test]
    fn test_dnsperf_argument_set() {
        let config = DnsperfConfig::default();
        let spec = dnsperf_command(&config, "9.9.9.9", Path::new("dnsperf_files/domains_1_1_to_100000.csv"));

        assert_eq!(spec.program, "dnsperf");
        assert_eq!(
            spec.args,
            vec![
                "-s", "9.9.9.9",
                "-d", "dnsperf_files/domains_1_1_to_100000.csv",
                "-c", "10",
                "-Q", "1000000",
                "-q", "1000000",
                "-T", "6",
                "-l", "20",
                "-S", "1",
                "-t", "30",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let mut supervisor = Supervisor::new(
            CommandSpec::new("dnsload-no-such-binary", vec![]),
            Duration::from_millis(10),
            Some(Duration::from_millis(50)),
        );

        let err = supervisor.run().await.unwrap_err();
        assert!(matches!(err, LaunchError::NotFound { .. }));
        assert!(err.to_string().contains("dnsload-no-such-binary"));
    }

    #[tokio::test]
    async fn test_lifecycle_states() {
        let mut supervisor = Supervisor::new(
            sleep_command("30"),
            Duration::from_millis(50),
            None,
        );
        assert_eq!(supervisor.state(), SupervisorState::Idle);
        assert!(!supervisor.has_child());

        supervisor.start().unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Running);
        assert!(supervisor.has_child());

        supervisor.restart().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Running);
        assert!(supervisor.has_child());

        supervisor.shutdown().await;
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert!(!supervisor.has_child());
    }

    #[tokio::test]
    async fn test_bounded_run_terminates_and_reaps() {
        let mut supervisor = Supervisor::new(
            sleep_command("30"),
            Duration::from_millis(50),
            Some(Duration::from_millis(200)),
        );

        let started = Instant::now();
        supervisor.run().await.unwrap();

        // the budget, plus at most one trailing restart interval
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
        assert!(!supervisor.has_child());
    }

    #[tokio::test]
    async fn test_restart_kills_previous_child() {
        let mut supervisor = Supervisor::new(
            sleep_command("30"),
            Duration::from_millis(50),
            None,
        );
        supervisor.start().unwrap();
        let old_pid = supervisor.child_id().unwrap();

        supervisor.restart().await.unwrap();
        let new_pid = supervisor.child_id().unwrap();
        assert_ne!(old_pid, new_pid);

        // the previous child was killed and reaped before the
        // replacement spawned, so only one child is ever alive
        assert_eq!(
            kill(Pid::from_raw(old_pid as i32), None),
            Err(Errno::ESRCH)
        );
        assert!(kill(Pid::from_raw(new_pid as i32), None).is_ok());

        supervisor.shutdown().await;
        assert!(!supervisor.has_child());
    }

    #[tokio::test]
    async fn test_restart_replaces_exited_child() {
        // child exits immediately; restart must still reap and relaunch
        let mut supervisor = Supervisor::new(
            CommandSpec::new("true", vec![]),
            Duration::from_millis(10),
            None,
        );
        supervisor.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        supervisor.restart().await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Running);
        assert!(supervisor.has_child());

        supervisor.shutdown().await;
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
    }
}
