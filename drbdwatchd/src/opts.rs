use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Run a command every time the state of a DRBD resource changes
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Opts {
    /// Amount of time to sleep between checking the status file
    #[clap(long = "sleep", default_value = "1s", value_parser = humantime::parse_duration)]
    pub sleep: Duration,

    /// Keep running even if the command or mount point lookup fails
    #[clap(long = "ignore-errors")]
    pub ignore_errors: bool,

    #[clap(long = "status-file", default_value = "/proc/drbd", hide = true)]
    pub status_file: PathBuf,

    #[clap(long = "fstab", default_value = "/etc/fstab", hide = true)]
    pub fstab: PathBuf,

    #[clap(long = "proc-mounts", default_value = "/proc/mounts", hide = true)]
    pub proc_mounts: PathBuf,

    /// Command to run, followed by its arguments
    #[clap(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<OsString>,
}

impl Opts {
    pub fn from_args() -> Self {
        Opts::parse()
    }
}

#[cfg(test)]
fn sleep_of(value: &str) -> Result<Duration, clap::Error> {
    Opts::try_parse_from(["drbdwatchd", "--sleep", value, "notify.sh"]).map(|opts| opts.sleep)
}

#[test]
fn sleep_durations() {
    assert_eq!(sleep_of("1s").unwrap(), Duration::from_secs(1));
    assert_eq!(sleep_of("100ms").unwrap(), Duration::from_millis(100));
    assert_eq!(sleep_of("250us").unwrap(), Duration::from_micros(250));
    assert_eq!(sleep_of("1m30s").unwrap(), Duration::from_secs(90));
    assert_eq!(sleep_of("1s 500ms").unwrap(), Duration::from_millis(1500));
    assert_eq!(sleep_of("1h").unwrap(), Duration::from_secs(3600));

    assert!(sleep_of("s").is_err());
    assert!(sleep_of("5 parsecs").is_err());
    // overflows a u64 of seconds
    assert!(sleep_of("6000000000000000h").is_err());

    let opts = Opts::parse_from(["drbdwatchd", "notify.sh"]);
    assert_eq!(opts.sleep, Duration::from_secs(1));
}

#[test]
fn command_takes_the_rest() {
    let opts = Opts::parse_from(["drbdwatchd", "--sleep", "50ms", "notify.sh", "--verbose", "x"]);
    assert_eq!(opts.sleep, Duration::from_millis(50));
    assert!(!opts.ignore_errors);
    assert_eq!(opts.status_file, PathBuf::from("/proc/drbd"));
    assert_eq!(opts.command, ["notify.sh", "--verbose", "x"].map(OsString::from));

    assert!(Opts::try_parse_from(["drbdwatchd", "--ignore-errors"]).is_err());
}
