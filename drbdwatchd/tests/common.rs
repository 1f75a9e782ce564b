#![allow(unused)]

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use drbdwatchd::{Parameters, WatchResult, Watcher, WatcherCtrl};

pub const NAP: Duration = Duration::from_millis(10);
pub const TIMEOUT: Duration = Duration::from_secs(10);

pub const PROC_DRBD_1: &str = "version: 8.4.10 (api:1/proto:86-101)
srcversion: 15111D056BF899E7D986DDD
 0: cs:WFConnection ro:Secondary/Unknown ds:UpToDate/DUnknown C r-----
    ns:0 nr:0 dw:0 dr:0 al:0 bm:0 lo:0 pe:0 ua:0 ap:0 ep:1 wo:f oos:2649072
";

pub const PROC_DRBD_2: &str = "version: 8.4.11 (api:1/proto:86-101)
srcversion: FC3433D849E3B88C1E7B55C
 0: cs:SyncSource ro:Primary/Secondary ds:UpToDate/Inconsistent C r-----
    ns:56582812 nr:0 dw:156299240 dr:71719920 al:1524 bm:0 lo:0 pe:0 ua:0 ap:0 ep:1 wo:f oos:106597444
        [=====>..............] sync'ed: 34.7% (104096/159172)M
        finish: 0:53:57 speed: 32,924 (30,140) K/sec
 1: cs:SyncSource ro:Primary/Secondary ds:UpToDate/Inconsistent C r-----
    ns:11974408 nr:0 dw:540488000 dr:13652852 al:3316 bm:0 lo:1 pe:0 ua:0 ap:0 ep:1 wo:f oos:512191896
        [>....................] sync'ed:  2.3% (500184/511704)M
        finish: 12:01:41 speed: 11,812 (11,052) K/sec
";

pub const FSTAB: &str = "UUID=65429799-d704-460d-b471-e5f04f64a221 / ext4 defaults 0 0
/dev/drbd0  /r0 btrfs noauto,rw,relatime,space_cache,subvolid=5,subvol=/,ssd 0 0
";

pub const PROC_MOUNTS: &str = "sysfs /sys sysfs rw,nosuid,nodev,noexec,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
/dev/sda2 / ext4 rw,relatime,data=ordered 0 0
/dev/drbd1 /mnt/r1 ext4 rw,relatime 0 0
";

/// Write `contents` atomically, like the kernel would present it
pub fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// A watcher running in a background thread over a temporary directory
///
/// Every command invocation appends one line to `output`:
/// `resource|new connection|old connection|all mounts`.
pub struct TestWatcher {
    dir: tempfile::TempDir,
    ctrl: WatcherCtrl,
    join_handle: Option<JoinHandle<WatchResult<()>>>,
}

impl TestWatcher {
    pub fn new(ignore_errors: bool, extra_script: &str) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        write_file(&dir.path().join("etc-fstab"), FSTAB)?;
        write_file(&dir.path().join("proc-mounts"), PROC_MOUNTS)?;

        let script = format!(
            "printf '%s|%s|%s|%s\\n' \"$1\" \"$2\" \"$OLD_CONNECTED_STATE\" \"$ALL_MOUNTS\" >> '{}'; {}",
            dir.path().join("output").display(),
            extra_script,
        );

        let watcher = Watcher::new(Self::params(dir.path(), ignore_errors, &script))?;
        let ctrl = watcher.get_ctrl();
        let join_handle = thread::spawn(move || watcher.run());

        Ok(Self {
            dir,
            ctrl,
            join_handle: Some(join_handle),
        })
    }

    pub fn params(dir: &Path, ignore_errors: bool, script: &str) -> Parameters {
        Parameters::builder()
            .status_path(dir.join("proc-drbd"))
            .fstab_path(dir.join("etc-fstab"))
            .proc_mounts_path(dir.join("proc-mounts"))
            .poll_interval(NAP)
            .ignore_errors(ignore_errors)
            .command(["sh", "-c", script, "sh"].map(OsString::from).to_vec())
            .build()
    }

    pub fn status_path(&self) -> PathBuf {
        self.dir.path().join("proc-drbd")
    }

    pub fn output_lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("output"))
            .map(|s| s.lines().map(ToOwned::to_owned).collect())
            .unwrap_or_default()
    }

    /// Wait until at least `n` output lines are there
    pub fn wait_for_lines(&self, n: usize) -> Vec<String> {
        let start = Instant::now();
        loop {
            let lines = self.output_lines();
            if n <= lines.len() {
                return lines;
            }
            assert!(
                start.elapsed() < TIMEOUT,
                "expected {n} lines, got: {lines:?}"
            );
            thread::sleep(NAP);
        }
    }

    /// Stop the watcher and return its result
    pub fn stop(mut self) -> WatchResult<()> {
        self.ctrl.stop();
        self.join_handle
            .take()
            .expect("not joined yet")
            .join()
            .expect("watcher thread panicked")
    }

    /// Wait for the watcher to finish on its own
    pub fn join(mut self) -> WatchResult<()> {
        self.join_handle
            .take()
            .expect("not joined yet")
            .join()
            .expect("watcher thread panicked")
    }
}

impl Drop for TestWatcher {
    fn drop(&mut self) {
        self.ctrl.stop();
        if let Some(join_handle) = self.join_handle.take() {
            let _ = join_handle.join();
        }
    }
}
