use std::io;
use std::path::Path;

use drbdwatch_api::State;

/// State differing from others only by connection status
pub fn state(connection: &str) -> State {
    State {
        connection: connection.into(),
        ..State::default()
    }
}

/// Write `contents` atomically (via a temporary file and a rename)
pub fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

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
 2: cs:SyncSource ro:Primary/Secondary ds:UpToDate/Inconsistent C r-----
    ns:2740340 nr:0 dw:1310467600 dr:4758343 al:24 bm:0 lo:1 pe:0 ua:0 ap:0 ep:1 wo:f oos:1433206068
        [>....................] sync'ed:  0.2% (1399612/1402120)M
        finish: 181:44:49 speed: 2,180 (2,404) K/sec
";

pub const FSTAB: &str = "UUID=65429799-d704-460d-b471-e5f04f64a221 / ext4 defaults 0 0
# replicated
/dev/drbd0  /r0 btrfs noauto,rw,relatime,space_cache,subvolid=5,subvol=/,ssd 0 0
/dev/drbd1\t/srv/data ext4 noauto 0 0
/dev/drbd10 /r10 ext4 noauto 0 0
";
