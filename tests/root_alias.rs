//! Walking the current directory through the `.` alias.
//!
//! Kept in its own test binary because it changes the working directory.

use std::fs;
use std::path::Path;

use reb_parser::{FileStatus, Region, StationCatalog, process_directory};
use tempfile::TempDir;

const BULLETIN: &str = "EVENT 15761185 NORTHERN MID-ATLANTIC RIDGE\n\
    \x20  Date       Time        Err   RMS Latitude Longitude\n\
    2018/05/03 04:12:41.81   0.74  0.68  31.8863  -40.6214\n\
    \n\
    Sta     Dist  EvAz Phase\n\
    NVAR   45.12  52.3 P\n\
    \n\
    \n\
    \n";

#[test]
fn test_dot_root_skips_its_own_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), BULLETIN.replace("15761185", "1")).unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/b.txt"), BULLETIN.replace("15761185", "2")).unwrap();

    let region = Region::Box {
        lat_max: 36.0,
        lat_min: 25.0,
        long_min: -46.0,
        long_max: -35.0,
    };
    let catalog: StationCatalog = ["NVAR"].into_iter().collect();

    std::env::set_current_dir(dir.path()).unwrap();
    let report = process_directory(Path::new("."), &region, &catalog).unwrap();

    let ids: Vec<&str> = report.events.iter().map(|e| e.event_id.as_str()).collect();
    assert_eq!(ids, vec!["2"]);
    assert_eq!(
        report.statuses,
        vec![FileStatus::Processed {
            path: Path::new(".").join("sub").join("b.txt"),
            events: 1,
        }]
    );
}
