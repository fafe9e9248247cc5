//! End-to-end runs of the `cira` binary over small on-disk fixtures.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const BUMP_MAP_CSV: &str = "\
Name,X,Y,Type,Spare
rxdata0_phy,0.0,0.0,DATA,False
rxdata1_phy,25.0,0.0,DATA,False
spare0_phy,50.0,0.0,SPARE,True
spare1_phy,75.0,0.0,SPARE,True
VSS_phy,100.0,0.0,GND,False
";

/// Two signals, two spares, every signal can reach every spare.
const IRL_TWO_SPARES: &str = "\
# demo repair chain
Chain_0:
  FP0:
    Name: rxdata0
    Default:
      To: rxdata0_phy
      Control: {Mux: M0, Sel: 0}
    Repair:
      To: spare0_phy
      Control: {Mux: M0, Sel: 1}
    Repair_1:
      To: spare1_phy
      Control: {Mux: M0, Sel: 2}
  FP1:
    Name: rxdata1
    Default:
      To: rxdata1_phy
      Control: {Mux: M1, Sel: 0}
    Repair:
      To: spare0_phy
      Control: {Mux: M1, Sel: 1}
    Repair_1:
      To: spare1_phy
      Control: {Mux: M1, Sel: 2}
";

/// Same chain with the second spare removed.
const IRL_ONE_SPARE: &str = "\
Chain_0:
  FP0:
    Name: rxdata0
    Default:
      To: rxdata0_phy
      Control: {Mux: M0, Sel: 0}
    Repair:
      To: spare0_phy
      Control: {Mux: M0, Sel: 1}
  FP1:
    Name: rxdata1
    Default:
      To: rxdata1_phy
      Control: {Mux: M1, Sel: 0}
    Repair:
      To: spare0_phy
      Control: {Mux: M1, Sel: 1}
";

const ASPECT_CSV: &str = "\
Type,Color,Shape
DATA,blue,Circle
GND,black,Square
POWER,orange,Square
SPARE,green,Triangle
Benign,gray,Line
Repairable,blue,Line
Unrepairable,purple,Line
Catastrophic,red,Line
";

fn write_fixture(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn cira() -> Command {
    Command::cargo_bin("cira").unwrap()
}

#[test]
fn statistics_on_open_faults_are_fully_repairable() {
    let dir = tempfile::tempdir().unwrap();
    let map = write_fixture(dir.path(), "map.csv", BUMP_MAP_CSV);
    let irl = write_fixture(dir.path(), "irl.yaml", IRL_TWO_SPARES);
    let table = dir.path().join("Reparability_Table.csv");

    cira()
        .arg("--Reparability_Statistics")
        .arg("--Fault_Type")
        .arg("Open")
        .arg("--BumpMap_file_name")
        .arg(&map)
        .arg("--IRL_file_name")
        .arg(&irl)
        .arg("--Fault_Table_file_name")
        .arg(dir.path().join("Fault_Table.csv"))
        .arg("--Reparability_Table_file_name")
        .arg(&table)
        .assert()
        .success();

    let content = fs::read_to_string(&table).unwrap();
    // One row per bump: the two signals resolve Repairable, the rest Benign.
    assert_eq!(content.matches("Repairable").count(), 2);
    assert_eq!(content.matches("Benign").count(), 3);
    assert!(!content.contains("Unrepairable"));
}

#[test]
fn adjacent_short_with_two_spares_is_repairable() {
    let dir = tempfile::tempdir().unwrap();
    let map = write_fixture(dir.path(), "map.csv", BUMP_MAP_CSV);
    let irl = write_fixture(dir.path(), "irl.yaml", IRL_TWO_SPARES);
    let table = dir.path().join("Repair_Solutions_Table.csv");

    cira()
        .arg("--Repair_Solutions")
        .arg("--Fault_Type")
        .arg("Short")
        .arg("--Shorted_Bumps_Number")
        .arg("2")
        .arg("--Short_Distance")
        .arg("26")
        .arg("--BumpMap_file_name")
        .arg(&map)
        .arg("--IRL_file_name")
        .arg(&irl)
        .arg("--Fault_Table_file_name")
        .arg(dir.path().join("Fault_Table.csv"))
        .arg("--Repair_Solutions_Table_file_name")
        .arg(&table)
        .assert()
        .success();

    let content = fs::read_to_string(&table).unwrap();
    // The rxdata0/rxdata1 short reroutes both signals onto the spares.
    let rx_line = content
        .lines()
        .find(|l| l.contains("rxdata0_phy") && l.contains("rxdata1_phy"))
        .expect("short on the adjacent data pair");
    assert!(rx_line.contains("Repairable"));
    assert!(rx_line.contains("M0"));
    assert!(rx_line.contains("M1"));
}

#[test]
fn adjacent_short_with_one_spare_is_unrepairable() {
    let dir = tempfile::tempdir().unwrap();
    let map = write_fixture(dir.path(), "map.csv", BUMP_MAP_CSV);
    let irl = write_fixture(dir.path(), "irl.yaml", IRL_ONE_SPARE);
    let table = dir.path().join("Reparability_Table.csv");

    cira()
        .arg("--Reparability_Statistics")
        .arg("--Fault_Type")
        .arg("Short")
        .arg("--Shorted_Bumps_Number")
        .arg("2")
        .arg("--BumpMap_file_name")
        .arg(&map)
        .arg("--IRL_file_name")
        .arg(&irl)
        .arg("--Fault_Table_file_name")
        .arg(dir.path().join("Fault_Table.csv"))
        .arg("--Reparability_Table_file_name")
        .arg(&table)
        .assert()
        .success();

    let content = fs::read_to_string(&table).unwrap();
    let rx_line = content
        .lines()
        .find(|l| l.contains("rxdata0_phy") && l.contains("rxdata1_phy"))
        .expect("short on the adjacent data pair");
    assert!(rx_line.contains("Unrepairable"));
}

#[test]
fn yield_sweep_is_deterministic_per_seed() {
    let dir = tempfile::tempdir().unwrap();
    let map = write_fixture(dir.path(), "map.csv", BUMP_MAP_CSV);
    let irl = write_fixture(dir.path(), "irl.yaml", IRL_TWO_SPARES);

    let run = |out: &Path| {
        cira()
            .arg("--Meta_Analysis")
            .arg("--Seed")
            .arg("42")
            .arg("--Min_Yield")
            .arg("0.95")
            .arg("--Max_Yield")
            .arg("1.0")
            .arg("--Number_of_faults_tested")
            .arg("200")
            .arg("--Number_of_electrical_yield_tested")
            .arg("5")
            .arg("--BumpMap_file_name")
            .arg(&map)
            .arg("--IRL_file_name")
            .arg(&irl)
            .arg("--Yield_Table_file_name")
            .arg(out)
            .assert()
            .success();
    };

    let first = dir.path().join("yield_a.csv");
    let second = dir.path().join("yield_b.csv");
    run(&first);
    run(&second);

    let a = fs::read_to_string(&first).unwrap();
    let b = fs::read_to_string(&second).unwrap();
    assert_eq!(a, b);

    // Perfect electrical yield ends the sweep at 1.0 both ways.
    let last = a.lines().last().unwrap();
    assert!(last.starts_with('1'));
    assert!(last.ends_with(",1"));
}

#[test]
fn render_writes_svg() {
    let dir = tempfile::tempdir().unwrap();
    let map = write_fixture(dir.path(), "map.csv", BUMP_MAP_CSV);
    let irl = write_fixture(dir.path(), "irl.yaml", IRL_TWO_SPARES);
    let aspect = write_fixture(dir.path(), "aspect.csv", ASPECT_CSV);
    let svg = dir.path().join("BumpMap.svg");

    cira()
        .arg("--Create_SVG")
        .arg("--Display_Reparability_SVG")
        .arg("--Legend")
        .arg("--BumpMap_file_name")
        .arg(&map)
        .arg("--IRL_file_name")
        .arg(&irl)
        .arg("--Aspect_file_name")
        .arg(&aspect)
        .arg("--BumpMap_SVG_image_file_name")
        .arg(&svg)
        .assert()
        .success();

    let content = fs::read_to_string(&svg).unwrap();
    assert!(content.starts_with("<?xml"));
    assert!(content.contains("<circle"));
    assert!(content.contains("<line"));
}

#[test]
fn unsupported_bump_map_extension_fails() {
    let dir = tempfile::tempdir().unwrap();
    let map = write_fixture(dir.path(), "map.parquet", BUMP_MAP_CSV);
    let irl = write_fixture(dir.path(), "irl.yaml", IRL_TWO_SPARES);

    cira()
        .arg("--Reparability_Statistics")
        .arg("--BumpMap_file_name")
        .arg(&map)
        .arg("--IRL_file_name")
        .arg(&irl)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Input format error").or(predicate::str::contains("unsupported")));
}

#[test]
fn missing_inputs_fail() {
    cira().arg("--Reparability_Statistics").assert().failure();
}

#[test]
fn no_phase_selected_is_a_noop() {
    cira().assert().success();
}

#[test]
fn irl_referencing_unknown_bump_fails() {
    let dir = tempfile::tempdir().unwrap();
    let map = write_fixture(dir.path(), "map.csv", BUMP_MAP_CSV);
    let irl = write_fixture(
        dir.path(),
        "irl.yaml",
        "Chain_0:\n  FP0:\n    Name: ghost\n    Default:\n      To: ghost_phy\n      Control: {Mux: M9, Sel: 0}\n",
    );

    cira()
        .arg("--Reparability_Statistics")
        .arg("--BumpMap_file_name")
        .arg(&map)
        .arg("--IRL_file_name")
        .arg(&irl)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Missing reference").or(predicate::str::contains("ghost_phy")));
}
