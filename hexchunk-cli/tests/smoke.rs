use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::process::Command;

fn write_random(path: &std::path::Path, bytes: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<u8> = (0..bytes).map(|_| rng.gen()).collect();
    std::fs::write(path, data).unwrap();
}

#[test]
fn chunk_verify_reassemble_happy_path() {
    let td = assert_fs::TempDir::new().unwrap();
    let src = td.child("big.bin");
    write_random(src.path(), 2 * 1024 * 1024 + 12_345, 1);

    Command::cargo_bin("hexchunk")
        .unwrap()
        .current_dir(td.path())
        .args(["chunk", "big.bin", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chunking complete. 3 chunk(s)"))
        .stdout(predicate::str::contains("big.bin_metadata.json"));

    td.child("big.bin_01_03.json").assert(predicate::path::exists());
    td.child("big.bin_03_03.json").assert(predicate::path::exists());

    Command::cargo_bin("hexchunk")
        .unwrap()
        .current_dir(td.path())
        .args(["verify", "big.bin_metadata.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));

    Command::cargo_bin("hexchunk")
        .unwrap()
        .current_dir(td.path())
        .args(["reassemble", "big.bin_metadata.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Checksum verified"));

    let original = std::fs::read(src.path()).unwrap();
    let rebuilt = std::fs::read(td.child("reassembled_big.bin").path()).unwrap();
    assert_eq!(original, rebuilt);
}

#[test]
fn output_dirs_are_honoured() {
    let td = assert_fs::TempDir::new().unwrap();
    let src = td.child("in.dat");
    write_random(src.path(), 1_500_000, 2);

    Command::cargo_bin("hexchunk")
        .unwrap()
        .current_dir(td.path())
        .args(["chunk", "in.dat", "1", "--output-dir", "parts"])
        .assert()
        .success();
    td.child("parts/in.dat_metadata.json").assert(predicate::path::exists());

    Command::cargo_bin("hexchunk")
        .unwrap()
        .current_dir(td.path())
        .args(["reassemble", "parts/in.dat_metadata.json", "--output-dir", "restored"])
        .assert()
        .success();
    let rebuilt = std::fs::read(td.child("restored/reassembled_in.dat").path()).unwrap();
    assert_eq!(rebuilt, std::fs::read(src.path()).unwrap());
}

#[test]
fn tampered_chunk_fails_with_nonzero_exit_but_keeps_output() {
    let td = assert_fs::TempDir::new().unwrap();
    write_random(td.child("t.bin").path(), 1_200_000, 3);
    Command::cargo_bin("hexchunk")
        .unwrap()
        .current_dir(td.path())
        .args(["chunk", "t.bin", "1"])
        .assert()
        .success();

    let chunk = td.child("t.bin_02_02.json");
    let mut v: serde_json::Value =
        serde_json::from_slice(&std::fs::read(chunk.path()).unwrap()).unwrap();
    let data = v["chunk_data"].as_str().unwrap().to_string();
    let flipped = if data.starts_with('0') { format!("1{}", &data[1..]) } else { format!("0{}", &data[1..]) };
    v["chunk_data"] = serde_json::Value::String(flipped);
    std::fs::write(chunk.path(), serde_json::to_vec(&v).unwrap()).unwrap();

    Command::cargo_bin("hexchunk")
        .unwrap()
        .current_dir(td.path())
        .args(["verify", "t.bin_metadata.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("BAD"));

    Command::cargo_bin("hexchunk")
        .unwrap()
        .current_dir(td.path())
        .args(["reassemble", "t.bin_metadata.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Reassembly failed. Checksum mismatch."))
        .stderr(predicate::str::contains("chunk 2"));

    td.child("reassembled_t.bin").assert(predicate::path::exists());
}
