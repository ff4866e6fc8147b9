//! End-to-end runs against real on-disk stores.

use ledgerprobe_core::{
    run_probe, AccessMeasurement, BenchmarkDriver, DriverConfig, FetchPhase, OpenError,
    ProbeError, ProbeSettings, RecordReader, ReportError, ReportSink, StoreConfig, StoreHandle,
};
use ledgerprobe_storage::{BlockDB, ColumnFamily, Database, DatabaseConfig, DurabilityMode};
use ledgerprobe_types::{Block, BlockHeader, Hash, IssuanceTx, TxOut};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const BASE_REWARD: u64 = 17_592_186_044_415;

fn build_block(prev: Hash, height: u64) -> Block {
    let header = BlockHeader::new(prev, 1_397_818_193 + height * 60, height as u32);
    let miner_tx = IssuanceTx::new(
        height + 60,
        vec![TxOut::new(BASE_REWARD + height, [height as u8; 32])],
    );
    let tx_hashes = (0..height)
        .map(|i| Hash::compute_multi(&[&height.to_le_bytes(), &i.to_le_bytes()]))
        .collect();
    Block::new(header, miner_tx, tx_hashes)
}

/// Create a store with `count` blocks; block `h` carries `h` transactions.
fn create_store(dir: &Path, count: u64) -> Vec<Block> {
    let config = DatabaseConfig {
        create_if_missing: true,
        durability: DurabilityMode::Durable,
        ..DatabaseConfig::default()
    };
    let db = Arc::new(Database::open(dir, &config).unwrap());
    let block_db = BlockDB::initialize(db.clone()).unwrap();

    let mut blocks = Vec::new();
    let mut prev = Hash::ZERO;
    for height in 0..count {
        let block = build_block(prev, height);
        prev = block.hash();
        block_db.append_block(&block, 1_000 + u128::from(height)).unwrap();
        blocks.push(block);
    }
    db.sync().unwrap();
    blocks
}

/// Reopen the fixture for writing and run `f` against it.
fn tamper(dir: &Path, f: impl FnOnce(&BlockDB)) {
    let db = Arc::new(Database::open(dir, &DatabaseConfig::default()).unwrap());
    let block_db = BlockDB::open(db.clone()).unwrap();
    f(&block_db);
    db.sync().unwrap();
}

fn settings(store: &TempDir, out: &TempDir, start_height: u64) -> ProbeSettings {
    ProbeSettings {
        start_height,
        ..ProbeSettings::new(store.path(), out.path().join("block_access_time.csv"))
    }
}

fn read_report(path: &Path) -> (String, Vec<Vec<String>>) {
    let text = std::fs::read_to_string(path).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap().to_string();
    let rows = lines
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect();
    (header, rows)
}

fn heights(rows: &[Vec<String>]) -> Vec<u64> {
    rows.iter().map(|row| row[0].parse().unwrap()).collect()
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[test]
fn test_three_blocks_from_genesis() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let blocks = create_store(store.path(), 3);

    let settings = settings(&store, &out, 0);
    let summary = run_probe(&settings).unwrap();

    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.skipped_count, 0);
    assert!(summary.skipped.is_empty());

    let (header, rows) = read_report(&settings.output);
    assert_eq!(header, "Height,Timestamp,Access_time,Size,Hash,No_tx,Reward,Difficulty");
    assert_eq!(heights(&rows), vec![0, 1, 2]);

    for (row, block) in rows.iter().zip(&blocks) {
        let height: u64 = row[0].parse().unwrap();
        assert_eq!(row.len(), 8);
        assert_eq!(row[4], block.hash().to_hex());
        assert_eq!(row[5], height.to_string());
        assert_eq!(row[7], (1_000 + height).to_string());
        assert_eq!(row[3], borsh::to_vec(block).unwrap().len().to_string());
        assert!(row[2].parse::<u128>().is_ok());
    }
    assert_eq!(rows[0][1], "2014-04-18 10:49:53");
    assert_eq!(rows[0][6], "17.592186044415");
    assert_eq!(rows[2][6], "17.592186044417");
}

#[test]
fn test_start_height_beyond_store_is_fatal() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 3);

    let settings = settings(&store, &out, 5);
    let err = run_probe(&settings).unwrap_err();

    assert!(matches!(err, ProbeError::StartHeightOutOfRange { start: 5, current: 3 }));
    assert!(!settings.output.exists());
}

#[test]
fn test_start_height_equal_to_store_height_writes_header_only() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 3);

    let settings = settings(&store, &out, 3);
    let summary = run_probe(&settings).unwrap();

    assert_eq!(summary.rows_written, 0);
    let (_, rows) = read_report(&settings.output);
    assert!(rows.is_empty());
}

#[test]
fn test_start_height_midway() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 5);

    let settings = settings(&store, &out, 2);
    let summary = run_probe(&settings).unwrap();

    assert_eq!(summary.heights_visited(), 3);
    let (_, rows) = read_report(&settings.output);
    assert_eq!(heights(&rows), vec![2, 3, 4]);
}

#[test]
fn test_corrupt_body_is_skipped_and_logged() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let blocks = create_store(store.path(), 3);
    tamper(store.path(), |block_db| {
        block_db
            .database()
            .put(ColumnFamily::Blocks, blocks[1].hash().as_bytes(), b"\xffcorrupt")
            .unwrap();
    });

    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .with_ansi(false)
        .finish();

    let settings = settings(&store, &out, 0);
    let summary = tracing::subscriber::with_default(subscriber, || run_probe(&settings)).unwrap();

    let (_, rows) = read_report(&settings.output);
    assert_eq!(heights(&rows), vec![0, 2]);

    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.skipped_count, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].height, 1);
    assert_eq!(summary.skipped[0].phase, FetchPhase::LoadBody);

    let logs = logs.contents();
    assert!(logs.contains("skipping block"));
    assert!(logs.contains("height=1"));
}

#[test]
fn test_unresolvable_height_produces_no_row() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 3);
    tamper(store.path(), |block_db| {
        block_db
            .database()
            .delete(ColumnFamily::BlockIndex, &1u64.to_be_bytes())
            .unwrap();
    });

    let settings = settings(&store, &out, 0);
    let summary = run_probe(&settings).unwrap();

    let (_, rows) = read_report(&settings.output);
    assert_eq!(heights(&rows), vec![0, 2]);
    assert_eq!(summary.skipped[0].height, 1);
    assert_eq!(summary.skipped[0].phase, FetchPhase::ResolveHash);
}

#[test]
fn test_missing_side_index_skips_height() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 3);
    tamper(store.path(), |block_db| {
        block_db
            .database()
            .delete(ColumnFamily::Difficulties, &2u64.to_be_bytes())
            .unwrap();
    });

    let settings = settings(&store, &out, 0);
    let summary = run_probe(&settings).unwrap();

    let (_, rows) = read_report(&settings.output);
    assert_eq!(heights(&rows), vec![0, 1]);
    assert_eq!(summary.skipped[0].phase, FetchPhase::SideIndex);
}

#[test]
fn test_repeated_runs_agree_except_timing() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 4);

    let settings = settings(&store, &out, 0);
    run_probe(&settings).unwrap();
    let (_, first) = read_report(&settings.output);
    run_probe(&settings).unwrap();
    let (_, second) = read_report(&settings.output);

    let strip_timing = |rows: Vec<Vec<String>>| -> Vec<Vec<String>> {
        rows.into_iter()
            .map(|mut row| {
                row.remove(2);
                row
            })
            .collect()
    };
    assert_eq!(strip_timing(first), strip_timing(second));
}

#[test]
fn test_empty_store_dir_is_fatal_without_report() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let settings = settings(&store, &out, 0);
    let err = run_probe(&settings).unwrap_err();

    assert!(matches!(err, ProbeError::Open(OpenError::NotFound(_))));
    assert!(!settings.output.exists());
}

#[test]
fn test_unwritable_report_is_fatal() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 1);

    let settings = ProbeSettings::new(store.path(), out.path().join("missing-dir").join("out.csv"));
    let err = run_probe(&settings).unwrap_err();
    assert!(matches!(err, ProbeError::SinkOpen { .. }));

    // The store was released on the error path.
    StoreHandle::open(store.path(), StoreConfig::default()).unwrap();
}

#[test]
fn test_read_only_store() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 2);

    let mut settings = settings(&store, &out, 0);
    settings.store.read_only = true;
    let summary = run_probe(&settings).unwrap();
    assert_eq!(summary.rows_written, 2);
}

#[test]
fn test_zero_progress_interval_rejected() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 1);

    let mut settings = settings(&store, &out, 0);
    settings.progress_interval = 0;
    assert!(matches!(run_probe(&settings), Err(ProbeError::InvalidProgressInterval)));
    assert!(!settings.output.exists());
}

#[derive(Default)]
struct RecordingSink {
    header: Vec<String>,
    rows: Vec<AccessMeasurement>,
    fail_after: Option<usize>,
    finished: bool,
}

impl ReportSink for RecordingSink {
    fn write_header(&mut self, columns: &[&str]) -> Result<(), ReportError> {
        self.header = columns.iter().map(|c| c.to_string()).collect();
        Ok(())
    }

    fn write_row(&mut self, row: &AccessMeasurement) -> Result<(), ReportError> {
        if self.fail_after == Some(self.rows.len()) {
            return Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.rows.push(row.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        self.finished = true;
        Ok(())
    }
}

#[test]
fn test_loop_bound_is_the_snapshot() {
    let store = TempDir::new().unwrap();
    create_store(store.path(), 3);

    let handle = StoreHandle::open(store.path(), StoreConfig::default()).unwrap();
    let driver = BenchmarkDriver::new(handle.ledger().unwrap(), DriverConfig::default()).unwrap();

    let mut sink = RecordingSink::default();
    let summary = driver.run(2, &mut sink).unwrap();

    assert_eq!(sink.header.len(), 8);
    assert_eq!(sink.rows.iter().map(|r| r.height).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(summary.end_height, 2);
}

#[test]
fn test_sink_failure_aborts_loop() {
    let store = TempDir::new().unwrap();
    create_store(store.path(), 3);

    let handle = StoreHandle::open(store.path(), StoreConfig::default()).unwrap();
    let driver = BenchmarkDriver::new(handle.ledger().unwrap(), DriverConfig::default()).unwrap();

    let mut sink = RecordingSink {
        fail_after: Some(1),
        ..RecordingSink::default()
    };
    let err = driver.run(3, &mut sink).unwrap_err();

    assert!(matches!(err, ProbeError::SinkWrite(_)));
    assert_eq!(sink.rows.len(), 1);
}

#[test]
fn test_measure_single_height() {
    let store = TempDir::new().unwrap();
    let blocks = create_store(store.path(), 2);

    let handle = StoreHandle::open(store.path(), StoreConfig::default()).unwrap();
    let driver = BenchmarkDriver::new(handle.ledger().unwrap(), DriverConfig::default()).unwrap();

    let row = driver.measure(1).unwrap();
    assert_eq!(row.height, 1);
    assert_eq!(row.hash, blocks[1].hash());
    assert_eq!(row.tx_count, 1);
    assert_eq!(row.reward, u128::from(BASE_REWARD + 1));
    assert_eq!(row.difficulty, 1_001);

    let err = driver.measure(2).unwrap_err();
    assert_eq!(err.height, 2);
    assert_eq!(err.phase, FetchPhase::ResolveHash);
}

#[test]
fn test_store_path_must_be_a_directory() {
    let out = TempDir::new().unwrap();
    let file = out.path().join("not-a-store");
    std::fs::write(&file, b"plain file").unwrap();

    let settings = ProbeSettings::new(&file, out.path().join("report.csv"));
    let err = run_probe(&settings).unwrap_err();
    assert!(matches!(err, ProbeError::InvalidStorePath(_)));

    let settings = ProbeSettings::new(out.path().join("absent"), out.path().join("report.csv"));
    assert!(matches!(run_probe(&settings), Err(ProbeError::InvalidStorePath(_))));
    assert!(!out.path().join("report.csv").exists());
}

#[test]
fn test_ledger_lookups() {
    let store = TempDir::new().unwrap();
    let blocks = create_store(store.path(), 3);
    tamper(store.path(), |block_db| {
        block_db
            .database()
            .put(ColumnFamily::Blocks, blocks[2].hash().as_bytes(), b"\x01garbage")
            .unwrap();
    });

    let handle = StoreHandle::open(store.path(), StoreConfig::default()).unwrap();
    let ledger = handle.ledger().unwrap();

    assert_eq!(ledger.get_block_by_height(1), Some(blocks[1].clone()));
    assert_eq!(ledger.get_block_by_height(2), None);
    assert_eq!(ledger.get_block_by_height(3), None);

    let tx = blocks[2].tx_hashes[1];
    assert_eq!(ledger.get_tx_height(&tx).unwrap(), Some(2));
    assert_eq!(ledger.get_tx_height(&Hash::compute(b"unknown")).unwrap(), None);

    let reader = RecordReader::new(ledger);
    assert_eq!(reader.fetch_by_height(0).unwrap(), blocks[0]);
    assert_eq!(reader.fetch_by_height(2).unwrap_err().phase, FetchPhase::LoadBody);
    assert_eq!(reader.fetch_by_height(9).unwrap_err().phase, FetchPhase::ResolveHash);
}

#[test]
fn test_store_held_by_live_writer_is_measured() {
    let store = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    create_store(store.path(), 3);

    let writer = Arc::new(Database::open(store.path(), &DatabaseConfig::default()).unwrap());
    let writer_blocks = BlockDB::open(writer.clone()).unwrap();

    let settings = settings(&store, &out, 0);
    let summary = run_probe(&settings).unwrap();

    assert_eq!(summary.rows_written, 3);
    let (_, rows) = read_report(&settings.output);
    assert_eq!(heights(&rows), vec![0, 1, 2]);

    // The writer keeps working after the run released its view.
    let tip = writer_blocks.get_block_by_height(2).unwrap();
    writer_blocks.append_block(&build_block(tip.hash(), 3), 1_003).unwrap();
    assert_eq!(writer_blocks.height().unwrap(), 4);
}
