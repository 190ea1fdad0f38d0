use super::*;
use dm_core::{LedgerEntry, SqlDialectKind};
use dm_db::{DatabaseCore, DbResult, DuckDbBackend, LedgerStore};
use dm_sql::{SqlDialect, SqlError};
use std::cell::Cell;

/// DuckDB backend that counts executed batches and ledger writes.
struct RecordingDb {
    inner: DuckDbBackend,
    batches: Cell<usize>,
    inserts: Cell<usize>,
    updates: Cell<usize>,
}

impl RecordingDb {
    fn new() -> Self {
        Self {
            inner: DuckDbBackend::in_memory().unwrap(),
            batches: Cell::new(0),
            inserts: Cell::new(0),
            updates: Cell::new(0),
        }
    }

    fn ledger(&self) -> Vec<(String, i64)> {
        self.inner
            .read_ledger()
            .unwrap()
            .into_iter()
            .map(|e| (e.script_name, e.version))
            .collect()
    }

    fn seed_ledger(&self, entries: &[(&str, i64)]) {
        self.inner.ensure_ledger().unwrap();
        for (name, version) in entries {
            self.inner
                .insert_ledger_entry(&LedgerEntry::new(*name, *version))
                .unwrap();
        }
    }
}

impl DatabaseCore for RecordingDb {
    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.batches.set(self.batches.get() + 1);
        self.inner.execute_batch(sql)
    }

    fn begin(&self) -> DbResult<()> {
        self.inner.begin()
    }

    fn commit(&self) -> DbResult<()> {
        self.inner.commit()
    }

    fn rollback(&self) -> DbResult<()> {
        self.inner.rollback()
    }

    fn catalog_name(&self) -> &str {
        self.inner.catalog_name()
    }

    fn db_type(&self) -> &'static str {
        self.inner.db_type()
    }
}

impl LedgerStore for RecordingDb {
    fn ledger_exists(&self) -> DbResult<bool> {
        self.inner.ledger_exists()
    }

    fn ensure_ledger(&self) -> DbResult<()> {
        self.inner.ensure_ledger()
    }

    fn read_ledger(&self) -> DbResult<Vec<LedgerEntry>> {
        self.inner.read_ledger()
    }

    fn insert_ledger_entry(&self, entry: &LedgerEntry) -> DbResult<()> {
        self.inserts.set(self.inserts.get() + 1);
        self.inner.insert_ledger_entry(entry)
    }

    fn update_ledger_entry(&self, entry: &LedgerEntry) -> DbResult<()> {
        self.updates.set(self.updates.get() + 1);
        self.inner.update_ledger_entry(entry)
    }
}

fn catalog(scripts: &[(&str, &str, i64)]) -> ScriptCatalog {
    ScriptCatalog::from_scripts(
        scripts
            .iter()
            .map(|(name, content, version)| Script::declared(*name, *content, *version))
            .collect(),
    )
}

fn run_collecting<D: Database + ?Sized>(
    migrator: &Migrator<'_, D>,
    catalog: &ScriptCatalog,
) -> (MigrateResult<MigrationReport>, Vec<String>) {
    let mut lines = Vec::new();
    let result = migrator.run(catalog, |event| lines.push(event.to_string()));
    (result, lines)
}

fn three_scripts() -> ScriptCatalog {
    catalog(&[
        ("001_users.sql", "--1\nCREATE TABLE users (id INTEGER);", 1),
        (
            "002_orders.sql",
            "--2\nCREATE TABLE orders (id INTEGER);\nGO\nINSERT INTO orders VALUES (1);",
            2,
        ),
        ("003_seed.sql", "--3\nINSERT INTO users VALUES (1), (2);", 3),
    ])
}

#[test]
fn test_fresh_database_applies_all_in_order() {
    let db = RecordingDb::new();
    let migrator = Migrator::new(&db, false);
    let (result, lines) = run_collecting(&migrator, &three_scripts());
    let report = result.unwrap();

    assert_eq!(
        lines,
        vec![
            "001_users.sql executed.",
            "002_orders.sql executed.",
            "003_seed.sql executed."
        ]
    );
    assert_eq!(
        report.executed,
        vec!["001_users.sql", "002_orders.sql", "003_seed.sql"]
    );
    assert_eq!(db.batches.get(), 4);
    assert_eq!(
        db.ledger(),
        vec![
            ("001_users.sql".to_string(), 1),
            ("002_orders.sql".to_string(), 2),
            ("003_seed.sql".to_string(), 3)
        ]
    );
    assert_eq!(db.inner.query_count("SELECT * FROM users").unwrap(), 2);
}

#[test]
fn test_second_run_is_noop() {
    let db = RecordingDb::new();
    let migrator = Migrator::new(&db, false);
    run_collecting(&migrator, &three_scripts()).0.unwrap();
    let batches_after_first = db.batches.get();

    let (result, lines) = run_collecting(&migrator, &three_scripts());
    let report = result.unwrap();
    assert!(lines.is_empty());
    assert!(report.is_noop());
    assert_eq!(report.up_to_date, 3);
    assert_eq!(db.batches.get(), batches_after_first);
    assert_eq!(db.inserts.get(), 3);
    assert_eq!(db.updates.get(), 0);
}

#[test]
fn test_renumbered_script_updates_ledger_only() {
    let db = RecordingDb::new();
    let migrator = Migrator::new(&db, false);
    let before = catalog(&[
        ("a.sql", "--1\nCREATE TABLE a (id INTEGER);", 1),
        ("b.sql", "--5\nCREATE TABLE b (id INTEGER);", 5),
    ]);
    run_collecting(&migrator, &before).0.unwrap();
    let batches_before = db.batches.get();

    let after = catalog(&[
        ("a.sql", "--1\nCREATE TABLE a (id INTEGER);", 1),
        ("b.sql", "--7\nCREATE TABLE b (id INTEGER);", 7),
    ]);
    let (result, lines) = run_collecting(&migrator, &after);
    let report = result.unwrap();

    assert_eq!(lines, vec!["b.sql DB version updated."]);
    assert_eq!(
        report.version_updates,
        vec![VersionChange {
            script: "b.sql".to_string(),
            from: 5,
            to: 7
        }]
    );
    assert!(report.executed.is_empty());
    assert_eq!(db.batches.get(), batches_before);
    assert_eq!(db.updates.get(), 1);
    assert_eq!(
        db.ledger(),
        vec![("a.sql".to_string(), 1), ("b.sql".to_string(), 7)]
    );
}

#[test]
fn test_failed_batch_rolls_back_whole_script() {
    let db = RecordingDb::new();
    let migrator = Migrator::new(&db, false);
    let scripts = catalog(&[
        ("good.sql", "--1\nCREATE TABLE good (id INTEGER);", 1),
        (
            "bad.sql",
            "--2\nCREATE TABLE t1 (id INTEGER);\nGO\nINSERT INTO missing VALUES (1);\nGO\nCREATE TABLE t3 (id INTEGER);",
            2,
        ),
        ("later.sql", "--3\nCREATE TABLE later (id INTEGER);", 3),
    ]);

    let (result, lines) = run_collecting(&migrator, &scripts);
    match result {
        Err(MigrateError::Execution {
            script,
            version,
            batch,
            line,
            ..
        }) => {
            assert_eq!(script, "bad.sql");
            assert_eq!(version, 2);
            assert_eq!(batch, 2);
            assert_eq!(line, 4);
        }
        other => panic!("expected execution error, got {other:?}"),
    }

    // earlier commit stands, the failing script left nothing behind
    assert_eq!(lines, vec!["good.sql executed."]);
    assert_eq!(db.ledger(), vec![("good.sql".to_string(), 1)]);
    assert!(db.inner.relation_exists("good").unwrap());
    assert!(!db.inner.relation_exists("t1").unwrap());
    assert!(!db.inner.relation_exists("t3").unwrap());
    assert!(!db.inner.relation_exists("later").unwrap());
}

#[test]
fn test_rerun_after_fix_resumes() {
    let db = RecordingDb::new();
    let migrator = Migrator::new(&db, false);
    let broken = catalog(&[
        ("a.sql", "--1\nCREATE TABLE a (id INTEGER);", 1),
        ("b.sql", "--2\nINSERT INTO nowhere VALUES (1);", 2),
    ]);
    assert!(run_collecting(&migrator, &broken).0.is_err());

    let fixed = catalog(&[
        ("a.sql", "--1\nCREATE TABLE a (id INTEGER);", 1),
        ("b.sql", "--2\nINSERT INTO a VALUES (1);", 2),
    ]);
    let (result, lines) = run_collecting(&migrator, &fixed);
    result.unwrap();
    assert_eq!(lines, vec!["b.sql executed."]);
    assert_eq!(db.inner.query_count("SELECT * FROM a").unwrap(), 1);
}

#[test]
fn test_out_of_order_rejected_before_any_write() {
    let db = RecordingDb::new();
    db.seed_ledger(&[("a.sql", 1), ("c.sql", 3)]);
    let scripts = catalog(&[
        ("a.sql", "--1\nSELECT 1;", 1),
        ("b.sql", "--2\nCREATE TABLE b (id INTEGER);", 2),
        ("c.sql", "--3\nSELECT 3;", 3),
    ]);

    let (result, lines) = run_collecting(&Migrator::new(&db, false), &scripts);
    match result {
        Err(MigrateError::OutOfOrder {
            script,
            applied_script,
            ..
        }) => {
            assert_eq!(script, "b.sql");
            assert_eq!(applied_script, "c.sql");
        }
        other => panic!("expected out-of-order error, got {other:?}"),
    }
    assert!(lines.is_empty());
    assert_eq!(db.batches.get(), 0);
    assert_eq!(db.inserts.get(), 0);
}

#[test]
fn test_developer_database_fills_gap() {
    let db = RecordingDb::new();
    db.seed_ledger(&[("a.sql", 1), ("c.sql", 3)]);
    let scripts = catalog(&[
        ("a.sql", "--1\nSELECT 1;", 1),
        ("b.sql", "--2\nCREATE TABLE b (id INTEGER);", 2),
        ("c.sql", "--3\nSELECT 3;", 3),
    ]);

    let migrator = Migrator::new(&db, true);
    assert!(migrator.is_developer_database());
    let (result, lines) = run_collecting(&migrator, &scripts);
    result.unwrap();
    assert_eq!(lines, vec!["b.sql executed."]);
    assert!(db.inner.relation_exists("b").unwrap());
}

#[test]
fn test_duplicate_versions_rejected_before_any_write() {
    let db = RecordingDb::new();
    let scripts = catalog(&[
        ("x.sql", "--2\nCREATE TABLE x (id INTEGER);", 2),
        ("y.sql", "--2\nCREATE TABLE y (id INTEGER);", 2),
    ]);

    for developer in [false, true] {
        let (result, lines) = run_collecting(&Migrator::new(&db, developer), &scripts);
        match result {
            Err(MigrateError::DuplicateVersion { version, scripts }) => {
                assert_eq!(version, 2);
                assert_eq!(scripts, vec!["x.sql", "y.sql"]);
            }
            other => panic!("expected duplicate version error, got {other:?}"),
        }
        assert!(lines.is_empty());
    }
    assert_eq!(db.batches.get(), 0);
    assert!(!db.inner.ledger_exists().unwrap());
}

#[test]
fn test_split_error_reports_script_and_location() {
    let db = RecordingDb::new();
    let scripts = catalog(&[("broken.sql", "--1\nSELECT 1;\nGO\nSELECT 'oops;", 1)]);

    let (result, _) = run_collecting(&Migrator::new(&db, false), &scripts);
    match result {
        Err(MigrateError::Split {
            script,
            version,
            source: SqlError::Syntax { line, column, .. },
        }) => {
            assert_eq!(script, "broken.sql");
            assert_eq!(version, 1);
            assert_eq!((line, column), (4, 8));
        }
        other => panic!("expected split error, got {other:?}"),
    }
    assert_eq!(db.batches.get(), 0);
    assert!(db.ledger().is_empty());
}

#[test]
fn test_dialect_validation_runs_before_execution() {
    let db = RecordingDb::new();
    let scripts = catalog(&[("query.sql", "--1\nSELECT id\nFROM a x y;", 1)]);
    let migrator = Migrator::new(&db, false)
        .with_splitter(BatchSplitter::with_dialect(SqlDialect::new(SqlDialectKind::DuckDb)));

    let (result, _) = run_collecting(&migrator, &scripts);
    match result {
        Err(MigrateError::Split {
            source: SqlError::Syntax { line, .. },
            ..
        }) => assert_eq!(line, 3),
        other => panic!("expected split error, got {other:?}"),
    }
    assert_eq!(db.batches.get(), 0);
}

#[test]
fn test_comment_only_script_is_recorded() {
    let db = RecordingDb::new();
    let scripts = catalog(&[("noop.sql", "--1\n-- nothing here yet\n", 1)]);

    let (result, lines) = run_collecting(&Migrator::new(&db, false), &scripts);
    result.unwrap();
    assert_eq!(lines, vec!["noop.sql executed."]);
    assert_eq!(db.batches.get(), 0);
    assert_eq!(db.ledger(), vec![("noop.sql".to_string(), 1)]);
}

#[test]
fn test_empty_catalog_creates_ledger() {
    let db = RecordingDb::new();
    let (result, lines) = run_collecting(&Migrator::new(&db, false), &ScriptCatalog::default());
    assert!(result.unwrap().is_noop());
    assert!(lines.is_empty());
    assert!(db.inner.ledger_exists().unwrap());
}

#[test]
fn test_plan_is_read_only() {
    let db = RecordingDb::new();
    let migrator = Migrator::new(&db, false);
    let steps = migrator.plan(&three_scripts()).unwrap();

    assert_eq!(steps.len(), 3);
    assert!(steps.iter().all(|s| s.action == PlannedAction::Apply));
    assert!(!db.inner.ledger_exists().unwrap());
    assert_eq!(db.batches.get(), 0);
}

#[test]
fn test_plan_after_partial_apply() {
    let db = RecordingDb::new();
    db.seed_ledger(&[("001_users.sql", 1), ("002_orders.sql", 9)]);
    let steps = Migrator::new(&db, false).plan(&three_scripts()).unwrap();

    let actions: Vec<PlannedAction> = steps.iter().map(|s| s.action).collect();
    assert_eq!(
        actions,
        vec![
            PlannedAction::UpToDate,
            PlannedAction::UpdateVersion { from: 9 },
            PlannedAction::Apply
        ]
    );
}

#[test]
fn test_check_splits_pending_scripts_only() {
    let db = RecordingDb::new();
    db.seed_ledger(&[("001_users.sql", 1)]);
    let migrator = Migrator::new(&db, false);
    assert_eq!(migrator.check(&three_scripts()).unwrap(), 2);

    let broken = catalog(&[("bad.sql", "--1\nSELECT (1;", 1)]);
    let fresh = RecordingDb::new();
    assert!(matches!(
        Migrator::new(&fresh, false).check(&broken),
        Err(MigrateError::Split { .. })
    ));
    assert_eq!(db.batches.get(), 0);
    assert_eq!(fresh.batches.get(), 0);
}

#[test]
fn test_event_display() {
    let script = Script::declared("s.sql", "--4\nSELECT 1;", 4);
    assert_eq!(
        MigrationEvent::Executed {
            script: &script,
            batches: 1
        }
        .to_string(),
        "s.sql executed."
    );
    assert_eq!(
        MigrationEvent::VersionUpdated {
            script: &script,
            from: 2
        }
        .to_string(),
        "s.sql DB version updated."
    );
}
