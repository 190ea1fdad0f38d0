use super::*;
use std::fs;
use tempfile::tempdir;

fn global_for(dir: &Path, target: Option<&str>) -> GlobalArgs {
    GlobalArgs {
        verbose: false,
        project_dir: dir.display().to_string(),
        config: None,
        target: target.map(String::from),
    }
}

const CONFIG: &str = r#"
scripts_dir: sql
database:
  path: app_local.duckdb
dialect: mssql
validate_sql: true
targets:
  prod:
    database:
      path: app.duckdb
      catalog: AppProd
"#;

#[test]
fn test_load_context_default_target() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("dbmigrator.yml"), CONFIG).unwrap();

    let ctx = load_context(&global_for(dir.path(), None)).unwrap();
    assert!(ctx.is_developer_database);
    assert_eq!(ctx.database.catalog_name(), "app_local");
    assert_eq!(ctx.scripts_dir(), dir.path().join("sql"));
    assert_eq!(ctx.splitter(true).dialect_name(), Some("mssql"));
    assert_eq!(ctx.splitter(false).dialect_name(), None);
}

#[test]
fn test_load_context_named_target() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("dbmigrator.yml"), CONFIG).unwrap();

    let ctx = load_context(&global_for(dir.path(), Some("prod"))).unwrap();
    assert_eq!(ctx.target.as_deref(), Some("prod"));
    assert!(!ctx.is_developer_database);

    let db = ctx.open_database_for_read().unwrap();
    assert_eq!(dm_db::DatabaseCore::catalog_name(&db), "AppProd");
}

#[test]
fn test_unknown_target_fails() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("dbmigrator.yml"), CONFIG).unwrap();
    assert!(load_context(&global_for(dir.path(), Some("staging"))).is_err());
}

#[test]
fn test_explicit_config_path() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("custom.yml");
    fs::write(&config_path, "developer_database: true\n").unwrap();

    let mut global = global_for(dir.path(), None);
    global.config = Some(config_path.display().to_string());
    let ctx = load_context(&global).unwrap();
    assert!(ctx.is_developer_database);
    assert_eq!(ctx.scripts_dir(), dir.path().join("scripts"));
}

#[test]
fn test_missing_config_fails() {
    let dir = tempdir().unwrap();
    let err = load_context(&global_for(dir.path(), None)).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load configuration"));
}

#[test]
fn test_read_only_open_does_not_create_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("dbmigrator.yml"), CONFIG).unwrap();
    let ctx = load_context(&global_for(dir.path(), None)).unwrap();

    let db = ctx.open_database_for_read().unwrap();
    assert_eq!(dm_db::DatabaseCore::catalog_name(&db), "app_local");
    assert!(!dir.path().join("app_local.duckdb").exists());

    ctx.open_database().unwrap();
    assert!(dir.path().join("app_local.duckdb").exists());
}

#[test]
fn test_exit_code_display_is_silent() {
    assert_eq!(ExitCode(3).to_string(), "");
    let err: anyhow::Error = migration_failed(MigrateError::AmbiguousVersion {
        scripts: vec!["a.sql".to_string(), "b.sql".to_string()],
    });
    assert!(matches!(err.downcast_ref::<ExitCode>(), Some(ExitCode(1))));
}
