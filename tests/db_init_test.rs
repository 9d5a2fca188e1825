use lorebook::db;

#[test]
fn open_database_creates_parent_dirs_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("data.sqlite");

    let conn = db::open_database(&db_path).unwrap();
    assert!(db_path.exists());

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(journal_mode.to_lowercase(), "wal");

    let version = db::migrations::get_schema_version(&conn).unwrap();
    assert_eq!(version, db::migrations::CURRENT_SCHEMA_VERSION);
}

#[test]
fn reopening_an_existing_database_preserves_data() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data.sqlite");

    {
        let conn = db::open_database(&db_path).unwrap();
        lorebook::store::stats::add_xp(&conn, "dev-1", 25).unwrap();
    }

    let conn = db::open_database(&db_path).unwrap();
    let stats = lorebook::store::stats::get_stats(&conn, "dev-1").unwrap();
    assert_eq!(stats.xp, 25);
}
