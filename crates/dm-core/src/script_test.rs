use super::*;

#[test]
fn test_marker_on_first_line() {
    assert_eq!(extract_declared_version("--42\nCREATE TABLE t (id INT);"), Some(42));
}

#[test]
fn test_marker_only_content() {
    assert_eq!(extract_declared_version("--7"), Some(7));
}

#[test]
fn test_marker_with_crlf() {
    assert_eq!(extract_declared_version("--3\r\nSELECT 1;"), Some(3));
}

#[test]
fn test_marker_after_bom() {
    assert_eq!(extract_declared_version("\u{feff}--12\nSELECT 1;"), Some(12));
}

#[test]
fn test_no_marker() {
    assert_eq!(extract_declared_version("CREATE TABLE t (id INT);"), None);
    assert_eq!(extract_declared_version(""), None);
}

#[test]
fn test_marker_must_be_first_line() {
    assert_eq!(extract_declared_version("\n--5\nSELECT 1;"), None);
    assert_eq!(extract_declared_version("SELECT 1;\n--5"), None);
}

#[test]
fn test_malformed_markers() {
    for first_line in ["--", "-- 5", "--5a", "--+5", "---5", "--5 ", " --5", "--0", "--1.5"] {
        assert_eq!(
            extract_declared_version(&format!("{first_line}\nSELECT 1;")),
            None,
            "expected no version for {first_line:?}"
        );
    }
}

#[test]
fn test_marker_overflow_is_absent() {
    assert_eq!(extract_declared_version("--99999999999999999999999"), None);
}

#[test]
fn test_raw_script_declared_version() {
    let raw = RawScript::new("001_init.sql", "--1\nCREATE TABLE t (id INT);");
    assert_eq!(raw.declared_version(), Some(1));
}

#[test]
fn test_with_version_marker_lf() {
    let updated = with_version_marker("CREATE TABLE t (id INT);\n", 5);
    assert_eq!(updated, "--5\nCREATE TABLE t (id INT);\n");
    assert_eq!(extract_declared_version(&updated), Some(5));
}

#[test]
fn test_with_version_marker_crlf() {
    let updated = with_version_marker("SELECT 1;\r\nSELECT 2;\r\n", 9);
    assert_eq!(updated, "--9\r\nSELECT 1;\r\nSELECT 2;\r\n");
}

#[test]
fn test_with_version_marker_keeps_bom_first() {
    let updated = with_version_marker("\u{feff}SELECT 1;", 2);
    assert_eq!(updated, "\u{feff}--2\nSELECT 1;");
    assert_eq!(extract_declared_version(&updated), Some(2));
}

#[test]
fn test_version_origin_display() {
    assert_eq!(VersionOrigin::Declared.to_string(), "declared");
    assert_eq!(VersionOrigin::Assigned.to_string(), "assigned");
}
