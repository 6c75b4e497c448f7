#[test]
fn version_matches_cargo_pkg_version() {
    assert_eq!(stratify::VERSION, env!("CARGO_PKG_VERSION"));
    assert!(!stratify::VERSION.is_empty());
}
