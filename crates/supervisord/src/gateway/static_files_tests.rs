use super::*;

#[test]
fn parent_dir_component_is_rejected() {
    assert!(is_traversal("../etc/passwd"));
    assert!(is_traversal("assets/../../secret"));
}

#[test]
fn ordinary_paths_are_not_traversal() {
    assert!(!is_traversal("index.html"));
    assert!(!is_traversal("assets/app.js"));
    assert!(!is_traversal(""));
}

#[test]
fn mime_is_inferred_from_extension() {
    assert_eq!(mime_for(Path::new("index.html")), "text/html; charset=utf-8");
    assert_eq!(mime_for(Path::new("app.js")), "text/javascript; charset=utf-8");
    assert_eq!(mime_for(Path::new("data.bin")), "application/octet-stream");
    assert_eq!(mime_for(Path::new("no_extension")), "application/octet-stream");
}
