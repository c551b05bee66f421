use super::*;
use std::collections::HashMap;
use supervisor_core::SpawnRequest;

fn request(title: &str) -> SpawnRequest {
    SpawnRequest {
        command: vec!["echo".to_string()],
        title: title.to_string(),
        name: Some(title.to_string()),
        env: HashMap::new(),
        args: vec![],
        cwd: None,
    }
}

fn record(id: &str, title: &str, start: u64) -> ProcessRecord {
    ProcessRecord::new(ProcessId::new(id), &request(title), start, 10)
}

#[test]
fn add_rejects_duplicate_ids() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 0)).unwrap();
    assert!(matches!(
        registry.add(record("p1", "b", 0)),
        Err(RegistryError::AlreadyExists(_))
    ));
}

#[test]
fn get_returns_defensive_copy() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 0)).unwrap();
    let mut copy = registry.get(&ProcessId::new("p1")).unwrap();
    copy.title = "mutated".to_string();
    assert_eq!(registry.get(&ProcessId::new("p1")).unwrap().title, "a");
}

#[test]
fn update_merges_only_provided_fields() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 0)).unwrap();
    let updated = registry
        .update(
            &ProcessId::new("p1"),
            ProcessPatch {
                status: Some(Status::Running),
                pid: Some(123),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.status, Status::Running);
    assert_eq!(updated.pid, Some(123));
    assert_eq!(updated.title, "a");
}

#[test]
fn update_on_missing_id_errors() {
    let registry = ProcessRegistry::new();
    assert!(matches!(
        registry.update(&ProcessId::new("nope"), ProcessPatch::default()),
        Err(RegistryError::NotFound(_))
    ));
}

#[test]
fn push_log_appends_to_the_right_record() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 0)).unwrap();
    registry
        .push_log(&ProcessId::new("p1"), LogKind::Stdout, "hi".to_string(), 5)
        .unwrap();
    let record = registry.get(&ProcessId::new("p1")).unwrap();
    assert_eq!(record.logs.len(), 1);
}

#[test]
fn list_filters_by_status() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 0)).unwrap();
    registry.add(record("p2", "b", 1)).unwrap();
    registry
        .update(&ProcessId::new("p2"), ProcessPatch { status: Some(Status::Running), ..Default::default() })
        .unwrap();

    let filter = ListFilter {
        status: Some(Status::Running),
        name_contains: None,
    };
    let (page, total) = registry.list(&filter, (SortField::StartTime, SortOrder::Asc), Page::default());
    assert_eq!(total, 1);
    assert_eq!(page[0].id, ProcessId::new("p2"));
}

#[test]
fn list_sorts_by_start_time_descending() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 10)).unwrap();
    registry.add(record("p2", "b", 20)).unwrap();
    registry.add(record("p3", "c", 5)).unwrap();

    let (page, _) = registry.list(&ListFilter::default(), (SortField::StartTime, SortOrder::Desc), Page::default());
    let ids: Vec<String> = page.iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, vec!["p2", "p1", "p3"]);
}

#[test]
fn list_pagination_offset_beyond_total_returns_empty_with_correct_total() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 0)).unwrap();
    let page = Page { offset: 50, limit: 10 };
    let (results, total) = registry.list(&ListFilter::default(), (SortField::StartTime, SortOrder::Asc), page);
    assert!(results.is_empty());
    assert_eq!(total, 1);
}

#[test]
fn list_limit_is_clamped_to_max_page_limit() {
    let registry = ProcessRegistry::new();
    for i in 0..5 {
        registry.add(record(&format!("p{i}"), "x", i as u64)).unwrap();
    }
    let page = Page { offset: 0, limit: 1_000_000 };
    let (results, _) = registry.list(&ListFilter::default(), (SortField::StartTime, SortOrder::Asc), page);
    assert_eq!(results.len(), 5);
}

#[test]
fn stats_counts_stopped_separately_from_failed() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 0)).unwrap();
    registry.add(record("p2", "b", 0)).unwrap();
    registry
        .update(&ProcessId::new("p1"), ProcessPatch { status: Some(Status::Stopped), end_time: Some(100), ..Default::default() })
        .unwrap();
    registry
        .update(&ProcessId::new("p2"), ProcessPatch { status: Some(Status::Failed), end_time: Some(200), ..Default::default() })
        .unwrap();

    let stats = registry.stats();
    assert_eq!(stats.stopped, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.total, 2);
}

#[test]
fn stats_average_runtime_only_over_records_with_both_times() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 0)).unwrap();
    registry.add(record("p2", "b", 0)).unwrap();
    registry
        .update(&ProcessId::new("p1"), ProcessPatch { end_time: Some(100), ..Default::default() })
        .unwrap();

    let stats = registry.stats();
    assert_eq!(stats.average_runtime_ms, Some(100.0));
}

#[test]
fn remove_deletes_and_returns_the_record() {
    let registry = ProcessRegistry::new();
    registry.add(record("p1", "a", 0)).unwrap();
    let removed = registry.remove(&ProcessId::new("p1"));
    assert!(removed.is_some());
    assert!(registry.get(&ProcessId::new("p1")).is_none());
}
