use super::*;
use supervisor_core::FakeClock;
use tempfile::tempdir;

fn open_store(dir: &Path) -> KnowledgeStore<FakeClock> {
    KnowledgeStore::open(dir, FakeClock::new(0)).unwrap()
}

#[test]
fn create_allocates_sequential_ids_per_type() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let (a, event) = store
        .create(NewEntry {
            entry_type: EntryType::Note,
            body: "first".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(a.id(), "NOTE_1");
    assert_eq!(event, KnowledgeEvent::Created("NOTE_1".to_string()));

    let (b, _) = store
        .create(NewEntry {
            entry_type: EntryType::Note,
            body: "second".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(b.id(), "NOTE_2");

    let (c, _) = store
        .create(NewEntry {
            entry_type: EntryType::Issue,
            body: "unrelated type".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(c.id(), "ISSUE_1");
}

#[test]
fn create_writes_under_the_status_bucket() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    store
        .create(NewEntry {
            entry_type: EntryType::Question,
            status: EntryStatus::Open,
            body: "why".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert!(dir.path().join("open").join("QUESTION_1.md").exists());
}

#[test]
fn get_round_trips_through_the_written_file() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let (created, _) = store
        .create(NewEntry {
            entry_type: EntryType::Note,
            body: "hello world".to_string(),
            tags: vec!["infra".to_string()],
            ..Default::default()
        })
        .unwrap();
    let fetched = store.get(created.id()).unwrap();
    assert_eq!(fetched.body.trim_end(), "hello world");
    assert_eq!(fetched.frontmatter.tags, vec!["infra".to_string()]);
}

#[test]
fn get_missing_entry_errors() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    assert!(matches!(store.get("NOTE_99"), Err(KnowledgeError::NotFound(_))));
}

#[test]
fn update_moves_file_between_status_buckets() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let (created, _) = store
        .create(NewEntry {
            entry_type: EntryType::Issue,
            status: EntryStatus::Open,
            body: "bug".to_string(),
            ..Default::default()
        })
        .unwrap();

    let (updated, event) = store
        .update(
            created.id(),
            EntryPatch {
                status: Some(EntryStatus::Completed),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.frontmatter.status, EntryStatus::Completed);
    assert_eq!(event, KnowledgeEvent::Updated(created.id().to_string()));
    assert!(!dir.path().join("open").join(created.filename()).exists());
    assert!(dir.path().join("completed").join(created.filename()).exists());
}

#[test]
fn accept_moves_to_completed_and_emits_accepted() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let (created, _) = store
        .create(NewEntry {
            entry_type: EntryType::Question,
            body: "?".to_string(),
            ..Default::default()
        })
        .unwrap();
    let (accepted, event) = store.accept(created.id()).unwrap();
    assert_eq!(accepted.frontmatter.status, EntryStatus::Completed);
    assert_eq!(event, KnowledgeEvent::Accepted(created.id().to_string()));
}

#[test]
fn delete_removes_the_file() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let (created, _) = store
        .create(NewEntry {
            entry_type: EntryType::Note,
            body: "gone soon".to_string(),
            ..Default::default()
        })
        .unwrap();
    store.delete(created.id()).unwrap();
    assert!(matches!(store.get(created.id()), Err(KnowledgeError::NotFound(_))));
}

#[test]
fn list_filters_by_type_and_tag() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    store
        .create(NewEntry {
            entry_type: EntryType::Note,
            tags: vec!["a".to_string()],
            body: "n1".to_string(),
            ..Default::default()
        })
        .unwrap();
    store
        .create(NewEntry {
            entry_type: EntryType::Issue,
            tags: vec!["b".to_string()],
            body: "i1".to_string(),
            ..Default::default()
        })
        .unwrap();

    let notes = store
        .list(&ListFilter {
            entry_type: Some(EntryType::Note),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(notes.len(), 1);

    let tagged_b = store
        .list(&ListFilter {
            tag: Some("b".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(tagged_b.len(), 1);
    assert_eq!(tagged_b[0].frontmatter.entry_type, EntryType::Issue);
}

#[test]
fn link_appends_cross_reference_to_body() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let (from, _) = store
        .create(NewEntry {
            entry_type: EntryType::Question,
            body: "what happened?".to_string(),
            ..Default::default()
        })
        .unwrap();
    let (to, _) = store
        .create(NewEntry {
            entry_type: EntryType::Answer,
            body: "this happened".to_string(),
            ..Default::default()
        })
        .unwrap();

    let event = store.link(from.id(), to.id()).unwrap();
    assert_eq!(
        event,
        KnowledgeEvent::Linked {
            from: from.id().to_string(),
            to: to.id().to_string(),
        }
    );
    let updated = store.get(from.id()).unwrap();
    assert!(updated.body.contains(&format!("[[{}]]", to.id())));
}

#[test]
fn counters_recover_from_existing_files_on_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = open_store(dir.path());
        store
            .create(NewEntry {
                entry_type: EntryType::Note,
                body: "one".to_string(),
                ..Default::default()
            })
            .unwrap();
        store
            .create(NewEntry {
                entry_type: EntryType::Note,
                body: "two".to_string(),
                ..Default::default()
            })
            .unwrap();
    }
    let reopened = open_store(dir.path());
    let (next, _) = reopened
        .create(NewEntry {
            entry_type: EntryType::Note,
            body: "three".to_string(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(next.id(), "NOTE_3");
}
