use super::*;

#[test]
fn prefix_round_trips() {
    for ty in [
        EntryType::Question,
        EntryType::Answer,
        EntryType::Note,
        EntryType::Issue,
        EntryType::Milestone,
    ] {
        assert_eq!(EntryType::from_prefix(ty.prefix()), Some(ty));
    }
}

#[test]
fn unknown_prefix_is_none() {
    assert_eq!(EntryType::from_prefix("BOGUS"), None);
}

#[test]
fn dir_names_use_kebab_case() {
    assert_eq!(EntryStatus::InProgress.dir_name(), "in-progress");
    assert_eq!(EntryStatus::Open.dir_name(), "open");
}

#[test]
fn filename_appends_md_extension() {
    let entry = Entry {
        frontmatter: Frontmatter {
            id: "NOTE_7".to_string(),
            entry_type: EntryType::Note,
            status: EntryStatus::Open,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            tags: vec![],
            extra: Default::default(),
        },
        body: String::new(),
    };
    assert_eq!(entry.filename(), "NOTE_7.md");
    assert_eq!(entry.id(), "NOTE_7");
}
