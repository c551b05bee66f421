use super::*;
use crate::log::LogKind;
use crate::process::SpawnRequest;
use std::collections::HashMap;

fn record() -> ProcessRecord {
    let request = SpawnRequest {
        command: vec!["echo".to_string(), "hi".to_string()],
        title: "hello".to_string(),
        name: None,
        env: HashMap::new(),
        args: vec![],
        cwd: None,
    };
    ProcessRecord::new(ProcessId::new("p1"), &request, 0, 10)
}

#[test]
fn topic_matches_variant() {
    let event = BusEvent::ProcessStarted {
        id: ProcessId::new("p1"),
        record: record(),
    };
    assert_eq!(event.topic(), Topic::ProcessStarted);
    assert_eq!(event.topic().as_str(), "process.started");
}

#[test]
fn process_id_extracted_from_every_variant() {
    let id = ProcessId::new("p1");
    let events = vec![
        BusEvent::ProcessStarted {
            id: id.clone(),
            record: record(),
        },
        BusEvent::ProcessStateChanged {
            id: id.clone(),
            from: Status::Starting,
            to: Status::Running,
        },
        BusEvent::ProcessStopped {
            id: id.clone(),
            record: record(),
        },
        BusEvent::ProcessFailed {
            id: id.clone(),
            record: record(),
            reason: "exit 1".to_string(),
        },
        BusEvent::ProcessLog {
            id: id.clone(),
            entry: LogEntry {
                timestamp: 0,
                kind: LogKind::Stdout,
                content: "hi".to_string(),
            },
        },
    ];
    for event in events {
        assert_eq!(event.process_id(), &id);
    }
}

#[test]
fn state_changed_serializes_with_tagged_type() {
    let event = BusEvent::ProcessStateChanged {
        id: ProcessId::new("p1"),
        from: Status::Starting,
        to: Status::Running,
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "process.stateChanged");
    assert_eq!(value["from"], "starting");
    assert_eq!(value["to"], "running");
}

#[test]
fn log_event_round_trips_through_json() {
    let event = BusEvent::ProcessLog {
        id: ProcessId::new("p1"),
        entry: LogEntry {
            timestamp: 42,
            kind: LogKind::Stderr,
            content: "boom".to_string(),
        },
    };
    let json = serde_json::to_string(&event).unwrap();
    let parsed: BusEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.process_id(), event.process_id());
    assert_eq!(parsed.topic(), Topic::ProcessLog);
}
