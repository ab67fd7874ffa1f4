use chrono::Utc;
use cloudshelf_core::{
    Container, FileEntry, FolderEntry, GatewayError, Instance, InstanceAction, InstanceState,
};
use cloudshelf_ops::{
    ActionGate, Dispatch, Followup, GateError, InstanceBoard, InstanceOutcome, LifecycleGuard,
    PendingAction,
};

#[test]
fn test_start_on_stopped_schedules_refetch_without_state_change() {
    let mut board = InstanceBoard::new();
    board.replace(vec![Instance::new("i-1", "batch", InstanceState::Stopped)]);

    assert!(board.can_perform("i-1", InstanceAction::Start));
    board.begin("i-1", InstanceAction::Start).unwrap();
    assert!(board.is_busy("i-1"));

    let outcome = board.finish("i-1", InstanceAction::Start, &Ok(())).unwrap();
    let ticket = match outcome {
        InstanceOutcome::RefetchScheduled(ticket) => ticket,
        other => panic!("expected a scheduled re-fetch, got {other:?}"),
    };

    assert_eq!(ticket.instance_id(), "i-1");
    assert_eq!(board.get("i-1").unwrap().state, InstanceState::Stopped);
    assert!(!board.is_busy("i-1"));
    assert!(board.has_scheduled("i-1"));
}

#[test]
fn test_terminate_removes_immediately() {
    let mut board = InstanceBoard::new();
    board.replace(vec![
        Instance::new("i-1", "batch", InstanceState::Stopped),
        Instance::new("i-2", "web", InstanceState::Running),
    ]);

    board.begin("i-2", InstanceAction::Terminate).unwrap();
    let outcome = board.finish("i-2", InstanceAction::Terminate, &Ok(())).unwrap();

    assert_eq!(outcome, InstanceOutcome::Removed);
    assert!(board.get("i-2").is_none());
    assert!(!board.has_scheduled("i-2"));
    assert_eq!(board.instances().len(), 1);
}

#[test]
fn test_terminate_cancels_pending_refetch() {
    let mut board = InstanceBoard::new();
    board.replace(vec![Instance::new("i-1", "batch", InstanceState::Running)]);

    board.begin("i-1", InstanceAction::Stop).unwrap();
    let ticket = match board.finish("i-1", InstanceAction::Stop, &Ok(())).unwrap() {
        InstanceOutcome::RefetchScheduled(ticket) => ticket,
        other => panic!("unexpected {other:?}"),
    };

    board.begin("i-1", InstanceAction::Terminate).unwrap();
    board.finish("i-1", InstanceAction::Terminate, &Ok(())).unwrap();

    assert!(!board.take_due(&ticket));
}

#[test]
fn test_independent_instances_stay_interactive() {
    let mut board = InstanceBoard::new();
    board.replace(vec![
        Instance::new("i-1", "a", InstanceState::Running),
        Instance::new("i-2", "b", InstanceState::Running),
    ]);

    board.begin("i-1", InstanceAction::Stop).unwrap();
    assert!(board.can_perform("i-2", InstanceAction::Stop));
    board.begin("i-2", InstanceAction::Stop).unwrap();
}

#[test]
fn test_lifecycle_properties() {
    assert!(!LifecycleGuard::permits(InstanceState::Running, InstanceAction::Start));
    assert!(!LifecycleGuard::permits(InstanceState::Stopped, InstanceAction::Stop));
    assert!(!LifecycleGuard::permits(InstanceState::Terminated, InstanceAction::Start));
    assert!(!LifecycleGuard::permits(InstanceState::Terminated, InstanceAction::Stop));
}

#[test]
fn test_only_one_pending_action() {
    let mut gate = ActionGate::new();
    let file = FileEntry::new("readme.txt", 3, Utc::now());
    let folder = FolderEntry::new("2024/");

    gate.request(PendingAction::delete_file("logs", file)).unwrap();
    let id = gate.request(PendingAction::delete_folder("logs", folder)).unwrap();
    assert_eq!(gate.pending_id(), Some(id));
    assert!(matches!(gate.pending(), Some(PendingAction::DeleteFolder { .. })));

    gate.confirm(id).unwrap();
    let bucket = Container::new("logs", "us-east-1", Utc::now());
    assert_eq!(
        gate.request(PendingAction::delete_bucket(bucket)),
        Err(GateError::Busy)
    );
}

#[test]
fn test_folder_not_empty_is_reported() {
    let mut gate = ActionGate::new();
    let id = gate
        .request(PendingAction::delete_folder("logs", FolderEntry::new("2024/")))
        .unwrap();
    assert_eq!(
        gate.confirm(id).unwrap(),
        Dispatch::DeleteFolder {
            container: "logs".into(),
            full_path: "2024/".into()
        }
    );

    let result: Result<(), GatewayError> =
        Err(GatewayError::api(400, "Cannot delete folder: Folder is not empty"));
    assert!(result.as_ref().unwrap_err().is_not_empty());
    let followup = gate.complete(id, &result).unwrap();

    assert_eq!(
        followup,
        Followup::Report("Cannot delete folder: Folder is not empty".into())
    );
    assert!(gate.pending().is_none());
}
