use kanban_core::{
    Direction, NewTicket, Project, ProjectError, Ticket, TicketInput,
};
use uuid::Uuid;

fn pipeline() -> Project {
    Project::new("P1").with_stages(["Todo", "Doing", "Done"])
}

fn stage_sizes(project: &Project) -> Vec<usize> {
    project.stages.iter().map(|stage| stage.tickets.len()).collect()
}

#[test]
fn assign_mints_identity_into_named_stage() {
    let mut project = pipeline();

    let id = project
        .assign_ticket("Todo", NewTicket::titled("T1"))
        .unwrap();

    let ticket = project.find_ticket(id).unwrap();
    assert!(!ticket.id.is_nil());
    assert!(ticket.created_at > 0);
    assert_eq!(ticket.title, "T1");
    assert_eq!(stage_sizes(&project), [1, 0, 0]);
}

#[test]
fn assign_to_unknown_stage_fails_without_side_effects() {
    let mut project = pipeline();
    let before = project.clone();

    let err = project
        .assign_ticket("Review", NewTicket::titled("T1"))
        .unwrap_err();

    assert_eq!(err, ProjectError::StageNotFound("Review".to_string()));
    assert_eq!(project, before);
}

#[test]
fn progress_walks_to_last_stage_then_stops() {
    let mut project = pipeline();
    let id = project
        .assign_ticket("Todo", NewTicket::titled("T1"))
        .unwrap();

    assert!(project.progress_ticket(id));
    assert!(project.progress_ticket(id));
    assert_eq!(project.stage_for_ticket(id).name, "Done");

    let before = project.clone();
    assert!(!project.progress_ticket(id));
    assert_eq!(project, before);
}

#[test]
fn regress_in_first_stage_is_a_no_op() {
    let mut project = pipeline();
    let id = project
        .assign_ticket("Todo", NewTicket::titled("T1"))
        .unwrap();
    let before = project.clone();

    assert!(!project.regress_ticket(id));
    assert_eq!(project, before);
}

#[test]
fn progress_then_regress_restores_stage_and_fields() {
    let mut project = Project::new("P").with_stages(["A", "B", "C", "D"]);
    project.assign_ticket("A", NewTicket::titled("x")).unwrap();
    let id = project
        .assign_ticket(
            "B",
            NewTicket {
                title: "T".to_string(),
                summary: "short".to_string(),
                details: "long".to_string(),
            },
        )
        .unwrap();
    let original = project.find_ticket(id).unwrap().clone();

    project.progress_ticket(id);
    assert_eq!(project.stage_for_ticket(id).name, "C");
    project.regress_ticket(id);

    assert_eq!(project.stage_for_ticket(id).name, "B");
    assert_eq!(project.find_ticket(id), Some(&original));
}

#[test]
fn moved_ticket_lands_at_destination_tail() {
    let mut project = pipeline();
    project
        .assign_ticket("Doing", NewTicket::titled("already there"))
        .unwrap();
    let id = project
        .assign_ticket("Todo", NewTicket::titled("mover"))
        .unwrap();

    project.progress_ticket(id);

    let doing = project.list_tickets("Doing");
    assert_eq!(doing.len(), 2);
    assert_eq!(doing[1].id, id);
}

#[test]
fn finalize_moves_ticket_out_of_pipeline_once() {
    let mut project = pipeline();
    let id = project
        .assign_ticket("Todo", NewTicket::titled("T1"))
        .unwrap();
    project.progress_ticket(id);
    project.progress_ticket(id);
    let snapshot = project.find_ticket(id).unwrap().clone();

    assert!(project.finalize_ticket(id));
    assert!(project.list_tickets("Done").is_empty());
    assert_eq!(project.finalized, vec![snapshot]);

    assert!(!project.finalize_ticket(id));
    assert_eq!(project.finalized.len(), 1);
    assert!(!project.contains_ticket(id));
    assert!(project.is_finalized(id));
}

#[test]
fn update_replaces_content_in_place() {
    let mut project = pipeline();
    let first = project.assign_ticket("Todo", NewTicket::titled("a")).unwrap();
    let second = project.assign_ticket("Todo", NewTicket::titled("b")).unwrap();

    let mut edited = project.find_ticket(first).unwrap().clone();
    edited.title = "a, edited".to_string();
    edited.details = "more".to_string();
    project.update_ticket(&edited).unwrap();

    let todo = project.list_tickets("Todo");
    assert_eq!(todo[0], edited);
    assert_eq!(todo[1].id, second);
}

#[test]
fn update_unknown_ticket_reports_not_found() {
    let mut project = pipeline();
    let stray = Ticket {
        id: Uuid::new_v4(),
        title: "stray".to_string(),
        summary: String::new(),
        details: String::new(),
        created_at: 1,
    };

    let err = project.update_ticket(&stray).unwrap_err();
    assert_eq!(err, ProjectError::TicketNotFound(stray.id));
}

#[test]
fn reassigning_a_held_ticket_is_rejected() {
    let mut project = pipeline();
    let id = project.assign_ticket("Todo", NewTicket::titled("a")).unwrap();
    let held = project.find_ticket(id).unwrap().clone();

    let err = project
        .assign_ticket("Done", TicketInput::Existing(held.clone()))
        .unwrap_err();
    assert_eq!(err, ProjectError::DuplicateTicket(id));

    project.finalize_ticket(id);
    let err = project.assign_ticket("Done", held).unwrap_err();
    assert_eq!(err, ProjectError::DuplicateTicket(id));
}

#[test]
fn existing_ticket_keeps_identity_when_assigned_elsewhere() {
    let mut source = pipeline();
    let id = source.assign_ticket("Todo", NewTicket::titled("a")).unwrap();
    let ticket = source.find_ticket(id).unwrap().clone();

    let mut target = pipeline();
    assert_eq!(target.assign_ticket("Doing", ticket.clone()).unwrap(), id);
    assert_eq!(target.find_ticket(id), Some(&ticket));
}

#[test]
fn existing_ticket_with_nil_id_is_minted() {
    let mut project = pipeline();
    let unidentified = Ticket {
        id: Uuid::nil(),
        title: "draft".to_string(),
        summary: String::new(),
        details: String::new(),
        created_at: 0,
    };

    let id = project.assign_ticket("Todo", unidentified).unwrap();

    assert!(!id.is_nil());
    assert!(project.find_ticket(id).unwrap().created_at > 0);
}

#[test]
fn stage_for_unknown_ticket_is_empty_sentinel() {
    let project = pipeline();
    let stage = project.stage_for_ticket(Uuid::new_v4());
    assert!(stage.name.is_empty());
    assert!(stage.tickets.is_empty());
    assert!(project.list_tickets("nope").is_empty());
}

#[test]
fn move_ticket_reorders_within_stage() {
    let mut project = pipeline();
    let first = project.assign_ticket("Todo", NewTicket::titled("a")).unwrap();
    let second = project.assign_ticket("Todo", NewTicket::titled("b")).unwrap();

    assert!(project.move_ticket(second, Direction::Backward));
    let order: Vec<_> = project.list_tickets("Todo").iter().map(|t| t.id).collect();
    assert_eq!(order, [second, first]);

    assert!(!project.move_ticket(second, Direction::Backward));
    assert!(!project.move_ticket(Uuid::new_v4(), Direction::Forward));
}

#[test]
fn project_serializes_with_stable_field_names() {
    let mut project = pipeline();
    let id = project.assign_ticket("Todo", NewTicket::titled("T1")).unwrap();
    project.finalize_ticket(id);

    let json = serde_json::to_value(&project).unwrap();
    assert_eq!(json["id"], project.id.to_string());
    assert_eq!(json["name"], "P1");
    assert_eq!(json["stages"][0]["name"], "Todo");
    assert_eq!(json["finalized"][0]["title"], "T1");
    assert!(json["finalized"][0]["created_at"].is_i64());

    let decoded: Project = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, project);
}
