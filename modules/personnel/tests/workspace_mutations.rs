//! Mutation flows: role checks, forced refresh, double-submit guard and
//! the head-of-department follow-up.

mod common;

use chrono::NaiveTime;
use common::*;
use personnel::contract::error::PersonnelError;
use personnel::contract::model::{
    DepartmentPatch, NewMeeting, NewPerson, NewTask, PersonPatch, TaskPriority, TaskStatus,
};

fn new_person(email: &str) -> NewPerson {
    NewPerson {
        first_name: "Ada".into(),
        last_name: "Byron".into(),
        email: email.into(),
        department_id: Some(1),
        ..Default::default()
    }
}

#[tokio::test]
async fn successful_mutation_forces_a_full_refresh() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("hr@corp.io", PASSWORD).await);
    assert_eq!(f.api.total_list_calls(), 5);

    let created = f
        .workspace
        .create_person(&new_person("ada@corp.io"))
        .await
        .unwrap();

    assert_eq!(created.email, "ada@corp.io");
    assert_eq!(f.api.total_list_calls(), 10);
    assert!(f
        .workspace
        .cache()
        .people()
        .items
        .iter()
        .any(|p| p.email == "ada@corp.io"));
}

#[tokio::test]
async fn failed_mutation_does_not_refresh() {
    let api = seeded_api();
    api.fail("create_person");
    let f = fixture(api);
    assert!(f.workspace.login("hr@corp.io", PASSWORD).await);

    let err = f
        .workspace
        .create_person(&new_person("ada@corp.io"))
        .await
        .unwrap_err();

    assert!(matches!(err, PersonnelError::Http { status: 500, .. }));
    assert_eq!(f.api.total_list_calls(), 5);
}

#[tokio::test]
async fn employees_cannot_edit_people() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("emp@corp.io", PASSWORD).await);

    let err = f
        .workspace
        .create_person(&new_person("ada@corp.io"))
        .await
        .unwrap_err();
    assert!(matches!(err, PersonnelError::Forbidden { .. }));
    assert_eq!(f.api.calls("create_person"), 0);

    let err = f.workspace.delete_person(3).await.unwrap_err();
    assert!(matches!(err, PersonnelError::Forbidden { .. }));
}

#[tokio::test]
async fn mutations_require_a_session() {
    let f = fixture(seeded_api());
    let err = f.workspace.delete_department(1).await.unwrap_err();
    assert_eq!(err, PersonnelError::Unauthenticated);
}

#[tokio::test]
async fn blank_required_fields_are_rejected_before_the_call() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("admin@corp.io", PASSWORD).await);

    let err = f
        .workspace
        .create_person(&new_person("  "))
        .await
        .unwrap_err();
    assert!(matches!(err, PersonnelError::Validation { ref field, .. } if field == "email"));
    assert_eq!(f.api.calls("create_person"), 0);
}

#[tokio::test]
async fn blank_department_rename_is_rejected() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("admin@corp.io", PASSWORD).await);

    let err = f
        .workspace
        .update_department(
            1,
            &DepartmentPatch {
                name: Some("   ".into()),
                color: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PersonnelError::Validation { ref field, .. } if field == "name"));
    assert_eq!(f.api.calls("update_department"), 0);
    assert!(f.api.mutations.lock().is_empty());
}

#[tokio::test]
async fn required_text_is_sent_trimmed() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("admin@corp.io", PASSWORD).await);

    let padded = NewPerson {
        first_name: "  Ada ".into(),
        last_name: " Byron".into(),
        email: " ada@corp.io  ".into(),
        department_id: Some(1),
        ..Default::default()
    };
    f.workspace.create_person(&padded).await.unwrap();
    f.workspace
        .update_department(
            1,
            &DepartmentPatch {
                name: Some("  Research ".into()),
                color: None,
            },
        )
        .await
        .unwrap();
    f.workspace
        .create_task(&NewTask {
            title: "  Onboarding  ".into(),
            description: None,
            priority: TaskPriority::Low,
            department_id: Some(1),
            assignee_id: None,
        })
        .await
        .unwrap();

    assert_eq!(
        *f.api.mutations.lock(),
        vec![
            "create_person Ada Byron ada@corp.io".to_string(),
            "update_department 1 Some(\"Research\") None".to_string(),
            "create_task Onboarding".to_string(),
        ]
    );
}

#[tokio::test]
async fn double_submit_is_rejected_while_first_is_outstanding() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("hr@corp.io", PASSWORD).await);
    let release = f.api.gate("create_person");

    let payload = new_person("ada@corp.io");
    let first = f.workspace.create_person(&payload);
    let second = async {
        let result = f.workspace.create_person(&payload).await;
        release.send(()).unwrap();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(PersonnelError::SubmissionInFlight { ref operation }) if operation == "create_person"
    ));
    assert_eq!(f.api.calls("create_person"), 1);

    // Released after settling.
    assert!(f
        .workspace
        .create_person(&new_person("bob@corp.io"))
        .await
        .is_ok());
}

#[tokio::test]
async fn department_color_is_normalized() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("admin@corp.io", PASSWORD).await);

    f.workspace.create_department("Sales", " f0a ").await.unwrap();
    f.workspace.create_department("Legal", "").await.unwrap();
    f.workspace
        .update_department(
            1,
            &DepartmentPatch {
                name: None,
                color: Some("abcdef".into()),
            },
        )
        .await
        .unwrap();

    let log = f.api.mutations.lock().clone();
    assert_eq!(
        log,
        vec![
            "create_department Sales #FF00AA".to_string(),
            "create_department Legal #999999".to_string(),
            "update_department 1 None Some(\"#ABCDEF\")".to_string(),
        ]
    );

    let err = f
        .workspace
        .create_department("Ops", "not-a-color")
        .await
        .unwrap_err();
    assert!(matches!(err, PersonnelError::Validation { ref field, .. } if field == "color"));
}

#[tokio::test]
async fn duplicate_department_name_surfaces_conflict() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("admin@corp.io", PASSWORD).await);

    let err = f
        .workspace
        .create_department("Alpha", "#000")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Department name already exists");
}

#[tokio::test]
async fn reassigning_a_head_clears_their_old_department() {
    let api = seeded_api();
    api.departments.lock()[1].head_of_department = Some(Box::new(person(2, "head@corp.io", Some(1))));
    let f = fixture(api);
    assert!(f.workspace.login("admin@corp.io", PASSWORD).await);

    let patch = PersonPatch {
        department_id: Some(2),
        ..Default::default()
    };
    let moved = f.workspace.reassign_person(2, &patch).await.unwrap();

    assert_eq!(moved.department_id(), Some(2));
    assert_eq!(
        *f.api.mutations.lock(),
        vec!["update_person 2".to_string(), "clear_department_head 1".to_string()]
    );
    let alpha = f
        .workspace
        .cache()
        .departments()
        .items
        .into_iter()
        .find(|d| d.id == 1)
        .unwrap();
    assert!(alpha.head_of_department.is_none());
}

#[tokio::test]
async fn reassigning_within_the_same_department_keeps_the_head() {
    let api = seeded_api();
    api.departments.lock()[1].head_of_department = Some(Box::new(person(2, "head@corp.io", Some(1))));
    let f = fixture(api);
    assert!(f.workspace.login("admin@corp.io", PASSWORD).await);

    let patch = PersonPatch {
        department_id: Some(1),
        title_id: Some(4),
        ..Default::default()
    };
    f.workspace.reassign_person(2, &patch).await.unwrap();
    assert_eq!(*f.api.mutations.lock(), vec!["update_person 2".to_string()]);
}

#[tokio::test]
async fn failed_head_cleanup_does_not_fail_the_save() {
    let api = seeded_api();
    api.departments.lock()[1].head_of_department = Some(Box::new(person(2, "head@corp.io", Some(1))));
    api.fail("clear_department_head");
    let f = fixture(api);
    assert!(f.workspace.login("admin@corp.io", PASSWORD).await);

    let patch = PersonPatch {
        department_id: Some(2),
        ..Default::default()
    };
    assert!(f.workspace.reassign_person(2, &patch).await.is_ok());
    assert_eq!(f.api.calls("clear_department_head"), 1);
    assert_eq!(f.api.total_list_calls(), 10);
}

#[tokio::test]
async fn tasks_only_move_forward_one_step() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("emp@corp.io", PASSWORD).await);

    let err = f
        .workspace
        .advance_task(1, TaskStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        PersonnelError::InvalidTransition {
            from: TaskStatus::Assigned,
            to: TaskStatus::Completed
        }
    );

    let t = f
        .workspace
        .advance_task(1, TaskStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(t.status, TaskStatus::InProgress);

    let err = f
        .workspace
        .advance_task(2, TaskStatus::Closed)
        .await
        .unwrap_err();
    assert!(matches!(err, PersonnelError::InvalidTransition { .. }));

    let err = f
        .workspace
        .advance_task(42, TaskStatus::InProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, PersonnelError::Validation { .. }));
}

#[tokio::test]
async fn closing_needs_a_completed_task_and_the_right_role() {
    let f = fixture(seeded_api());
    assert!(f.workspace.login("hr@corp.io", PASSWORD).await);
    let err = f.workspace.close_task(2).await.unwrap_err();
    assert!(matches!(err, PersonnelError::Forbidden { .. }));
    f.workspace.logout();

    assert!(f.workspace.login("head@corp.io", PASSWORD).await);
    let err = f.workspace.close_task(1).await.unwrap_err();
    assert_eq!(
        err,
        PersonnelError::InvalidTransition {
            from: TaskStatus::Assigned,
            to: TaskStatus::Closed
        }
    );

    let closed = f.workspace.close_task(2).await.unwrap();
    assert_eq!(closed.status, TaskStatus::Closed);
    let cached = f.workspace.cache().tasks();
    assert_eq!(cached.items.iter().find(|t| t.id == 2).unwrap().status, TaskStatus::Closed);
}

#[tokio::test]
async fn task_and_meeting_creation_by_role() {
    let f = fixture(seeded_api());
    let new_task = NewTask {
        title: "Quarterly review".into(),
        description: None,
        priority: TaskPriority::High,
        department_id: Some(1),
        assignee_id: Some(3),
    };
    let new_meeting = NewMeeting {
        title: "Planning".into(),
        description: None,
        department_id: Some(1),
        day: date(2024, 6, 12),
        start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        participant_ids: vec![3],
    };

    assert!(f.workspace.login("emp@corp.io", PASSWORD).await);
    assert!(matches!(
        f.workspace.create_task(&new_task).await,
        Err(PersonnelError::Forbidden { .. })
    ));
    f.workspace.logout();

    assert!(f.workspace.login("head@corp.io", PASSWORD).await);
    f.workspace.create_task(&new_task).await.unwrap();
    f.workspace.create_meeting(&new_meeting).await.unwrap();

    let backwards = NewMeeting {
        end_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        ..new_meeting
    };
    assert!(matches!(
        f.workspace.create_meeting(&backwards).await,
        Err(PersonnelError::Validation { .. })
    ));
    assert_eq!(
        *f.api.mutations.lock(),
        vec![
            "create_task Quarterly review".to_string(),
            "create_meeting Planning".to_string()
        ]
    );
}

#[tokio::test]
async fn search_results_are_redacted_for_the_viewer() {
    let api = seeded_api();
    for p in api.people.lock().iter_mut() {
        p.salary = Some(5000);
    }
    let f = fixture(api);
    assert!(f.workspace.login("emp@corp.io", PASSWORD).await);

    let query = personnel::contract::model::PeopleQuery::default();
    let page = f.workspace.search_people(&query).await.unwrap();

    assert_eq!(page.page_info.total_elements, 4);
    for p in &page.items {
        if p.email == "emp@corp.io" {
            assert_eq!(p.salary, Some(5000));
        } else {
            assert_eq!(p.salary, None);
        }
    }
}
