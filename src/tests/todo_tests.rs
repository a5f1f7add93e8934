use crate::core::errors::TodoError;
use crate::core::models::todo::TodoStatus;
use crate::core::services::MAX_TITLE_LENGTH;
use crate::infrastructure::notifier::TodoEventKind;
use crate::infrastructure::storage::Storage;
use crate::tests::create_test_context;
use uuid::Uuid;

#[tokio::test]
async fn test_create_todo_requires_admin() {
    let ctx = create_test_context();
    let admin = ctx.admin().await;
    let user = ctx.sign_in("user@example.com").await;

    let result = ctx.service.create_todo(None, Some("Anonymous"), None).await;
    assert!(matches!(result, Err(TodoError::Unauthenticated)));

    let user_id = user.id.to_string();
    let result = ctx.service.create_todo(Some(&user_id), Some("Not allowed"), None).await;
    assert!(matches!(result, Err(TodoError::Forbidden)));

    let stranger = Uuid::new_v4().to_string();
    let result = ctx.service.create_todo(Some(&stranger), Some("Who?"), None).await;
    assert!(matches!(result, Err(TodoError::InvalidUser(_))));

    let result = ctx.service.create_todo(Some("not-a-uuid"), Some("Who?"), None).await;
    assert!(matches!(result, Err(TodoError::InvalidUser(_))));

    let admin_id = admin.id.to_string();
    let todo = ctx
        .service
        .create_todo(Some(&admin_id), Some("  Write docs  "), None)
        .await
        .unwrap();
    assert_eq!(todo.title, "Write docs");
    assert_eq!(todo.status, TodoStatus::Incomplete);
    assert_eq!(todo.completion_count, 0);
    assert!(todo.user_id.is_none());
}

#[tokio::test]
async fn test_create_todo_validates_title() {
    let ctx = create_test_context();
    let admin_id = ctx.admin().await.id.to_string();

    let result = ctx.service.create_todo(Some(&admin_id), None, None).await;
    assert!(matches!(result, Err(TodoError::MissingTitle)));

    let result = ctx.service.create_todo(Some(&admin_id), Some("   "), None).await;
    assert!(matches!(result, Err(TodoError::MissingTitle)));

    let long = "x".repeat(MAX_TITLE_LENGTH + 1);
    let result = ctx.service.create_todo(Some(&admin_id), Some(&long), None).await;
    assert!(matches!(result, Err(TodoError::InvalidInput(field, _)) if field == "title"));

    let result = ctx.service.create_todo(Some(&admin_id), Some("Ok"), Some("done")).await;
    assert!(matches!(result, Err(TodoError::InvalidStatus(_))));
}

#[tokio::test]
async fn test_create_complete_records_admin_completion() {
    let ctx = create_test_context();
    let admin = ctx.admin().await;
    let admin_id = admin.id.to_string();

    let todo = ctx
        .service
        .create_todo(Some(&admin_id), Some("Already done"), Some("complete"))
        .await
        .unwrap();
    assert_eq!(todo.status, TodoStatus::Complete);
    assert_eq!(todo.completion_count, 1);
    assert_eq!(todo.completed_by[0].email, admin.email);
}

#[tokio::test]
async fn test_completing_twice_keeps_count() {
    let ctx = create_test_context();
    let admin_id = ctx.admin().await.id.to_string();
    let user_id = ctx.sign_in("user@example.com").await.id.to_string();
    let todo = ctx.service.create_todo(Some(&admin_id), Some("Task"), None).await.unwrap();
    let todo_id = todo.id.to_string();

    let first = ctx
        .service
        .set_completion(Some(&user_id), &todo_id, Some("complete"), false)
        .await
        .unwrap();
    let second = ctx
        .service
        .set_completion(Some(&user_id), &todo_id, Some("complete"), false)
        .await
        .unwrap();

    assert_eq!(first.completion_count, 1);
    assert_eq!(second.completion_count, 1);
    assert_eq!(second.status, TodoStatus::Complete);
    assert_eq!(ctx.storage.completion_rows().await, 1);
}

#[tokio::test]
async fn test_uncompleting_never_completed_is_noop() {
    let ctx = create_test_context();
    let admin_id = ctx.admin().await.id.to_string();
    let alice_id = ctx.sign_in("alice@example.com").await.id.to_string();
    let bob_id = ctx.sign_in("bob@example.com").await.id.to_string();
    let todo = ctx.service.create_todo(Some(&admin_id), Some("Task"), None).await.unwrap();
    let todo_id = todo.id.to_string();

    ctx.service
        .set_completion(Some(&alice_id), &todo_id, Some("complete"), false)
        .await
        .unwrap();
    let view = ctx
        .service
        .set_completion(Some(&bob_id), &todo_id, Some("incomplete"), false)
        .await
        .unwrap();

    assert_eq!(view.status, TodoStatus::Incomplete);
    assert_eq!(view.completion_count, 1);
    assert_eq!(ctx.storage.completion_rows().await, 1);
}

#[tokio::test]
async fn test_status_is_relative_to_caller() {
    let ctx = create_test_context();
    let admin_id = ctx.admin().await.id.to_string();
    let alice = ctx.sign_in("alice@example.com").await;
    let bob_id = ctx.sign_in("bob@example.com").await.id.to_string();
    let alice_id = alice.id.to_string();
    let todo = ctx.service.create_todo(Some(&admin_id), Some("Shared"), None).await.unwrap();
    let todo_id = todo.id.to_string();

    ctx.service
        .set_completion(Some(&alice_id), &todo_id, Some("complete"), false)
        .await
        .unwrap();

    let for_alice = ctx.service.get_todo(Some(&alice_id), &todo_id).await.unwrap();
    let for_bob = ctx.service.get_todo(Some(&bob_id), &todo_id).await.unwrap();
    let anonymous = ctx.service.list_todos(None).await.unwrap();
    let stale_header = ctx
        .service
        .list_todos(Some(&Uuid::new_v4().to_string()))
        .await
        .unwrap();

    assert_eq!(for_alice.status, TodoStatus::Complete);
    assert_eq!(for_bob.status, TodoStatus::Incomplete);
    assert_eq!(for_bob.completion_count, 1);
    assert_eq!(for_bob.completed_by[0].id, alice.id);
    assert_eq!(anonymous[0].status, TodoStatus::Incomplete);
    assert_eq!(stale_header[0].status, TodoStatus::Incomplete);

    let uncompleted = ctx
        .service
        .set_completion(Some(&alice_id), &todo_id, Some("incomplete"), false)
        .await
        .unwrap();
    assert_eq!(uncompleted.status, TodoStatus::Incomplete);
    assert_eq!(uncompleted.completion_count, 0);
}

#[tokio::test]
async fn test_set_completion_rejects_bad_requests() {
    let ctx = create_test_context();
    let admin_id = ctx.admin().await.id.to_string();
    let user_id = ctx.sign_in("user@example.com").await.id.to_string();
    let todo = ctx.service.create_todo(Some(&admin_id), Some("Task"), None).await.unwrap();
    let todo_id = todo.id.to_string();

    let result = ctx.service.set_completion(None, &todo_id, Some("complete"), false).await;
    assert!(matches!(result, Err(TodoError::Unauthenticated)));

    let result = ctx.service.set_completion(Some(&user_id), &todo_id, None, false).await;
    assert!(matches!(result, Err(TodoError::MissingStatus)));

    let result = ctx
        .service
        .set_completion(Some(&user_id), &todo_id, Some("finished"), false)
        .await;
    assert!(matches!(result, Err(TodoError::InvalidStatus(_))));

    let missing = Uuid::new_v4().to_string();
    let result = ctx
        .service
        .set_completion(Some(&user_id), &missing, Some("complete"), false)
        .await;
    assert!(matches!(result, Err(TodoError::TodoNotFound(_))));

    let result = ctx
        .service
        .set_completion(Some(&user_id), "garbage", Some("complete"), false)
        .await;
    assert!(matches!(result, Err(TodoError::TodoNotFound(_))));
}

#[tokio::test]
async fn test_exclusive_completion_clears_other_completions() {
    let ctx = create_test_context();
    let admin_id = ctx.admin().await.id.to_string();
    let user = ctx.sign_in("user@example.com").await;
    let other_id = ctx.sign_in("other@example.com").await.id.to_string();
    let user_id = user.id.to_string();

    let mut ids = Vec::new();
    for title in ["First", "Second", "Third"] {
        let todo = ctx.service.create_todo(Some(&admin_id), Some(title), None).await.unwrap();
        ids.push(todo.id.to_string());
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    for id in &ids[..2] {
        ctx.service
            .set_completion(Some(&user_id), id, Some("complete"), false)
            .await
            .unwrap();
    }
    ctx.service
        .set_completion(Some(&other_id), &ids[0], Some("complete"), false)
        .await
        .unwrap();

    let view = ctx
        .service
        .set_completion(Some(&user_id), &ids[2], Some("complete"), true)
        .await
        .unwrap();
    assert_eq!(view.status, TodoStatus::Complete);

    assert_eq!(ctx.storage.count_user_completions(user.id).await.unwrap(), 1);
    let todos = ctx.service.list_todos(Some(&user_id)).await.unwrap();
    let statuses: Vec<TodoStatus> = todos.iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![TodoStatus::Incomplete, TodoStatus::Incomplete, TodoStatus::Complete]
    );
    // other users keep their completions
    assert_eq!(todos[0].completion_count, 1);

    // re-running on the same todo changes nothing
    let again = ctx
        .service
        .set_completion(Some(&user_id), &ids[2], Some("complete"), true)
        .await
        .unwrap();
    assert_eq!(again.completion_count, 1);
}

#[tokio::test]
async fn test_update_todo() {
    let ctx = create_test_context();
    let admin = ctx.admin().await;
    let admin_id = admin.id.to_string();
    let user_id = ctx.sign_in("user@example.com").await.id.to_string();
    let todo = ctx.service.create_todo(Some(&admin_id), Some("Draft"), None).await.unwrap();
    let todo_id = todo.id.to_string();

    let result = ctx.service.update_todo(Some(&user_id), &todo_id, Some("Hijack"), None).await;
    assert!(matches!(result, Err(TodoError::Forbidden)));

    // authorization is checked before the lookup
    let missing = Uuid::new_v4().to_string();
    let result = ctx.service.update_todo(Some(&user_id), &missing, Some("x"), None).await;
    assert!(matches!(result, Err(TodoError::Forbidden)));
    let result = ctx.service.update_todo(Some(&admin_id), &missing, Some("x"), None).await;
    assert!(matches!(result, Err(TodoError::TodoNotFound(_))));

    let renamed = ctx
        .service
        .update_todo(Some(&admin_id), &todo_id, Some("Final"), Some("complete"))
        .await
        .unwrap();
    assert_eq!(renamed.title, "Final");
    assert_eq!(renamed.status, TodoStatus::Complete);
    assert_eq!(renamed.time, todo.time);

    let kept = ctx
        .service
        .update_todo(Some(&admin_id), &todo_id, Some("  "), Some("incomplete"))
        .await
        .unwrap();
    assert_eq!(kept.title, "Final");
    assert_eq!(kept.status, TodoStatus::Incomplete);
    assert_eq!(kept.completion_count, 0);
}

#[tokio::test]
async fn test_delete_todo_removes_completions() {
    let ctx = create_test_context();
    let admin_id = ctx.admin().await.id.to_string();
    let alice_id = ctx.sign_in("alice@example.com").await.id.to_string();
    let bob_id = ctx.sign_in("bob@example.com").await.id.to_string();
    let doomed = ctx.service.create_todo(Some(&admin_id), Some("Doomed"), None).await.unwrap();
    let survivor = ctx.service.create_todo(Some(&admin_id), Some("Survivor"), None).await.unwrap();
    let doomed_id = doomed.id.to_string();
    let survivor_id = survivor.id.to_string();

    for user_id in [&alice_id, &bob_id] {
        ctx.service
            .set_completion(Some(user_id), &doomed_id, Some("complete"), false)
            .await
            .unwrap();
    }
    ctx.service
        .set_completion(Some(&alice_id), &survivor_id, Some("complete"), false)
        .await
        .unwrap();
    assert_eq!(ctx.storage.completion_rows().await, 3);

    let result = ctx.service.delete_todo(Some(&alice_id), &doomed_id).await;
    assert!(matches!(result, Err(TodoError::Forbidden)));

    let snapshot = ctx.service.delete_todo(Some(&admin_id), &doomed_id).await.unwrap();
    assert_eq!(snapshot.completion_count, 2);

    assert_eq!(ctx.storage.completion_rows().await, 1);
    let result = ctx.service.get_todo(None, &doomed_id).await;
    assert!(matches!(result, Err(TodoError::TodoNotFound(_))));
    let result = ctx.service.delete_todo(Some(&admin_id), &doomed_id).await;
    assert!(matches!(result, Err(TodoError::TodoNotFound(_))));
}

#[tokio::test]
async fn test_mutations_are_broadcast() {
    let ctx = create_test_context();
    let admin_id = ctx.admin().await.id.to_string();
    let user_id = ctx.sign_in("user@example.com").await.id.to_string();
    let first = ctx.service.create_todo(Some(&admin_id), Some("First"), None).await.unwrap();
    let first_id = first.id.to_string();
    ctx.service
        .set_completion(Some(&user_id), &first_id, Some("complete"), false)
        .await
        .unwrap();

    let mut events = ctx.service.notifier().subscribe();

    let second = ctx.service.create_todo(Some(&admin_id), Some("Second"), None).await.unwrap();
    let second_id = second.id.to_string();
    ctx.service
        .set_completion(Some(&user_id), &second_id, Some("complete"), true)
        .await
        .unwrap();
    ctx.service.delete_todo(Some(&admin_id), &second_id).await.unwrap();

    let created = events.recv().await.unwrap();
    assert_eq!(created.kind, TodoEventKind::Created);
    assert_eq!(created.todo.id, second.id);

    let updated = events.recv().await.unwrap();
    assert_eq!(updated.kind, TodoEventKind::Updated);
    assert_eq!(updated.todo.id, second.id);
    assert_eq!(updated.todo.completion_count, 1);

    let sibling = events.recv().await.unwrap();
    assert_eq!(sibling.kind, TodoEventKind::Updated);
    assert_eq!(sibling.todo.id, first.id);
    assert_eq!(sibling.todo.completion_count, 0);

    let deleted = events.recv().await.unwrap();
    assert_eq!(deleted.kind, TodoEventKind::Deleted);
    assert_eq!(deleted.todo.id, second.id);
    assert_eq!(deleted.todo.title, "Second");
}

#[tokio::test]
async fn test_list_todos_oldest_first() {
    let ctx = create_test_context();
    let admin_id = ctx.admin().await.id.to_string();
    for title in ["One", "Two", "Three"] {
        ctx.service.create_todo(Some(&admin_id), Some(title), None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let titles: Vec<String> = ctx
        .service
        .list_todos(None)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["One", "Two", "Three"]);
}
