#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::error::AppError;
    use crate::pagination::PaginationContext;
    use crate::state::AppState;
    use crate::tests::{seed_user, test_config, test_state, test_state_with};
    use crate::types::{DataCreate, DataMetaWrite, DataPointCreate, DataUpdate, MetaCreate, MetaUpdate, UserCreate};

    async fn seed_data(state: &AppState, name: &str, data_type: &str) -> i64 {
        let owner = seed_user(&state.db, &format!("owner-of-{}", name)).await;
        let input = DataCreate { name: name.to_string(), description: None, data_type: data_type.to_string() };
        state.datas.create(owner, input).await.unwrap().id
    }

    async fn seed_meta(state: &AppState, name: &str, meta_type: &str) -> i64 {
        let input = MetaCreate { name: name.to_string(), meta_type: meta_type.to_string() };
        state.metas.create(input).await.unwrap().id
    }

    fn point(value: serde_json::Value) -> DataPointCreate {
        DataPointCreate { data_id: None, created_at: None, value }
    }

    async fn count(state: &AppState, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table)).fetch_one(&state.db).await.unwrap()
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let state = test_state().await;
        let input = UserCreate {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "analytical".to_string(),
        };
        let user = state.users.register(input).await.unwrap();
        assert_eq!(user.username, "ada");

        let stored: String = sqlx::query_scalar(r#"SELECT password FROM "user" WHERE id = ?1"#)
            .bind(user.id)
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_ne!(stored, "analytical");

        assert_eq!(state.users.authenticate("ada", "analytical").await.unwrap().id, user.id);
        assert_eq!(state.users.authenticate("ada@example.com", "analytical").await.unwrap().id, user.id);
        assert!(matches!(state.users.authenticate("ada", "wrong").await, Err(AppError::Unauthorized(_))));
        assert!(matches!(state.users.authenticate("nobody", "analytical").await, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let state = test_state().await;
        let bad_email = UserCreate { username: "ada".into(), email: "nope".into(), password: "pw".into() };
        assert!(matches!(state.users.register(bad_email).await, Err(AppError::Validation(_))));
        let blank = UserCreate { username: "  ".into(), email: "a@b.io".into(), password: "pw".into() };
        assert!(matches!(state.users.register(blank).await, Err(AppError::Validation(_))));
        assert_eq!(count(&state, r#""user""#).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_data_name_conflicts() {
        let state = test_state().await;
        let owner = seed_user(&state.db, "ada").await;
        let input = DataCreate { name: "kitchen".into(), description: None, data_type: "float".into() };
        state.datas.create(owner, input.clone()).await.unwrap();

        let err = state.datas.create(owner, input).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "{:?}", err);
        assert_eq!(count(&state, "data").await, 1);
    }

    #[tokio::test]
    async fn test_data_requires_known_type_and_owner() {
        let state = test_state().await;
        let owner = seed_user(&state.db, "ada").await;
        let input = DataCreate { name: "x".into(), description: None, data_type: "boolean".into() };
        assert!(matches!(state.datas.create(owner, input).await, Err(AppError::Validation(_))));

        let input = DataCreate { name: "x".into(), description: None, data_type: "integer".into() };
        assert!(matches!(state.datas.create(owner + 100, input).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_data_keeps_type() {
        let state = test_state().await;
        let id = seed_data(&state, "kitchen", "float").await;
        let updated = state
            .datas
            .update(id, DataUpdate { name: "kitchen temp".into(), description: Some("°C".into()) })
            .await
            .unwrap();
        assert_eq!(updated.name, "kitchen temp");
        assert_eq!(updated.description.as_deref(), Some("°C"));
        assert_eq!(updated.data_type.as_str(), "float");

        let missing = state.datas.update(id + 1, DataUpdate { name: "y".into(), description: None }).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_data_point_validation() {
        let state = test_state().await;
        let id = seed_data(&state, "counter", "integer").await;

        let stored = state.data_points.create(id, point(json!("42"))).await.unwrap();
        assert_eq!(stored.value, json!(42));
        let stored = state.data_points.create(id, point(json!(4.0))).await.unwrap();
        assert_eq!(stored.value, json!(4));

        let err = state.data_points.create(id, point(json!(4.5))).await.unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.starts_with("validation failed"));
                assert!(msg.contains("4.5"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(count(&state, "data_point").await, 2);
    }

    #[tokio::test]
    async fn test_data_point_under_missing_data() {
        let state = test_state().await;
        let err = state.data_points.create(999, point(json!(1))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(matches!(state.data_points.list(999, &PaginationContext::default()).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_data_point_id_mismatch() {
        let state = test_state().await;
        let id = seed_data(&state, "counter", "integer").await;
        let input = DataPointCreate { data_id: Some(id + 1), created_at: None, value: json!(1) };
        assert!(matches!(state.data_points.create(id, input).await, Err(AppError::Validation(_))));

        let input = DataPointCreate { data_id: Some(id), created_at: None, value: json!(1) };
        assert!(state.data_points.create(id, input).await.is_ok());
    }

    #[tokio::test]
    async fn test_point_under_wrong_parent_is_not_found() {
        let state = test_state().await;
        let a = seed_data(&state, "a", "string").await;
        let b = seed_data(&state, "b", "string").await;
        let p = state.data_points.create(a, point(json!("x"))).await.unwrap();

        assert!(matches!(state.data_points.get(b, p.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(state.data_points.delete(b, p.id).await, Err(AppError::NotFound(_))));
        assert_eq!(state.data_points.get(a, p.id).await.unwrap().value, json!("x"));
    }

    #[tokio::test]
    async fn test_delete_data_with_points_conflicts() {
        let state = test_state().await;
        let id = seed_data(&state, "kitchen", "float").await;
        state.data_points.create(id, point(json!(21.5))).await.unwrap();
        state.data_points.create(id, point(json!(22.0))).await.unwrap();

        let err = state.datas.delete(id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "{:?}", err);
        assert_eq!(count(&state, "data").await, 1);
        assert_eq!(count(&state, "data_point").await, 2);

        // Deleting the children first unblocks it
        let points = state.data_points.list(id, &PaginationContext::default()).await.unwrap();
        for p in points.items {
            state.data_points.delete(id, p.id).await.unwrap();
        }
        state.datas.delete(id).await.unwrap();
        assert!(matches!(state.datas.get(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(state.datas.delete(id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_data_meta_lifecycle() {
        let state = test_state().await;
        let data_id = seed_data(&state, "kitchen", "float").await;
        let meta_id = seed_meta(&state, "color", "string").await;

        let write = |value| DataMetaWrite { data_id, meta_id, value };
        let created = state.data_metas.create(data_id, write(json!("red"))).await.unwrap();
        assert_eq!((created.data_id, created.meta_id), (data_id, meta_id));
        assert_eq!(created.value, json!("red"));

        let dup = state.data_metas.create(data_id, write(json!("blue"))).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let updated = state.data_metas.update(data_id, meta_id, write(json!("blue"))).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.value, json!("blue"));

        // Meta is still referenced
        assert!(matches!(state.metas.delete(meta_id).await, Err(AppError::Conflict(_))));

        state.data_metas.delete(data_id, meta_id).await.unwrap();
        assert!(matches!(state.data_metas.get(data_id, meta_id).await, Err(AppError::NotFound(_))));
        state.metas.delete(meta_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_data_meta_checks() {
        let state = test_state().await;
        let data_id = seed_data(&state, "kitchen", "float").await;
        let meta_id = seed_meta(&state, "floor", "integer").await;

        let mismatch = DataMetaWrite { data_id: data_id + 1, meta_id, value: json!(1) };
        assert!(matches!(state.data_metas.create(data_id, mismatch).await, Err(AppError::Validation(_))));

        let missing_meta = DataMetaWrite { data_id, meta_id: meta_id + 1, value: json!(1) };
        assert!(matches!(state.data_metas.create(data_id, missing_meta).await, Err(AppError::NotFound(_))));

        let missing_data = DataMetaWrite { data_id: 999, meta_id, value: json!(1) };
        assert!(matches!(state.data_metas.create(999, missing_data).await, Err(AppError::NotFound(_))));

        state.data_metas.create(data_id, DataMetaWrite { data_id, meta_id, value: json!(2) }).await.unwrap();
        let wrong_meta = DataMetaWrite { data_id, meta_id: meta_id + 1, value: json!(3) };
        assert!(matches!(state.data_metas.update(data_id, meta_id, wrong_meta).await, Err(AppError::Validation(_))));

        // Types are not enforced by default
        let loose = state
            .data_metas
            .update(data_id, meta_id, DataMetaWrite { data_id, meta_id, value: json!("second") })
            .await
            .unwrap();
        assert_eq!(loose.value, json!("second"));
    }

    #[tokio::test]
    async fn test_data_meta_type_enforcement() {
        let mut cfg = test_config();
        cfg.api.enforce_meta_types = true;
        let state = test_state_with(cfg).await;
        let data_id = seed_data(&state, "kitchen", "float").await;
        let meta_id = seed_meta(&state, "floor", "integer").await;

        let bad = DataMetaWrite { data_id, meta_id, value: json!("second") };
        assert!(matches!(state.data_metas.create(data_id, bad).await, Err(AppError::Validation(_))));

        let good = DataMetaWrite { data_id, meta_id, value: json!("2") };
        assert_eq!(state.data_metas.create(data_id, good).await.unwrap().value, json!(2));
    }

    #[tokio::test]
    async fn test_meta_rename_and_conflict() {
        let state = test_state().await;
        let a = seed_meta(&state, "color", "string").await;
        seed_meta(&state, "unit", "string").await;

        let renamed = state.metas.update(a, MetaUpdate { name: "colour".into() }).await.unwrap();
        assert_eq!(renamed.name, "colour");
        assert_eq!(renamed.meta_type.as_str(), "string");

        let err = state.metas.update(a, MetaUpdate { name: "unit".into() }).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(matches!(state.metas.update(a + 50, MetaUpdate { name: "z".into() }).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_metrics_count_writes() {
        let state = test_state().await;
        let id = seed_data(&state, "kitchen", "float").await;
        state.data_points.create(id, point(json!(1.5))).await.unwrap();
        seed_meta(&state, "color", "string").await;

        let snapshot = state.metrics.get_snapshot();
        assert_eq!(snapshot.datas_created, 1);
        assert_eq!(snapshot.data_points_ingested, 1);
        assert_eq!(snapshot.metas_created, 1);
        assert_eq!(snapshot.users_registered, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config();
        cfg.database.url = format!("sqlite://{}", dir.path().join("historian.db").display());
        cfg.database.max_connections = 8;
        let state = test_state_with(cfg).await;
        let id = seed_data(&state, "kitchen", "float").await;

        let mut handles = Vec::new();
        for i in 0..200 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                // Interleave reads with the writes
                state.datas.get(id).await?;
                state.data_points.create(id, point(json!(i))).await
            }));
        }
        let mut failures = Vec::new();
        for handle in handles {
            if let Err(e) = handle.await.unwrap() {
                failures.push(e.to_string());
            }
        }
        assert!(failures.is_empty(), "{} of 200 failed, first: {:?}", failures.len(), failures.first());
        assert_eq!(count(&state, "data_point").await, 200);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicates_conflict_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = test_config();
        cfg.database.url = format!("sqlite://{}", dir.path().join("historian.db").display());
        cfg.database.max_connections = 8;
        let state = test_state_with(cfg).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                state.metas.create(MetaCreate { name: "color".into(), meta_type: "string".into() }).await
            }));
        }
        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::Conflict(_)) => {}
                Err(other) => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(count(&state, "meta").await, 1);
    }

    #[tokio::test]
    async fn test_value_search_ignores_json_quoting() {
        let state = test_state().await;
        let data_id = seed_data(&state, "notes", "string").await;
        for value in ["red", r#"say "hi""#, "12"] {
            state.data_points.create(data_id, point(json!(value))).await.unwrap();
        }

        let search = |term: &str| PaginationContext::new(10, 0, Some(term.to_string())).unwrap();
        let page = state.data_points.list(data_id, &search(r#"say "hi"#)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].value, json!(r#"say "hi""#));

        // Only the value that really contains a quote
        assert_eq!(state.data_points.list(data_id, &search("\"")).await.unwrap().total, 1);
        assert_eq!(state.data_points.list(data_id, &search("12")).await.unwrap().total, 1);

        let meta_id = seed_meta(&state, "label", "string").await;
        let write = DataMetaWrite { data_id, meta_id, value: json!("blue") };
        state.data_metas.create(data_id, write).await.unwrap();
        assert_eq!(state.data_metas.list(data_id, &search("\"")).await.unwrap().total, 0);
        assert_eq!(state.data_metas.list(data_id, &search("blue")).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_login_prefers_username_over_email() {
        let state = test_state().await;
        let bob = state
            .users
            .register(UserCreate {
                username: "bob".into(),
                email: "carol@example.com".into(),
                password: "bob-pw".into(),
            })
            .await
            .unwrap();
        let carol = state
            .users
            .register(UserCreate {
                username: "carol@example.com".into(),
                email: "carol2@example.com".into(),
                password: "carol-pw".into(),
            })
            .await
            .unwrap();

        let user = state.users.authenticate("carol@example.com", "carol-pw").await.unwrap();
        assert_eq!(user.id, carol.id);
        assert_eq!(state.users.authenticate("bob", "bob-pw").await.unwrap().id, bob.id);
    }
}
