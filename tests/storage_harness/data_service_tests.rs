//! Macro-generated test suite for the `DataService<Asset>` contract.
//!
//! The `data_service_tests!` macro generates a test module that validates
//! any `DataService<Asset>` implementation: CRUD, single-field search,
//! soft delete and the table-scoped list query.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use opsboard::storage::InMemoryDataService;
//!
//! data_service_tests!(InMemoryDataService::<Asset>::new());
//! ```

/// Generate a `DataService<Asset>` conformance test suite.
///
/// `$factory` is re-evaluated for each test. The concurrent access test
/// also needs the service to be `Clone + 'static` with clones sharing rows.
#[macro_export]
macro_rules! data_service_tests {
    ($factory:expr) => {
        mod data_service_contract_tests {
            use super::*;
            use opsboard::core::entity::{Data, Entity};
            use opsboard::core::query::{ListQuery, SortSpec};
            use opsboard::core::service::DataService;
            use uuid::Uuid;

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_create_and_get() {
                let service = $factory;
                let asset = create_test_asset("Alice", "alice@test.com", 30, 4.5, true);
                let id = asset.id;

                let created = service.create(asset).await.unwrap();
                assert_eq!(created.id(), id);
                assert_eq!(created.entity_type(), "asset");
                assert_eq!(created.status_label(), "active");

                let retrieved = service.get(&id).await.unwrap().expect("row after create");
                assert_eq!(retrieved.name(), "Alice");
                assert_eq!(retrieved.email, "alice@test.com");
                assert_eq!(retrieved.age, 30);
                assert!(retrieved.active);
                assert_field_value_float(&retrieved.field_value("score").unwrap(), 4.5);
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let service = $factory;
                assert!(service.get(&Uuid::new_v4()).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_list_multiple() {
                let service = $factory;
                let mut expected: Vec<Uuid> = Vec::new();
                for asset in sample_batch(5) {
                    expected.push(asset.id);
                    service.create(asset).await.unwrap();
                }

                let all = service.list().await.unwrap();
                assert_count(&all, 5);
                for id in &expected {
                    assert!(all.iter().any(|a| a.id() == *id), "missing {}", id);
                }
            }

            #[tokio::test]
            async fn test_update_existing() {
                let service = $factory;
                let mut asset = create_test_asset("Alice", "alice@test.com", 25, 3.0, true);
                let id = asset.id;
                service.create(asset.clone()).await.unwrap();

                asset.name = "Alice Updated".to_string();
                asset.age = 26;
                asset.status = AssetStatus::Retired;
                service.update(&id, asset).await.unwrap();

                let retrieved = service.get(&id).await.unwrap().unwrap();
                assert_eq!(retrieved.name(), "Alice Updated");
                assert_eq!(retrieved.age, 26);
                assert_eq!(retrieved.status, AssetStatus::Retired);
            }

            #[tokio::test]
            async fn test_update_nonexistent() {
                let service = $factory;
                let asset = create_test_asset("Ghost", "ghost@test.com", 0, 0.0, false);
                let id = asset.id;
                assert!(service.update(&id, asset).await.is_err());
            }

            #[tokio::test]
            async fn test_delete_existing() {
                let service = $factory;
                let asset = create_test_asset("ToDelete", "delete@test.com", 40, 2.0, true);
                let id = asset.id;
                service.create(asset).await.unwrap();

                service.delete(&id).await.unwrap();
                assert!(service.get(&id).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_create_duplicate_id_is_rejected() {
                let service = $factory;
                let first = create_test_asset("First", "first@test.com", 20, 1.0, true);
                let mut second = create_test_asset("Second", "second@test.com", 30, 2.0, false);
                second.id = first.id;
                let id = first.id;

                service.create(first).await.unwrap();
                assert!(service.create(second).await.is_err());
                assert_eq!(service.get(&id).await.unwrap().unwrap().name(), "First");
            }

            // ==================================================================
            // Search
            // ==================================================================

            #[tokio::test]
            async fn test_search_by_column_type() {
                let service = $factory;
                service
                    .create(create_test_asset("Alice", "alice@test.com", 25, 9.5, true))
                    .await
                    .unwrap();
                service
                    .create(create_test_asset("Bob", "bob@test.com", 25, 2.0, true))
                    .await
                    .unwrap();
                service
                    .create(create_test_asset("Carol", "carol@test.com", 60, 3.0, false))
                    .await
                    .unwrap();

                let by_email = service.search("email", "ALICE@test.com").await.unwrap();
                assert_count(&by_email, 1);
                assert_eq!(by_email[0].name(), "Alice");

                assert_count(&service.search("age", "25").await.unwrap(), 2);
                assert_count(&service.search("score", "9.5").await.unwrap(), 1);
                assert_count(&service.search("active", "false").await.unwrap(), 1);
                assert!(service.search("email", "nobody@test.com").await.unwrap().is_empty());
                assert!(service.search("no_such_column", "x").await.unwrap().is_empty());
            }

            // ==================================================================
            // Soft delete
            // ==================================================================

            #[tokio::test]
            async fn test_soft_delete_and_restore() {
                let service = $factory;
                let asset = create_test_asset("Laptop", "it@test.com", 3, 1.0, true);
                let id = asset.id;
                service.create(asset).await.unwrap();

                let deleted = service.soft_delete(&id).await.unwrap();
                assert!(deleted.is_deleted());
                assert!(service.query(&ListQuery::new()).await.unwrap().is_empty());
                assert_count(&service.query(&ListQuery::new().include_deleted()).await.unwrap(), 1);

                let restored = service.restore(&id).await.unwrap();
                assert!(!restored.is_deleted());
                assert_count(&service.query(&ListQuery::new()).await.unwrap(), 1);
            }

            #[tokio::test]
            async fn test_soft_delete_nonexistent() {
                let service = $factory;
                assert!(service.soft_delete(&Uuid::new_v4()).await.is_err());
            }

            // ==================================================================
            // List query
            // ==================================================================

            #[tokio::test]
            async fn test_query_owner_scope() {
                let service = $factory;
                let alice = Uuid::new_v4();
                let bob = Uuid::new_v4();
                service.create(create_owned_asset("Desk", alice)).await.unwrap();
                service.create(create_owned_asset("Chair", alice)).await.unwrap();
                service.create(create_owned_asset("Lamp", bob)).await.unwrap();

                let rows = service.query(&ListQuery::new().owner(alice)).await.unwrap();
                assert_count(&rows, 2);
                assert!(rows.iter().all(|a| a.owner_id() == Some(alice)));
            }

            #[tokio::test]
            async fn test_query_search_and_status_are_conjunctive() {
                let service = $factory;
                let mut retired = create_test_asset("Old server", "ops@test.com", 9, 1.0, false);
                retired.status = AssetStatus::Retired;
                service.create(retired).await.unwrap();
                service
                    .create(create_test_asset("New server", "ops@test.com", 1, 1.0, true))
                    .await
                    .unwrap();
                service
                    .create(create_test_asset("Printer", "ops@test.com", 4, 1.0, true))
                    .await
                    .unwrap();

                let rows = service
                    .query(&ListQuery::new().search("server").status("active"))
                    .await
                    .unwrap();
                assert_count(&rows, 1);
                assert_eq!(rows[0].name(), "New server");
            }

            #[tokio::test]
            async fn test_query_sort_and_limit() {
                let service = $factory;
                for asset in sample_batch(6) {
                    service.create(asset).await.unwrap();
                }

                let rows = service
                    .query(&ListQuery::new().sort(SortSpec::desc("score")).limit(3))
                    .await
                    .unwrap();
                let names: Vec<&str> = rows.iter().map(|a| a.name()).collect();
                assert_eq!(names, vec!["Asset_5", "Asset_4", "Asset_3"]);
            }

            // ==================================================================
            // Concurrency
            // ==================================================================

            #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
            async fn test_concurrent_access() {
                let service = $factory;
                let s1 = service.clone();
                let s2 = service.clone();

                let a = create_test_asset("Concurrent_A", "ca@test.com", 20, 1.0, true);
                let b = create_test_asset("Concurrent_B", "cb@test.com", 30, 2.0, false);
                let (id_a, id_b) = (a.id, b.id);

                let h1 = tokio::spawn(async move { s1.create(a).await });
                let h2 = tokio::spawn(async move { s2.create(b).await });
                let (r1, r2) = tokio::try_join!(h1, h2).unwrap();
                r1.unwrap();
                r2.unwrap();

                let all = service.list().await.unwrap();
                assert_count(&all, 2);
                assert!(all.iter().any(|x| x.id() == id_a));
                assert!(all.iter().any(|x| x.id() == id_b));
            }
        }
    };
}
