//! Snapshot view-model over one table
//!
//! A `Collection` owns the rows a dashboard page shows. Mutations go through
//! the [`Mutator`]; a success re-fetches the snapshot, a failure leaves it
//! exactly as it was. A committed mutation whose re-fetch fails still returns
//! its value and marks the snapshot stale until the next successful refresh.

use crate::core::error::DashResult;
use crate::core::mutation::{Mutation, Mutator};
use crate::core::query::ListQuery;
use crate::core::{Data, DataService};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

pub struct Collection<T: Data> {
    service: Arc<dyn DataService<T>>,
    mutator: Mutator,
    query: ListQuery,
    rows: Vec<T>,
    stale: bool,
}

impl<T: Data> Collection<T> {
    /// Create an empty collection; call [`refresh`](Self::refresh) to load it
    pub fn new(service: Arc<dyn DataService<T>>, mutator: Mutator, query: ListQuery) -> Self {
        Self {
            service,
            mutator,
            query,
            rows: Vec::new(),
            stale: false,
        }
    }

    /// Create and load in one step
    pub async fn load(
        service: Arc<dyn DataService<T>>,
        mutator: Mutator,
        query: ListQuery,
    ) -> DashResult<Self> {
        let mut collection = Self::new(service, mutator, query);
        collection.refresh().await?;
        Ok(collection)
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find(&self, id: Uuid) -> Option<&T> {
        self.rows.iter().find(|row| row.id() == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.find(id).is_some()
    }

    /// True when a committed mutation could not be followed by a re-fetch
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Re-run the query; on error the previous snapshot is kept
    pub async fn refresh(&mut self) -> DashResult<()> {
        let rows = self.service.query(&self.query).await?;
        self.rows = rows;
        self.stale = false;
        Ok(())
    }

    /// Rows matching a search string AND a status (`None` or `"all"` = any)
    pub fn filtered(&self, search: &str, status: Option<&str>) -> Vec<&T> {
        let status = status.filter(|s| !s.is_empty() && *s != "all");
        self.rows
            .iter()
            .filter(|row| row.matches_search(search))
            .filter(|row| status.is_none_or(|s| row.status_label() == s))
            .collect()
    }

    /// Derived statistics over the current snapshot
    pub fn stats<S>(&self, compute: impl FnOnce(&[T]) -> S) -> S {
        compute(&self.rows)
    }

    /// Run any mutation, re-fetching on success
    ///
    /// The mutation is already committed when the re-fetch runs, so a failed
    /// re-fetch is logged and the value returned with the snapshot stale.
    pub async fn mutate<R, Fut>(&mut self, mutation: Mutation, operation: Fut) -> DashResult<R>
    where
        R: Serialize,
        Fut: Future<Output = DashResult<R>>,
    {
        let value = self.mutator.run(mutation, operation).await?;
        if let Err(e) = self.refresh().await {
            tracing::warn!(
                "{} snapshot refresh failed after mutation: {}",
                T::resource_name(),
                e
            );
            self.stale = true;
        }
        Ok(value)
    }

    pub async fn create(&mut self, entity: T) -> DashResult<T> {
        let service = self.service.clone();
        self.mutate(Mutation::create(T::resource_name_singular()), async move {
            Ok(service.create(entity).await?)
        })
        .await
    }

    pub async fn update(&mut self, mut entity: T) -> DashResult<T> {
        let id = entity.id();
        let service = self.service.clone();
        entity.touch();
        self.mutate(Mutation::update(T::resource_name_singular(), id), async move {
            Ok(service.update(&id, entity).await?)
        })
        .await
    }

    /// Soft delete
    pub async fn delete(&mut self, id: Uuid) -> DashResult<T> {
        let service = self.service.clone();
        self.mutate(
            Mutation::delete(T::resource_name_singular(), id, true),
            async move { Ok(service.soft_delete(&id).await?) },
        )
        .await
    }

    /// Permanent delete
    pub async fn purge(&mut self, id: Uuid) -> DashResult<()> {
        let service = self.service.clone();
        self.mutate(
            Mutation::delete(T::resource_name_singular(), id, false),
            async move { Ok(service.delete(&id).await?) },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Entity;
    use crate::storage::InMemoryDataService;
    use crate::{closed_set, impl_data_entity};
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    closed_set!(
        TaskStatus {
            Todo => "todo",
            Done => "done",
        }
    );

    impl_data_entity!(Task, "task", "tasks", TaskStatus, ["name", "notes"], {
        notes: String,
        points: f64,
    });

    fn task(name: &str, status: TaskStatus, points: f64) -> Task {
        Task::new(name.to_string(), status, None, String::new(), points)
    }

    /// Wraps the in-memory service and fails writes on demand
    struct Flaky {
        inner: InMemoryDataService<Task>,
        broken: AtomicBool,
        reads_broken: AtomicBool,
    }

    impl Flaky {
        fn check(&self) -> Result<()> {
            if self.broken.load(Ordering::SeqCst) {
                Err(anyhow!("backend unavailable"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DataService<Task> for Flaky {
        async fn create(&self, entity: Task) -> Result<Task> {
            self.check()?;
            self.inner.create(entity).await
        }
        async fn get(&self, id: &Uuid) -> Result<Option<Task>> {
            self.inner.get(id).await
        }
        async fn list(&self) -> Result<Vec<Task>> {
            if self.reads_broken.load(Ordering::SeqCst) {
                return Err(anyhow!("read replica unavailable"));
            }
            self.inner.list().await
        }
        async fn update(&self, id: &Uuid, entity: Task) -> Result<Task> {
            self.check()?;
            self.inner.update(id, entity).await
        }
        async fn delete(&self, id: &Uuid) -> Result<()> {
            self.check()?;
            self.inner.delete(id).await
        }
        async fn search(&self, field: &str, value: &str) -> Result<Vec<Task>> {
            self.inner.search(field, value).await
        }
    }

    async fn collection(rows: Vec<Task>) -> (Collection<Task>, Arc<Flaky>) {
        let flaky = Arc::new(Flaky {
            inner: InMemoryDataService::with_rows(rows),
            broken: AtomicBool::new(false),
            reads_broken: AtomicBool::new(false),
        });
        let service: Arc<dyn DataService<Task>> = flaky.clone();
        let collection = Collection::load(service, Mutator::default(), ListQuery::new())
            .await
            .unwrap();
        (collection, flaky)
    }

    #[tokio::test]
    async fn test_create_is_visible_after_refetch() {
        let (mut tasks, _) = collection(vec![]).await;
        let created = tasks.create(task("write docs", TaskStatus::Todo, 3.0)).await.unwrap();
        assert!(tasks.contains(created.id));
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_snapshot_unchanged() {
        let existing = task("ship", TaskStatus::Todo, 5.0);
        let (mut tasks, flaky) = collection(vec![existing.clone()]).await;
        let before: Vec<Uuid> = tasks.rows().iter().map(|t| t.id).collect();

        flaky.broken.store(true, Ordering::SeqCst);
        assert!(tasks.create(task("new", TaskStatus::Todo, 1.0)).await.is_err());
        assert!(tasks.delete(existing.id).await.is_err());

        let after: Vec<Uuid> = tasks.rows().iter().map(|t| t.id).collect();
        assert_eq!(before, after);
        assert!(tasks.find(existing.id).unwrap().deleted_at.is_none());
    }

    #[tokio::test]
    async fn test_delete_removes_from_list() {
        let doomed = task("doomed", TaskStatus::Todo, 1.0);
        let (mut tasks, _) = collection(vec![doomed.clone(), task("kept", TaskStatus::Done, 2.0)]).await;

        tasks.delete(doomed.id).await.unwrap();
        assert!(!tasks.contains(doomed.id));
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_filtered_is_conjunction_of_search_and_status() {
        let (tasks, _) = collection(vec![
            task("fix login", TaskStatus::Todo, 1.0),
            task("fix logout", TaskStatus::Done, 1.0),
            task("refactor", TaskStatus::Done, 1.0),
        ])
        .await;

        for (search, status) in [("fix", Some("done")), ("", Some("done")), ("fix", None), ("", Some("all"))] {
            let expected = tasks
                .rows()
                .iter()
                .filter(|t| t.matches_search(search))
                .filter(|t| status.is_none_or(|s| s == "all" || t.status_label() == s))
                .count();
            assert_eq!(tasks.filtered(search, status).len(), expected);
        }
        assert_eq!(tasks.filtered("fix", Some("done")).len(), 1);
    }

    #[tokio::test]
    async fn test_stats_over_snapshot() {
        let (tasks, _) = collection(vec![
            task("a", TaskStatus::Todo, 1.5),
            task("b", TaskStatus::Done, 2.5),
        ])
        .await;
        let total: f64 = tasks.stats(|rows| rows.iter().map(|t| t.points).sum());
        assert_eq!(total, 4.0);
    }

    #[tokio::test]
    async fn test_committed_mutation_survives_failed_refetch() {
        let (mut tasks, flaky) = collection(vec![task("old", TaskStatus::Todo, 1.0)]).await;

        flaky.reads_broken.store(true, Ordering::SeqCst);
        let created = tasks.create(task("new", TaskStatus::Todo, 2.0)).await.unwrap();
        assert!(tasks.is_stale());
        assert!(!tasks.contains(created.id));
        assert!(flaky.inner.get(&created.id).await.unwrap().is_some());

        flaky.reads_broken.store(false, Ordering::SeqCst);
        tasks.refresh().await.unwrap();
        assert!(!tasks.is_stale());
        assert!(tasks.contains(created.id));
    }
}
