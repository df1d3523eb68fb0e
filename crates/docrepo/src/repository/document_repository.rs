//! Repository over a single document collection.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{ReadRepository, WriteMode, WriteRepository};
use crate::config::RepositoryConfig;
use crate::mapper::Mapper;
use crate::store::{CollectionRef, Precondition, WriteOp};
use crate::types::{
    Direction, Document, DocumentId, Entity, Filter, FindOptions, MatchFilter, Page, PageCursor,
    PageRequest,
};
use crate::unit_of_work::UnitOfWork;
use crate::{Error, Result, TRACING_TARGET_REPOSITORY};

/// Repository that maps entities of type `T` onto one document collection.
///
/// Instances hold no per-call state and can be shared across tasks, as long
/// as each concurrent caller in [`WriteMode::Batched`] mode uses its own unit
/// of work.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use docrepo::{CollectionRef, DocumentRepository, JsonMapper, MemoryStore};
/// # #[derive(serde::Serialize, serde::Deserialize)]
/// # struct User { id: u64 }
/// # impl docrepo::Entity for User {
/// #     fn id(&self) -> docrepo::DocumentId { self.id.into() }
/// # }
///
/// let collection = CollectionRef::new(Arc::new(MemoryStore::new()), "users");
/// let users: DocumentRepository<User, _> =
///     DocumentRepository::immediate(JsonMapper::<User>::new(), collection);
/// ```
pub struct DocumentRepository<T, M> {
    mapper: M,
    collection: CollectionRef,
    write_mode: WriteMode,
    config: RepositoryConfig,
    _entity: PhantomData<fn() -> T>,
}

impl<T, M> DocumentRepository<T, M>
where
    T: Entity,
    M: Mapper<T>,
{
    /// Creates a repository with the default configuration.
    pub fn new(mapper: M, collection: CollectionRef, write_mode: WriteMode) -> Self {
        Self {
            mapper,
            collection,
            write_mode,
            config: RepositoryConfig::default(),
            _entity: PhantomData,
        }
    }

    /// Creates a repository that writes straight to the store.
    pub fn immediate(mapper: M, collection: CollectionRef) -> Self {
        Self::new(mapper, collection, WriteMode::Immediate)
    }

    /// Creates a repository that queues writes into `unit_of_work`.
    pub fn batched(mapper: M, collection: CollectionRef, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self::new(mapper, collection, WriteMode::Batched(unit_of_work))
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: RepositoryConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Returns the collection handle.
    #[inline]
    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    /// Returns the write mode.
    #[inline]
    pub fn write_mode(&self) -> &WriteMode {
        &self.write_mode
    }

    /// Returns the configuration.
    #[inline]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    fn to_entities(&self, rows: Vec<Document>) -> Result<Vec<T>> {
        rows.into_iter()
            .map(|document| self.mapper.to_entity(document))
            .collect()
    }

    async fn dispatch(&self, op: WriteOp) -> Result<()> {
        if let WriteMode::Batched(unit_of_work) = &self.write_mode {
            return unit_of_work.enqueue(op).await;
        }

        match op {
            WriteOp::Create { id, data, .. } => self.collection.create(&id, data).await,
            WriteOp::Update { id, data, .. } => self.collection.update(&id, data).await,
            WriteOp::Delete {
                id, precondition, ..
            } => self.collection.delete(&id, precondition).await,
        }
    }
}

impl<T, M> ReadRepository<T> for DocumentRepository<T, M>
where
    T: Entity,
    M: Mapper<T>,
{
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_REPOSITORY,
        fields(collection = %self.collection.name())
    )]
    async fn find(&self, options: FindOptions) -> Result<Vec<T>> {
        let take = self.config.resolve_take(options.take);
        let query = self.collection.limit(take).apply(&options.filter);
        let rows = self.collection.run(&query).await?;

        tracing::debug!(target: TRACING_TARGET_REPOSITORY, take, rows = rows.len(), "Find completed");
        self.to_entities(rows)
    }

    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_REPOSITORY,
        fields(collection = %self.collection.name())
    )]
    async fn find_one(&self, filter: MatchFilter) -> Result<Option<T>> {
        let query = self.collection.limit(1).apply(filter.as_filter());
        let row = self.collection.run(&query).await?.into_iter().next();

        tracing::debug!(target: TRACING_TARGET_REPOSITORY, found = row.is_some(), "Find one completed");
        row.map(|document| self.mapper.to_entity(document))
            .transpose()
    }

    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_REPOSITORY,
        fields(collection = %self.collection.name(), %id)
    )]
    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<T>> {
        self.collection
            .get(id)
            .await?
            .map(|document| self.mapper.to_entity(document))
            .transpose()
    }

    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_REPOSITORY,
        fields(collection = %self.collection.name())
    )]
    async fn paginate(&self, request: PageRequest) -> Result<Page<T>> {
        let resumed = request.page_token.is_some();
        let cursor = request
            .page_token
            .as_deref()
            .map(PageCursor::decode)
            .transpose()?;

        let take = self
            .config
            .resolve_take(cursor.as_ref().and_then(|c| c.take).or(request.take));
        let page = cursor.as_ref().and_then(|c| c.page).unwrap_or(0);
        let direction = cursor.as_ref().map_or(Direction::Next, |c| c.direction);
        let reference = cursor.as_ref().and_then(|c| c.reference.clone());

        let filter = match cursor {
            Some(cursor) => Filter {
                conditions: cursor.conditions.unwrap_or(request.filter.conditions),
                order_by: cursor.order_by.unwrap_or(request.filter.order_by),
            },
            None => request.filter,
        };

        // Backward scans already know a following page exists: the reference row.
        let forward = reference.is_none() || direction == Direction::Next;
        let lookahead = self.config.exact_next_page && forward;
        let fetch = if lookahead { take + 1 } else { take };

        let query = self.collection.query().order_by_document_id();
        let query = match (&reference, direction) {
            (Some(reference), Direction::Next) => query.start_after(reference).limit(fetch),
            (Some(reference), Direction::Prev) => query.end_before(reference).limit_to_last(take),
            (None, _) => query.limit(fetch),
        }
        .apply(&filter);

        tracing::debug!(
            target: TRACING_TARGET_REPOSITORY,
            %direction,
            take,
            page,
            "Fetching page"
        );

        let mut rows = self.collection.run(&query).await?;
        let has_next = if lookahead {
            let more = rows.len() > take;
            rows.truncate(take);
            more
        } else if self.config.exact_next_page {
            !rows.is_empty()
        } else {
            rows.len() == take
        };

        let prev_page_token = match rows.first() {
            Some(first) if resumed && page > 0 => Some(
                PageCursor::new(Direction::Prev, first.id.clone(), take, &filter, page - 1)
                    .encode()?,
            ),
            _ => None,
        };

        let next_page_token = match rows.last() {
            Some(last) if has_next => {
                let next = page.checked_add(1).ok_or_else(|| {
                    Error::invalid_page_token(format!("page {page} is out of range"))
                })?;
                Some(
                    PageCursor::new(Direction::Next, last.id.clone(), take, &filter, next)
                        .encode()?,
                )
            }
            _ => None,
        };

        tracing::debug!(
            target: TRACING_TARGET_REPOSITORY,
            rows = rows.len(),
            has_next = next_page_token.is_some(),
            has_prev = prev_page_token.is_some(),
            "Page fetched"
        );

        Ok(Page {
            data: self.to_entities(rows)?,
            next_page_token,
            prev_page_token,
        })
    }
}

impl<T, M> WriteRepository<T> for DocumentRepository<T, M>
where
    T: Entity,
    M: Mapper<T>,
{
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_REPOSITORY,
        fields(collection = %self.collection.name(), id = %entity.id())
    )]
    async fn create(&self, entity: &T) -> Result<()> {
        let data = self.mapper.to_json(entity)?;
        let op = WriteOp::create(self.collection.name(), entity.id(), data);
        self.dispatch(op).await
    }

    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_REPOSITORY,
        fields(collection = %self.collection.name(), id = %entity.id())
    )]
    async fn update(&self, entity: &T) -> Result<()> {
        let data = self.mapper.to_json(entity)?;
        let op = WriteOp::update(self.collection.name(), entity.id(), data);
        self.dispatch(op).await
    }

    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_REPOSITORY,
        fields(collection = %self.collection.name(), %id)
    )]
    async fn delete_by_id(&self, id: &DocumentId) -> Result<()> {
        let op = WriteOp::delete(self.collection.name(), id.clone(), Precondition::Exists);
        self.dispatch(op).await
    }
}

impl<T, M> fmt::Debug for DocumentRepository<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRepository")
            .field("collection", &self.collection)
            .field("write_mode", &self.write_mode)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use base64::prelude::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::mapper::JsonMapper;
    use crate::store::MemoryStore;
    use crate::unit_of_work::StoreUnitOfWork;
    use crate::SortOrder;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u64,
        name: String,
        team: String,
    }

    impl User {
        fn new(id: u64, name: &str, team: &str) -> Self {
            Self {
                id,
                name: name.to_owned(),
                team: team.to_owned(),
            }
        }
    }

    impl Entity for User {
        fn id(&self) -> DocumentId {
            self.id.into()
        }
    }

    type Users = DocumentRepository<User, JsonMapper<User>>;

    fn repository(store: &MemoryStore) -> Users {
        let collection = CollectionRef::new(Arc::new(store.clone()), "users");
        DocumentRepository::immediate(JsonMapper::new(), collection)
    }

    async fn seeded(users: &[User]) -> (MemoryStore, Users) {
        let store = MemoryStore::new();
        let repo = repository(&store);
        for user in users {
            repo.create(user).await.unwrap();
        }
        (store, repo)
    }

    fn ids(page: &[User]) -> Vec<u64> {
        page.iter().map(|user| user.id).collect()
    }

    fn abc() -> Vec<User> {
        vec![
            User::new(1, "a", "x"),
            User::new(2, "b", "x"),
            User::new(3, "c", "y"),
        ]
    }

    #[tokio::test]
    async fn paginate_walks_forward_and_back() {
        let (_, repo) = seeded(&abc()).await;

        let first = repo
            .paginate(PageRequest::default().with_take(2))
            .await
            .unwrap();
        assert_eq!(ids(&first.data), vec![1, 2]);
        assert!(first.next_page_token.is_some());
        assert!(first.prev_page_token.is_none());

        let second = repo
            .paginate(PageRequest::default().with_optional_token(first.next_page_token))
            .await
            .unwrap();
        assert_eq!(ids(&second.data), vec![3]);
        assert!(second.next_page_token.is_none());
        assert!(second.prev_page_token.is_some());

        let back = repo
            .paginate(PageRequest::default().with_optional_token(second.prev_page_token))
            .await
            .unwrap();
        assert_eq!(ids(&back.data), vec![1, 2]);
        assert!(back.prev_page_token.is_none());
        assert!(back.next_page_token.is_some());
    }

    #[tokio::test]
    async fn next_token_carries_page_state() {
        let (_, repo) = seeded(&abc()).await;

        let first = repo
            .paginate(PageRequest::new(Filter::new().eq("team", "x")).with_take(1))
            .await
            .unwrap();
        let token = first.next_page_token.unwrap();

        let cursor = PageCursor::decode(&token).unwrap();
        assert_eq!(cursor.direction, Direction::Next);
        assert_eq!(cursor.reference, Some(DocumentId::from(1_u64)));
        assert_eq!(cursor.take, Some(1));
        assert_eq!(cursor.page, Some(1));
        assert_eq!(cursor.conditions.map(|c| c.len()), Some(1));
    }

    #[tokio::test]
    async fn token_filter_takes_precedence() {
        let (_, repo) = seeded(&[
            User::new(1, "a", "x"),
            User::new(2, "b", "x"),
            User::new(3, "c", "y"),
            User::new(4, "d", "x"),
            User::new(5, "e", "y"),
        ])
        .await;

        let first = repo
            .paginate(PageRequest::new(Filter::new().eq("team", "x")).with_take(2))
            .await
            .unwrap();
        assert_eq!(ids(&first.data), vec![1, 2]);

        let second = repo
            .paginate(
                PageRequest::new(Filter::new().eq("team", "y"))
                    .with_take(50)
                    .with_optional_token(first.next_page_token),
            )
            .await
            .unwrap();
        assert_eq!(ids(&second.data), vec![4]);
    }

    #[tokio::test]
    async fn full_last_page_yields_empty_trailing_page() {
        let mut users = abc();
        users.push(User::new(4, "d", "y"));
        let (_, repo) = seeded(&users).await;

        let first = repo
            .paginate(PageRequest::default().with_take(2))
            .await
            .unwrap();
        let second = repo
            .paginate(PageRequest::default().with_optional_token(first.next_page_token))
            .await
            .unwrap();
        assert_eq!(ids(&second.data), vec![3, 4]);

        let trailing = repo
            .paginate(PageRequest::default().with_optional_token(second.next_page_token))
            .await
            .unwrap();
        assert!(trailing.is_empty());
        assert!(trailing.next_page_token.is_none());
        assert!(trailing.prev_page_token.is_none());
    }

    #[tokio::test]
    async fn exact_next_page_detects_boundary() {
        let mut users = abc();
        users.push(User::new(4, "d", "y"));
        let (_, repo) = seeded(&users).await;
        let repo = repo
            .with_config(RepositoryConfig::default().with_exact_next_page(true))
            .unwrap();

        let first = repo
            .paginate(PageRequest::default().with_take(2))
            .await
            .unwrap();
        assert_eq!(ids(&first.data), vec![1, 2]);

        let second = repo
            .paginate(PageRequest::default().with_optional_token(first.next_page_token))
            .await
            .unwrap();
        assert_eq!(ids(&second.data), vec![3, 4]);
        assert!(second.next_page_token.is_none());

        let back = repo
            .paginate(PageRequest::default().with_optional_token(second.prev_page_token))
            .await
            .unwrap();
        assert_eq!(ids(&back.data), vec![1, 2]);
        assert!(back.next_page_token.is_some());
    }

    #[tokio::test]
    async fn paginate_rejects_bad_tokens() {
        let (_, repo) = seeded(&abc()).await;

        let sideways = BASE64_STANDARD.encode(r#"{"type":"sideways","ref":"1"}"#);
        let err = repo
            .paginate(PageRequest::default().with_page_token(sideways))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPageToken { .. }));

        let err = repo
            .paginate(PageRequest::default().with_page_token("%%%"))
            .await
            .unwrap_err();
        assert!(err.is_page_token_error());
    }

    #[tokio::test]
    async fn paginate_clamps_token_take() {
        let (_, repo) = seeded(&abc()).await;
        let token = BASE64_STANDARD.encode(r#"{"type":"next","take":0,"page":0}"#);

        let page = repo
            .paginate(PageRequest::default().with_page_token(token))
            .await
            .unwrap();
        assert_eq!(ids(&page.data), vec![1]);
    }

    #[tokio::test]
    async fn paginate_rejects_page_past_range() {
        let (_, repo) = seeded(&abc()).await;
        let token = BASE64_STANDARD.encode(format!(
            r#"{{"type":"next","ref":"0","take":1,"page":{}}}"#,
            u64::MAX
        ));

        let err = repo
            .paginate(PageRequest::default().with_page_token(token))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPageToken { .. }));
    }

    #[tokio::test]
    async fn take_never_exceeds_maximum() {
        let users: Vec<_> = (1..=120)
            .map(|id| User::new(id, &format!("user-{id}"), "x"))
            .collect();
        let (_, repo) = seeded(&users).await;

        let found = repo
            .find(FindOptions::default().with_take(500))
            .await
            .unwrap();
        assert_eq!(found.len(), 100);

        let requested = repo
            .paginate(PageRequest::default().with_take(500))
            .await
            .unwrap();
        assert_eq!(requested.len(), 100);

        let token = BASE64_STANDARD.encode(r#"{"type":"next","take":500,"page":0}"#);
        let resumed = repo
            .paginate(PageRequest::default().with_page_token(token))
            .await
            .unwrap();
        assert_eq!(resumed.len(), 100);
        let cursor = PageCursor::decode(&resumed.next_page_token.unwrap()).unwrap();
        assert_eq!(cursor.take, Some(100));
    }

    #[tokio::test]
    async fn find_applies_filter_and_take() {
        let (_, repo) = seeded(&abc()).await;

        let all = repo.find(FindOptions::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let one = repo
            .find(FindOptions::default().with_take(0))
            .await
            .unwrap();
        assert_eq!(one.len(), 1);

        let team_x = repo
            .find(FindOptions::new(Filter::new().eq("team", "x").desc("name")))
            .await
            .unwrap();
        assert_eq!(ids(&team_x), vec![2, 1]);
    }

    #[tokio::test]
    async fn find_one_returns_first_match() {
        let (_, repo) = seeded(&abc()).await;

        let user = repo
            .find_one(MatchFilter::eq("team", "x").order_by("name", SortOrder::Desc))
            .await
            .unwrap();
        assert_eq!(user.map(|u| u.id), Some(2));

        let missing = repo.find_one(MatchFilter::eq("team", "z")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn find_by_id_maps_document() {
        let (_, repo) = seeded(&abc()).await;

        let user = repo.find_by_id(&DocumentId::from(3_u64)).await.unwrap();
        assert_eq!(user, Some(User::new(3, "c", "y")));
        assert!(repo.find_by_id(&DocumentId::from(9_u64)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn immediate_writes_enforce_preconditions() {
        let (store, repo) = seeded(&abc()).await;

        let err = repo.create(&User::new(1, "dup", "x")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));

        repo.update(&User::new(1, "renamed", "x")).await.unwrap();
        let stored = store.documents("users").await;
        assert_eq!(stored[0].data, json!({ "id": 1, "name": "renamed", "team": "x" }));

        let err = repo.update(&User::new(7, "ghost", "x")).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        repo.delete_by_id(&DocumentId::from(1_u64)).await.unwrap();
        let err = repo
            .delete_by_id(&DocumentId::from(1_u64))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(store.count("users").await, 2);
    }

    #[tokio::test]
    async fn batched_writes_wait_for_commit() {
        let store = MemoryStore::new();
        let unit_of_work = Arc::new(StoreUnitOfWork::new(Arc::new(store.clone())));
        let collection = CollectionRef::new(Arc::new(store.clone()), "users");
        let repo: Users =
            DocumentRepository::batched(JsonMapper::new(), collection, unit_of_work.clone());
        assert!(repo.write_mode().is_batched());

        repo.create(&User::new(1, "a", "x")).await.unwrap();
        repo.update(&User::new(1, "b", "x")).await.unwrap();
        repo.create(&User::new(2, "c", "y")).await.unwrap();
        repo.delete_by_id(&DocumentId::from(2_u64)).await.unwrap();
        assert_eq!(store.count("users").await, 0);

        unit_of_work.commit().await.unwrap();
        let users = repo.find(FindOptions::default()).await.unwrap();
        assert_eq!(users, vec![User::new(1, "b", "x")]);
    }

    #[tokio::test]
    async fn batched_rejection_applies_nothing() {
        let (store, _) = seeded(&abc()).await;
        let unit_of_work = Arc::new(StoreUnitOfWork::new(Arc::new(store.clone())));
        let collection = CollectionRef::new(Arc::new(store.clone()), "users");
        let repo: Users =
            DocumentRepository::batched(JsonMapper::new(), collection, unit_of_work.clone());

        repo.create(&User::new(4, "d", "x")).await.unwrap();
        repo.delete_by_id(&DocumentId::from(8_u64)).await.unwrap();

        let err = unit_of_work.commit().await.unwrap_err();
        assert!(err.is_precondition_failure());
        assert_eq!(store.count("users").await, 3);
    }

    #[tokio::test]
    async fn rollback_discards_batched_writes() {
        let store = MemoryStore::new();
        let unit_of_work = Arc::new(StoreUnitOfWork::new(Arc::new(store.clone())));
        let collection = CollectionRef::new(Arc::new(store.clone()), "users");
        let repo: Users =
            DocumentRepository::batched(JsonMapper::new(), collection, unit_of_work.clone());

        repo.create(&User::new(1, "a", "x")).await.unwrap();
        unit_of_work.rollback().await.unwrap();
        unit_of_work.commit().await.unwrap();
        assert_eq!(store.count("users").await, 0);
    }

    #[test]
    fn with_config_validates() {
        let repo = repository(&MemoryStore::new());
        let err = repo
            .with_config(RepositoryConfig::default().with_max_take(500))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
