//! Topic use cases - select repositories and replace their topic sets

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

use crate::{
    model::{Repository, TopicMode, TopicUpdateOutcome},
    ports::{HostError, RepositoryHost},
};

/// Paging limits for the repository listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub per_page: u32,
    pub max_pages: u32,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            per_page: 50,
            max_pages: 25,
        }
    }
}

/// Errors that stop a topic run
#[derive(Debug, thiserror::Error)]
pub enum TopicRunError {
    #[error("Failed to list repositories: {0}")]
    Enumeration(#[source] HostError),
    #[error("Invalid owner, owner login or repo name for repository {repository}")]
    Integrity { repository: String },
    #[error("Work queue closed before all repositories were queued")]
    QueueClosed,
    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Whether a repository still needs the topic change for `mode`
pub fn needs_update(repo: &Repository, topic: &str, mode: TopicMode) -> bool {
    if !repo.is_eligible() {
        return false;
    }

    match mode {
        TopicMode::Add => !repo.has_topic(topic),
        TopicMode::Remove => repo.has_topic(topic),
    }
}

/// The complete topic set to submit for a repository
pub fn new_topics(current: &[String], topic: &str, mode: TopicMode) -> Vec<String> {
    match mode {
        TopicMode::Add => {
            let mut topics = current.to_vec();
            if !topics.iter().any(|t| t == topic) {
                topics.push(topic.to_string());
            }
            topics
        }
        TopicMode::Remove => current.iter().filter(|t| *t != topic).cloned().collect(),
    }
}

/// Page through the user's repositories and keep the ones needing a change
pub async fn collect_worklist<H>(
    host: &H,
    topic: &str,
    mode: TopicMode,
    options: ListOptions,
) -> Result<Vec<Repository>, TopicRunError>
where
    H: RepositoryHost + ?Sized,
{
    let mut worklist = Vec::new();
    let mut page = 1;

    for _ in 0..options.max_pages {
        let listing = host
            .list_repositories(page, options.per_page)
            .await
            .map_err(TopicRunError::Enumeration)?;

        tracing::debug!(
            page = page,
            count = listing.repositories.len(),
            next_page = ?listing.next_page,
            "Listed repositories"
        );

        worklist.extend(
            listing
                .repositories
                .into_iter()
                .filter(|repo| needs_update(repo, topic, mode)),
        );

        match listing.next_page {
            Some(next) => page = next,
            None => break,
        }
    }

    Ok(worklist)
}

/// Configuration for the topic updater
#[derive(Debug, Clone)]
pub struct TopicUpdaterConfig {
    pub topic: String,
    pub mode: TopicMode,
    pub dry_run: bool,
    /// Number of concurrent workers, at least one is always used
    pub max_workers: usize,
}

impl Default for TopicUpdaterConfig {
    fn default() -> Self {
        Self {
            topic: "hacktoberfest".to_string(),
            mode: TopicMode::Add,
            dry_run: false,
            max_workers: 4,
        }
    }
}

/// Replaces topic sets across a worklist with a fixed pool of workers
pub struct TopicUpdater<H>
where
    H: RepositoryHost + ?Sized,
{
    host: Arc<H>,
    config: TopicUpdaterConfig,
}

impl<H> TopicUpdater<H>
where
    H: RepositoryHost + ?Sized + 'static,
{
    pub fn new(host: Arc<H>, config: TopicUpdaterConfig) -> Self {
        Self { host, config }
    }

    /// Update every repository in the worklist.
    ///
    /// Outcomes come back in completion order. A repository without owner or
    /// name aborts the remaining workers.
    pub async fn run(
        &self,
        worklist: Vec<Repository>,
    ) -> Result<Vec<(String, TopicUpdateOutcome)>, TopicRunError> {
        if worklist.is_empty() {
            return Ok(vec![]);
        }

        let (sender, receiver) = mpsc::channel(worklist.len());
        for repo in worklist {
            sender
                .send(repo)
                .await
                .map_err(|_| TopicRunError::QueueClosed)?;
        }
        drop(sender);

        let receiver = Arc::new(Mutex::new(receiver));
        let mut workers = JoinSet::new();

        for worker in 0..self.config.max_workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let host = Arc::clone(&self.host);
            let config = self.config.clone();

            workers.spawn(async move {
                let mut outcomes = Vec::new();
                loop {
                    let next = receiver.lock().await.recv().await;
                    let Some(repo) = next else {
                        break;
                    };
                    outcomes.push(update_repository(host.as_ref(), &config, repo).await?);
                }
                tracing::trace!(worker = worker, handled = outcomes.len(), "Worker finished");
                Ok::<_, TopicRunError>(outcomes)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(outcomes)) => results.extend(outcomes),
                Ok(Err(e)) => {
                    workers.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    workers.abort_all();
                    return Err(TopicRunError::Worker(e.to_string()));
                }
            }
        }

        Ok(results)
    }
}

async fn update_repository<H>(
    host: &H,
    config: &TopicUpdaterConfig,
    repo: Repository,
) -> Result<(String, TopicUpdateOutcome), TopicRunError>
where
    H: RepositoryHost + ?Sized,
{
    let topics = new_topics(&repo.topics, &config.topic, config.mode);

    let owner = repo.owner.as_deref().filter(|s| !s.is_empty());
    let name = repo.name.as_deref().filter(|s| !s.is_empty());
    let (Some(owner), Some(name)) = (owner, name) else {
        return Err(TopicRunError::Integrity {
            repository: repo.display_name(),
        });
    };

    if config.dry_run {
        tracing::info!(repo = %name, topics = %topics.join(" "), "Not updated (dry run)");
        return Ok((name.to_string(), TopicUpdateOutcome::DryRun { topics }));
    }

    let outcome = match host.replace_topics(owner, name, &topics).await {
        Ok(confirmed) => {
            tracing::info!(repo = %name, topics = %confirmed.join(" "), "Updated");
            TopicUpdateOutcome::Updated { topics: confirmed }
        }
        Err(e) => {
            tracing::error!(repo = %name, error = %e, "Failed to update topics");
            TopicUpdateOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    Ok((name.to_string(), outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RepositoryPage;
    use async_trait::async_trait;
    use std::collections::HashSet;

    const TOPIC: &str = "hacktoberfest";

    fn repo(name: &str, topics: &[&str]) -> Repository {
        Repository {
            id: Some(name.len() as u64),
            owner: Some("octocat".to_string()),
            name: Some(name.to_string()),
            fork: Some(false),
            archived: Some(false),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    struct FakeHost {
        pages: Vec<Vec<Repository>>,
        failing: HashSet<String>,
        listed_pages: std::sync::Mutex<Vec<u32>>,
        replaced: std::sync::Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakeHost {
        fn with_pages(pages: Vec<Vec<Repository>>) -> Self {
            Self {
                pages,
                failing: HashSet::new(),
                listed_pages: std::sync::Mutex::new(vec![]),
                replaced: std::sync::Mutex::new(vec![]),
            }
        }

        fn replaced(&self) -> Vec<(String, Vec<String>)> {
            let mut calls = self.replaced.lock().unwrap().clone();
            calls.sort();
            calls
        }
    }

    #[async_trait]
    impl RepositoryHost for FakeHost {
        async fn list_repositories(
            &self,
            page: u32,
            _per_page: u32,
        ) -> Result<RepositoryPage, HostError> {
            self.listed_pages.lock().unwrap().push(page);
            let index = page as usize - 1;
            let repositories = self
                .pages
                .get(index)
                .cloned()
                .ok_or_else(|| HostError::Api("no such page".to_string()))?;
            let next_page = (index + 1 < self.pages.len()).then_some(page + 1);
            Ok(RepositoryPage {
                repositories,
                next_page,
            })
        }

        async fn replace_topics(
            &self,
            _owner: &str,
            repo: &str,
            topics: &[String],
        ) -> Result<Vec<String>, HostError> {
            if self.failing.contains(repo) {
                return Err(HostError::Api("422 Unprocessable Entity".to_string()));
            }
            self.replaced
                .lock()
                .unwrap()
                .push((repo.to_string(), topics.to_vec()));
            Ok(topics.to_vec())
        }
    }

    fn sample_repos() -> Vec<Repository> {
        let mut fork = repo("fork", &[TOPIC]);
        fork.fork = Some(true);
        let mut archived = repo("archived", &[]);
        archived.archived = Some(true);
        vec![repo("a", &["rust", TOPIC]), repo("b", &["rust"]), fork, archived]
    }

    fn names(repos: &[Repository]) -> Vec<String> {
        repos.iter().map(Repository::display_name).collect()
    }

    #[tokio::test]
    async fn test_worklist_depends_on_mode() {
        let host = FakeHost::with_pages(vec![sample_repos()]);

        let add = collect_worklist(&host, TOPIC, TopicMode::Add, ListOptions::default())
            .await
            .unwrap();
        let remove = collect_worklist(&host, TOPIC, TopicMode::Remove, ListOptions::default())
            .await
            .unwrap();

        assert_eq!(names(&add), vec!["b"]);
        assert_eq!(names(&remove), vec!["a"]);
    }

    #[tokio::test]
    async fn test_worklist_follows_pages_until_last() {
        let host = FakeHost::with_pages(vec![
            vec![repo("one", &[])],
            vec![repo("two", &[])],
            vec![repo("three", &[])],
        ]);

        let worklist = collect_worklist(&host, TOPIC, TopicMode::Add, ListOptions::default())
            .await
            .unwrap();

        assert_eq!(names(&worklist), vec!["one", "two", "three"]);
        assert_eq!(*host.listed_pages.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_worklist_respects_max_pages() {
        let host = FakeHost::with_pages(vec![
            vec![repo("one", &[])],
            vec![repo("two", &[])],
            vec![repo("three", &[])],
        ]);
        let options = ListOptions {
            per_page: 1,
            max_pages: 2,
        };

        let worklist = collect_worklist(&host, TOPIC, TopicMode::Add, options)
            .await
            .unwrap();

        assert_eq!(names(&worklist), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let host = FakeHost::with_pages(vec![]);

        let result = collect_worklist(&host, TOPIC, TopicMode::Add, ListOptions::default()).await;

        assert!(matches!(result, Err(TopicRunError::Enumeration(_))));
    }

    #[test]
    fn test_new_topics() {
        let current = vec!["rust".to_string(), TOPIC.to_string(), "cli".to_string()];

        assert_eq!(
            new_topics(&current, TOPIC, TopicMode::Remove),
            vec!["rust".to_string(), "cli".to_string()]
        );
        assert_eq!(
            new_topics(&["rust".to_string()], TOPIC, TopicMode::Add),
            vec!["rust".to_string(), TOPIC.to_string()]
        );
        assert_eq!(new_topics(&current, TOPIC, TopicMode::Add), current);
    }

    #[tokio::test]
    async fn test_updates_every_repository() {
        let host = Arc::new(FakeHost::with_pages(vec![]));
        let updater = TopicUpdater::new(
            host.clone(),
            TopicUpdaterConfig {
                max_workers: 3,
                ..Default::default()
            },
        );

        let worklist: Vec<Repository> = (0..10)
            .map(|i| repo(&format!("repo{}", i), &["rust"]))
            .collect();
        let results = updater.run(worklist).await.unwrap();

        assert_eq!(results.len(), 10);
        assert!(
            results
                .iter()
                .all(|(_, outcome)| matches!(outcome, TopicUpdateOutcome::Updated { .. }))
        );
        let replaced = host.replaced();
        assert_eq!(replaced.len(), 10);
        assert!(
            replaced
                .iter()
                .all(|(_, topics)| topics == &vec!["rust".to_string(), TOPIC.to_string()])
        );
    }

    #[tokio::test]
    async fn test_dry_run_makes_no_write_calls() {
        let host = Arc::new(FakeHost::with_pages(vec![]));
        let updater = TopicUpdater::new(
            host.clone(),
            TopicUpdaterConfig {
                mode: TopicMode::Remove,
                dry_run: true,
                max_workers: 2,
                ..Default::default()
            },
        );

        let results = updater
            .run(vec![repo("a", &["rust", TOPIC])])
            .await
            .unwrap();

        assert!(host.replaced().is_empty());
        assert_eq!(
            results,
            vec![(
                "a".to_string(),
                TopicUpdateOutcome::DryRun {
                    topics: vec!["rust".to_string()]
                }
            )]
        );
    }

    #[tokio::test]
    async fn test_failed_update_does_not_stop_siblings() {
        let mut host = FakeHost::with_pages(vec![]);
        host.failing.insert("broken".to_string());
        let host = Arc::new(host);
        let updater = TopicUpdater::new(host.clone(), TopicUpdaterConfig::default());

        let mut results = updater
            .run(vec![repo("broken", &[]), repo("fine", &[])])
            .await
            .unwrap();
        results.sort_by(|a, b| a.0.cmp(&b.0));

        assert!(matches!(results[0].1, TopicUpdateOutcome::Failed { .. }));
        assert!(matches!(results[1].1, TopicUpdateOutcome::Updated { .. }));
        assert_eq!(host.replaced().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_identity_aborts_run() {
        let host = Arc::new(FakeHost::with_pages(vec![]));
        let updater = TopicUpdater::new(
            host,
            TopicUpdaterConfig {
                max_workers: 1,
                ..Default::default()
            },
        );
        let mut nameless = repo("nameless", &[]);
        nameless.name = None;

        let result = updater.run(vec![nameless]).await;

        assert!(matches!(result, Err(TopicRunError::Integrity { .. })));
    }

    #[tokio::test]
    async fn test_zero_workers_still_drains_queue() {
        let host = Arc::new(FakeHost::with_pages(vec![]));
        let updater = TopicUpdater::new(
            host.clone(),
            TopicUpdaterConfig {
                max_workers: 0,
                ..Default::default()
            },
        );

        let results = updater.run(vec![repo("solo", &[])]).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(host.replaced().len(), 1);
    }
}
