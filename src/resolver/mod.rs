//! Remote revision resolution
//!
//! Turns symbolic refs into commit ids by listing remote references, with a
//! bounded number of lookups in flight and fixed-delay retry on rate limits.

mod lister;
pub mod retry;
mod revision;

pub use lister::{GitCliLister, RefLister};
pub use retry::{with_retry, RetryDecision, RetryPolicy, RetryableError};
pub use revision::{is_commit_id, RevisionKey, RevisionQuery, RevisionResult};

use crate::{RepoVersionError, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Lookups in flight when no job count is configured
pub const DEFAULT_JOBS: usize = 2;

/// Resolves revision queries concurrently
#[derive(Clone)]
pub struct RevisionResolver {
    lister: Arc<dyn RefLister>,
    jobs: usize,
    retry: RetryPolicy,
}

impl RevisionResolver {
    pub fn new(lister: Arc<dyn RefLister>) -> Self {
        Self {
            lister,
            jobs: DEFAULT_JOBS,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the number of concurrent lookups (at least one)
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Resolve a single query
    pub async fn resolve_one(&self, query: &RevisionQuery) -> Result<RevisionResult> {
        resolve_query(self.lister.as_ref(), &self.retry, query).await
    }

    /// Resolve every query, returning results in query order
    ///
    /// The first failure aborts the remaining lookups and is returned; no
    /// partial result set is ever produced.
    pub async fn resolve(&self, queries: Vec<RevisionQuery>) -> Result<Vec<RevisionResult>> {
        let total = queries.len();
        let permits = Arc::new(Semaphore::new(self.jobs));
        let mut join_set = JoinSet::new();

        debug!(queries = total, jobs = self.jobs, "Dispatching revision queries");

        for (idx, query) in queries.into_iter().enumerate() {
            let lister = Arc::clone(&self.lister);
            let retry = self.retry.clone();
            let permits = Arc::clone(&permits);

            join_set.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| RepoVersionError::Other(format!("worker pool closed: {}", e)))?;
                let result = resolve_query(lister.as_ref(), &retry, &query).await?;
                Ok::<(usize, RevisionResult), RepoVersionError>((idx, result))
            });
        }

        let mut ordered: Vec<Option<RevisionResult>> = vec![None; total];
        while let Some(joined) = join_set.join_next().await {
            let outcome = joined
                .map_err(|e| RepoVersionError::Other(format!("revision task join error: {}", e)))
                .and_then(|result| result);

            match outcome {
                Ok((idx, result)) => ordered[idx] = Some(result),
                Err(e) => {
                    join_set.abort_all();
                    return Err(e);
                }
            }
        }

        ordered
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| {
                    RepoVersionError::Other(format!("missing result for revision query {}", idx))
                })
            })
            .collect()
    }
}

async fn resolve_query(
    lister: &dyn RefLister,
    retry: &RetryPolicy,
    query: &RevisionQuery,
) -> Result<RevisionResult> {
    info!(
        remote = %query.remote,
        project = %query.project,
        "Fetching revision for {}/{}...",
        query.remote,
        query.project
    );

    if is_commit_id(&query.reference) {
        return Ok(RevisionResult {
            key: query.key(),
            revision: query.reference.clone(),
        });
    }

    let url = query.repository_url();
    let patterns = query.patterns();
    let operation = format!("ls-remote {} {}", url, patterns.join(" "));

    let refs = with_retry(retry, &operation, || lister.list_refs(&url, &patterns))
        .await
        .map_err(|e| RepoVersionError::Resolution {
            project: query.project.clone(),
            url: url.clone(),
            message: e.to_string(),
        })?;

    let revision = query
        .select(&refs)
        .ok_or_else(|| RepoVersionError::RefNotFound {
            project: query.project.clone(),
            url: url.clone(),
            reference: query.reference.clone(),
        })?;

    info!(project = %query.project, revision = %revision, "{}: {}", query.key(), revision);

    Ok(RevisionResult {
        key: query.key(),
        revision,
    })
}
