//! Ranking view model
//!
//! Holds the "most used", "recent" and "favorites" lists of one domain.
//! Ordering is decided by the server; the view model never re-sorts, it only
//! checks the order and logs when the server breaks it.

use crate::config::{DEFAULT_RANKING_COUNT, MAX_RANKING_COUNT};
use crate::error::{AppError, Result};
use crate::models::Domain;
use crate::services::adapter::DisplayRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// Criterion a ranking list is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankingCriterion {
    /// usage count descending, ties by last use descending
    MostUsed,
    /// last use descending, never-used entries last
    Recent,
    /// favorites only, server order
    Favorites,
}

impl RankingCriterion {
    pub const ALL: [RankingCriterion; 3] = [
        RankingCriterion::MostUsed,
        RankingCriterion::Recent,
        RankingCriterion::Favorites,
    ];

    /// Path segment of the ranking endpoint
    pub fn endpoint(self) -> &'static str {
        match self {
            RankingCriterion::MostUsed => "most-used",
            RankingCriterion::Recent => "recent",
            RankingCriterion::Favorites => "favorites",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RankingCriterion::MostUsed => "Most used",
            RankingCriterion::Recent => "Recent",
            RankingCriterion::Favorites => "Favorites",
        }
    }
}

impl fmt::Display for RankingCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

/// Number of entries requested per ranking list (positive, bounded)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingCount(u32);

impl RankingCount {
    pub fn new(count: u32) -> Result<Self> {
        if count == 0 || count > MAX_RANKING_COUNT {
            return Err(AppError::Validation(format!(
                "ranking count must be between 1 and {}, got {}",
                MAX_RANKING_COUNT, count
            )));
        }
        Ok(Self(count))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for RankingCount {
    fn default() -> Self {
        Self(DEFAULT_RANKING_COUNT)
    }
}

/// Ordered, bounded list of records for one criterion
#[derive(Debug, Clone, PartialEq)]
pub struct RankingSnapshot {
    pub criterion: RankingCriterion,
    pub items: Vec<DisplayRecord>,
}

impl RankingSnapshot {
    pub fn empty(criterion: RankingCriterion) -> Self {
        Self {
            criterion,
            items: Vec::new(),
        }
    }

    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the list respects its criterion's ordering rules
    pub fn is_well_ordered(&self) -> bool {
        // `None < Some(_)`, so never-used entries rank lowest
        self.items.windows(2).all(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            match self.criterion {
                RankingCriterion::MostUsed => {
                    a.usage_count > b.usage_count
                        || (a.usage_count == b.usage_count && a.last_used >= b.last_used)
                }
                RankingCriterion::Recent => a.last_used >= b.last_used,
                RankingCriterion::Favorites => true,
            }
        }) && (self.criterion != RankingCriterion::Favorites
            || self.items.iter().all(|r| r.is_favorite))
    }
}

/// Lifecycle of a domain's refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
    /// Every list failed; logged, then back to `Idle` with the old data
    Failed,
}

/// Everything a surface needs to render one domain
#[derive(Debug, Clone, PartialEq)]
pub struct DomainState {
    pub domain: Domain,
    pub most_used: RankingSnapshot,
    pub recent: RankingSnapshot,
    pub favorites: RankingSnapshot,
    pub loading: bool,
    pub phase: RefreshPhase,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl DomainState {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            most_used: RankingSnapshot::empty(RankingCriterion::MostUsed),
            recent: RankingSnapshot::empty(RankingCriterion::Recent),
            favorites: RankingSnapshot::empty(RankingCriterion::Favorites),
            loading: false,
            phase: RefreshPhase::Idle,
            last_refreshed_at: None,
            last_error: None,
        }
    }

    pub fn snapshot(&self, criterion: RankingCriterion) -> &RankingSnapshot {
        match criterion {
            RankingCriterion::MostUsed => &self.most_used,
            RankingCriterion::Recent => &self.recent,
            RankingCriterion::Favorites => &self.favorites,
        }
    }

    fn snapshot_mut(&mut self, criterion: RankingCriterion) -> &mut RankingSnapshot {
        match criterion {
            RankingCriterion::MostUsed => &mut self.most_used,
            RankingCriterion::Recent => &mut self.recent,
            RankingCriterion::Favorites => &mut self.favorites,
        }
    }

    /// Whether a refresh has ever succeeded for this domain
    pub fn is_loaded(&self) -> bool {
        self.last_refreshed_at.is_some()
    }

    /// Whether the lists or the error shown to a reader differ from `previous`
    pub fn differs_from(&self, previous: &DomainState) -> bool {
        self.most_used != previous.most_used
            || self.recent != previous.recent
            || self.favorites != previous.favorites
            || self.last_error != previous.last_error
            || self.is_loaded() != previous.is_loaded()
    }

    /// Fold a fetch into the state.
    ///
    /// Lists that loaded replace their snapshot wholesale; lists that failed
    /// keep the previous snapshot.
    pub fn apply(&mut self, fetch: RankingFetch, now: DateTime<Utc>) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::new(self.domain);

        for (criterion, result) in fetch.into_results() {
            match result {
                Ok(items) => {
                    let snapshot = RankingSnapshot { criterion, items };
                    if !snapshot.is_well_ordered() {
                        tracing::warn!(
                            "Server returned {} {} out of order: {:?}",
                            self.domain,
                            criterion,
                            snapshot.ids()
                        );
                    }
                    *self.snapshot_mut(criterion) = snapshot;
                    outcome.updated.push(criterion);
                }
                Err(e) => {
                    tracing::warn!(
                        "Keeping previous {} {} list after fetch failure: {}",
                        self.domain,
                        criterion,
                        e
                    );
                    outcome.failed.push((criterion, e.to_string()));
                }
            }
        }

        if !outcome.updated.is_empty() {
            self.last_refreshed_at = Some(now);
        }
        self.last_error = outcome.failed.first().map(|(_, msg)| msg.clone());

        outcome
    }
}

/// Results of fetching every ranking list of one domain
pub struct RankingFetch {
    pub most_used: Result<Vec<DisplayRecord>>,
    pub recent: Result<Vec<DisplayRecord>>,
    pub favorites: Result<Vec<DisplayRecord>>,
}

impl RankingFetch {
    fn into_results(self) -> [(RankingCriterion, Result<Vec<DisplayRecord>>); 3] {
        [
            (RankingCriterion::MostUsed, self.most_used),
            (RankingCriterion::Recent, self.recent),
            (RankingCriterion::Favorites, self.favorites),
        ]
    }
}

/// What a single refresh changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub domain: Domain,
    pub updated: Vec<RankingCriterion>,
    pub failed: Vec<(RankingCriterion, String)>,
}

impl RefreshOutcome {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            updated: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Every list loaded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// No list loaded
    pub fn all_failed(&self) -> bool {
        self.updated.is_empty() && !self.failed.is_empty()
    }
}

/// Supplier of ranked, presented records for one domain
#[async_trait]
pub trait RankingSource: Send + Sync {
    fn domain(&self) -> Domain;

    /// Fetch up to `count` records ordered by `criterion`
    async fn ranked(
        &self,
        criterion: RankingCriterion,
        count: RankingCount,
    ) -> Result<Vec<DisplayRecord>>;

    /// Record one use of a resource on the server
    async fn increment_usage(&self, id: i64) -> Result<()>;
}

/// Fetch all ranking lists of a domain concurrently
pub async fn fetch_rankings(source: &dyn RankingSource, count: RankingCount) -> RankingFetch {
    let (most_used, recent, favorites) = tokio::join!(
        source.ranked(RankingCriterion::MostUsed, count),
        source.ranked(RankingCriterion::Recent, count),
        source.ranked(RankingCriterion::Favorites, count),
    );

    RankingFetch {
        most_used,
        recent,
        favorites,
    }
}
