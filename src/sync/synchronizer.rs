//! Per-user import loop and history queries.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{BannerType, Cutoff, User, Wish};
use crate::provider::{IdentityResolver, PageFetcher};
use crate::storage::WishStore;
use crate::sync::types::{BannerCounts, CutoffPolicy, ImportStats};

/// Number of wishes returned per banner by [`Synchronizer::get_banners`].
pub const BANNER_PREVIEW_LIMIT: u32 = 100;

/// Page size for [`Synchronizer::find_by_user_and_banner`].
pub const HISTORY_PAGE_SIZE: u32 = 10;

/// Imports a user's wish history and answers queries over it.
///
/// Holds the store mutably for its lifetime, so one synchronizer runs at a
/// time per connection. Separate processes importing the same user are
/// serialized by SQLite's write lock; the loser fails on the duplicate key
/// and writes nothing.
pub struct Synchronizer<'a, S, P> {
    store: &'a mut S,
    provider: &'a P,
    policy: CutoffPolicy,
}

impl<'a, S: WishStore, P> Synchronizer<'a, S, P> {
    /// Create a synchronizer with the default cutoff policy.
    #[must_use]
    pub fn new(store: &'a mut S, provider: &'a P) -> Self {
        Self {
            store,
            provider,
            policy: CutoffPolicy::default(),
        }
    }

    /// Use a different cutoff comparison.
    #[must_use]
    pub fn with_policy(mut self, policy: CutoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active cutoff policy.
    #[must_use]
    pub const fn policy(&self) -> CutoffPolicy {
        self.policy
    }

    /// Newest wishes for every banner, up to [`BANNER_PREVIEW_LIMIT`] each.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn get_banners(&self, user: &User) -> Result<BTreeMap<BannerType, Vec<Wish>>> {
        let mut banners = BTreeMap::new();
        for banner in BannerType::ALL {
            let wishes = self.store.find_top(user.id, banner, BANNER_PREVIEW_LIMIT)?;
            banners.insert(banner, wishes);
        }
        Ok(banners)
    }

    /// One page of a banner's history, newest first. Pages start at 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn find_by_user_and_banner(
        &self,
        user: &User,
        banner: BannerType,
        page: u32,
    ) -> Result<Vec<Wish>> {
        self.store.find_page(user.id, banner, page, HISTORY_PAGE_SIZE)
    }

    /// Remove every wish the user owns. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn delete_all(&mut self, user: &User) -> Result<usize> {
        let removed = self.store.delete_all(user.id)?;
        info!(user_id = user.id, removed, "Deleted wish history");
        Ok(removed)
    }

    /// Stored wish count for each banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn count_by_banner(&self, user: &User) -> Result<BannerCounts> {
        let mut counts = BannerCounts::default();
        for banner in BannerType::ALL {
            counts.set(banner, self.store.count(user.id, banner)?);
        }
        Ok(counts)
    }

    /// Stored wish count for one banner.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn count_by_user_and_banner(&self, user: &User, banner: BannerType) -> Result<usize> {
        self.store.count(user.id, banner)
    }
}

impl<'a, S: WishStore> Synchronizer<'a, S, ()> {
    /// A synchronizer for queries and deletes only; it cannot import.
    #[must_use]
    pub fn offline(store: &'a mut S) -> Self {
        Self::new(store, &())
    }
}

impl<S, P> Synchronizer<'_, S, P>
where
    S: WishStore,
    P: IdentityResolver + PageFetcher,
{
    /// Import every banner's new wishes for `user`.
    ///
    /// The authkey must belong to the provider account linked to `user`;
    /// otherwise nothing is fetched. All banners are fetched before anything
    /// is written, so a failure on any page leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotLinked` or `IdentityMismatch` before any fetch, provider
    /// errors from identity resolution or paging, and store errors from the
    /// cutoff read or the final insert.
    pub async fn import_all(&mut self, user: &User, authkey: &str) -> Result<ImportStats> {
        let linked = user
            .linked_uid()
            .ok_or(Error::NotLinked { user_id: user.id })?;

        let remote = self.provider.resolve_identity(authkey).await?;
        if remote.uid != linked {
            warn!(
                user_id = user.id,
                linked,
                remote = %remote.uid,
                "Authkey belongs to a different provider account"
            );
            return Err(Error::IdentityMismatch {
                linked: linked.to_string(),
                remote: remote.uid,
            });
        }

        let cutoff = self.store.find_most_recent_cutoff(user.id)?;
        info!(user_id = user.id, ?cutoff, policy = ?self.policy, "Starting import");

        let mut stats = ImportStats::default();
        let mut batch = Vec::new();
        for banner in BannerType::ALL {
            let mut wishes = self.fetch_newer_than(authkey, banner, cutoff).await?;
            wishes.reverse();
            for wish in &mut wishes {
                wish.owner_id = Some(user.id);
            }
            debug!(%banner, count = wishes.len(), "Collected new wishes");
            stats.set(banner, wishes.len());
            batch.extend(wishes);
        }

        self.store.bulk_insert(&batch)?;
        info!(user_id = user.id, total = stats.total(), "Import complete");
        Ok(stats)
    }

    /// Page through one banner, newest first, collecting records newer than
    /// `cutoff`.
    async fn fetch_newer_than(
        &self,
        authkey: &str,
        banner: BannerType,
        cutoff: Option<Cutoff>,
    ) -> Result<Vec<Wish>> {
        let mut collected = Vec::new();
        let mut seen = HashSet::new();
        let mut page = 1;

        loop {
            let records = self.provider.fetch_page(authkey, banner, page).await?;
            if records.is_empty() {
                debug!(%banner, page, "Reached end of history");
                break;
            }

            let (kept, reached) = self.policy.split_page(records, cutoff);
            // A wish drawn mid-import shifts the feed, repeating the previous
            // page's oldest records at the top of the next one.
            let before = collected.len();
            collected.extend(kept.into_iter().filter(|wish| seen.insert(wish.id)));
            debug!(%banner, page, kept = collected.len() - before, "Processed page");
            if reached {
                debug!(%banner, page, "Reached stored cutoff");
                break;
            }
            page += 1;
        }

        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RemoteIdentity;
    use crate::storage::SqliteStorage;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const DAY: i64 = 86_400_000;
    const UID: &str = "X123";

    /// Provider double serving scripted newest-first pages and recording
    /// every request.
    #[derive(Default)]
    struct ScriptedProvider {
        uid: String,
        pages: HashMap<BannerType, Vec<Vec<Wish>>>,
        fail_on: Option<(BannerType, u32)>,
        requests: Mutex<Vec<(BannerType, u32)>>,
    }

    impl ScriptedProvider {
        fn new(uid: &str) -> Self {
            Self {
                uid: uid.to_string(),
                ..Self::default()
            }
        }

        fn with_pages(mut self, banner: BannerType, pages: Vec<Vec<Wish>>) -> Self {
            self.pages.insert(banner, pages);
            self
        }

        fn failing_on(mut self, banner: BannerType, page: u32) -> Self {
            self.fail_on = Some((banner, page));
            self
        }

        fn requests(&self) -> Vec<(BannerType, u32)> {
            self.requests.lock().unwrap().clone()
        }

        fn requests_for(&self, banner: BannerType) -> Vec<u32> {
            self.requests()
                .into_iter()
                .filter(|(b, _)| *b == banner)
                .map(|(_, page)| page)
                .collect()
        }
    }

    impl IdentityResolver for ScriptedProvider {
        async fn resolve_identity(&self, authkey: &str) -> Result<RemoteIdentity> {
            if authkey == "expired" {
                return Err(Error::InvalidCredentials("authkey timeout".to_string()));
            }
            Ok(RemoteIdentity {
                uid: self.uid.clone(),
                nickname: None,
            })
        }
    }

    impl PageFetcher for ScriptedProvider {
        async fn fetch_page(&self, _authkey: &str, banner: BannerType, page: u32) -> Result<Vec<Wish>> {
            self.requests.lock().unwrap().push((banner, page));
            if self.fail_on == Some((banner, page)) {
                return Err(Error::UpstreamUnavailable("connection reset".to_string()));
            }
            let index = usize::try_from(page - 1).unwrap();
            Ok(self
                .pages
                .get(&banner)
                .and_then(|pages| pages.get(index))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn wish(id: i64, banner: BannerType, time: i64) -> Wish {
        Wish {
            id,
            banner,
            time,
            name: format!("Item {id}"),
            item_type: "Weapon".to_string(),
            rank: 3,
            owner_id: None,
        }
    }

    /// Newest-first records with ids `from..=to` descending, one second apart.
    fn feed(banner: BannerType, to: i64, from: i64) -> Vec<Wish> {
        (from..=to).rev().map(|id| wish(id, banner, id * 1000)).collect()
    }

    fn setup() -> (SqliteStorage, User) {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let user = storage.create_user("traveler@example.com", None).unwrap();
        let user = storage.link_identity(user.id, UID, Some("Aether")).unwrap();
        (storage, user)
    }

    fn stored_ids_in_insert_order(storage: &SqliteStorage, owner_id: i64) -> Vec<i64> {
        let mut stmt = storage
            .conn()
            .prepare("SELECT id FROM wishes WHERE owner_id = ?1 ORDER BY rowid")
            .unwrap();
        stmt.query_map([owner_id], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<i64>, _>>()
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_import_takes_everything() {
        let (mut storage, user) = setup();
        let banner = BannerType::CharacterEvent;
        let provider = ScriptedProvider::new(UID)
            .with_pages(banner, vec![feed(banner, 20, 11), feed(banner, 10, 1)]);

        let stats = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        assert_eq!(stats.get(banner), 20);
        assert_eq!(stats.total(), 20);
        assert_eq!(provider.requests_for(banner), vec![1, 2, 3]);
        for other in [BannerType::Novice, BannerType::Permanent, BannerType::WeaponEvent] {
            assert_eq!(provider.requests_for(other), vec![1]);
        }

        // Handed to storage oldest first.
        let ids = stored_ids_in_insert_order(&storage, user.id);
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());

        let stored = storage.find_top(user.id, banner, 100).unwrap();
        assert!(stored.iter().all(|w| w.owner_id == Some(user.id)));
    }

    #[tokio::test]
    async fn test_stops_at_page_crossing_cutoff() {
        let (mut storage, user) = setup();
        let mut existing = wish(500, BannerType::Novice, 5 * DAY);
        existing.owner_id = Some(user.id);
        storage.bulk_insert(&[existing.clone()]).unwrap();

        let banner = BannerType::Permanent;
        let provider = ScriptedProvider::new(UID)
            .with_pages(
                banner,
                vec![
                    vec![
                        wish(703, banner, 7 * DAY),
                        wish(602, banner, 6 * DAY),
                        wish(401, banner, 5 * DAY),
                        wish(400, banner, 4 * DAY),
                    ],
                    vec![wish(300, banner, 3 * DAY)],
                ],
            )
            .with_pages(BannerType::Novice, vec![vec![existing]]);

        let stats = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        assert_eq!(stats.get(banner), 2);
        assert_eq!(stats.get(BannerType::Novice), 0);
        assert_eq!(provider.requests_for(banner), vec![1]);
        assert_eq!(provider.requests_for(BannerType::Novice), vec![1]);

        let ids = storage
            .find_top(user.id, banner, 100)
            .unwrap()
            .into_iter()
            .map(|w| w.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![703, 602]);
    }

    #[tokio::test]
    async fn test_page_entirely_old_imports_nothing() {
        let (mut storage, user) = setup();
        let banner = BannerType::WeaponEvent;
        let mut existing = wish(900, banner, 9 * DAY);
        existing.owner_id = Some(user.id);
        storage.bulk_insert(&[existing]).unwrap();

        let provider = ScriptedProvider::new(UID).with_pages(
            banner,
            vec![
                vec![wish(800, banner, 8 * DAY), wish(700, banner, 7 * DAY)],
                vec![wish(600, banner, 6 * DAY)],
            ],
        );

        let stats = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        assert_eq!(stats.get(banner), 0);
        assert_eq!(provider.requests_for(banner), vec![1]);
        assert_eq!(storage.count_all(user.id).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_banner_costs_one_request() {
        let (mut storage, user) = setup();
        let provider = ScriptedProvider::new(UID);

        let stats = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        assert!(stats.is_empty());
        assert_eq!(provider.requests().len(), BannerType::ALL.len());
    }

    #[tokio::test]
    async fn test_identity_mismatch_fetches_nothing() {
        let (mut storage, user) = setup();
        let banner = BannerType::Permanent;
        let provider =
            ScriptedProvider::new("Y456").with_pages(banner, vec![feed(banner, 3, 1)]);

        let err = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::IdentityMismatch { ref linked, ref remote } if linked == UID && remote == "Y456"
        ));
        assert!(provider.requests().is_empty());
        assert_eq!(storage.count_all(user.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unlinked_user_is_refused() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let user = storage.create_user("new@example.com", None).unwrap();
        let provider = ScriptedProvider::new(UID);

        let err = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotLinked { user_id } if user_id == user.id));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_credentials_propagate() {
        let (mut storage, user) = setup();
        let provider = ScriptedProvider::new(UID);

        let err = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "expired")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidCredentials(_)));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let (mut storage, user) = setup();
        let banner = BannerType::CharacterEvent;
        let provider = ScriptedProvider::new(UID)
            .with_pages(banner, vec![feed(banner, 15, 6), feed(banner, 5, 1)]);

        let first = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();
        assert_eq!(first.total(), 15);

        let second = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();
        assert!(second.is_empty());
        assert_eq!(storage.count_all(user.id).unwrap(), 15);
    }

    #[tokio::test]
    async fn test_incremental_import_adds_only_new_records() {
        let (mut storage, user) = setup();
        let banner = BannerType::CharacterEvent;
        let before = ScriptedProvider::new(UID).with_pages(banner, vec![feed(banner, 10, 1)]);
        Synchronizer::new(&mut storage, &before)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        let after = ScriptedProvider::new(UID)
            .with_pages(banner, vec![feed(banner, 14, 5), feed(banner, 4, 1)]);
        let stats = Synchronizer::new(&mut storage, &after)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        assert_eq!(stats.get(banner), 4);
        assert_eq!(after.requests_for(banner), vec![1]);

        let ids = stored_ids_in_insert_order(&storage, user.id);
        assert_eq!(ids, (1..=14).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_short_pages_do_not_end_paging() {
        let (mut storage, user) = setup();
        let banner = BannerType::Novice;
        let provider = ScriptedProvider::new(UID)
            .with_pages(banner, vec![feed(banner, 5, 3), feed(banner, 2, 1)]);

        let stats = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        assert_eq!(stats.get(banner), 5);
        assert_eq!(provider.requests_for(banner), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_shifted_feed_repeats_are_imported_once() {
        let (mut storage, user) = setup();
        let banner = BannerType::Permanent;
        let provider = ScriptedProvider::new(UID)
            .with_pages(banner, vec![feed(banner, 7, 5), feed(banner, 5, 3)]);

        let stats = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        assert_eq!(stats.get(banner), 5);
        assert_eq!(provider.requests_for(banner), vec![1, 2, 3]);
        assert_eq!(
            stored_ids_in_insert_order(&storage, user.id),
            vec![3, 4, 5, 6, 7]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_persists_nothing() {
        let (mut storage, user) = setup();
        let provider = ScriptedProvider::new(UID)
            .with_pages(BannerType::Novice, vec![feed(BannerType::Novice, 3, 1)])
            .with_pages(
                BannerType::WeaponEvent,
                vec![feed(BannerType::WeaponEvent, 20, 11), feed(BannerType::WeaponEvent, 10, 4)],
            )
            .failing_on(BannerType::WeaponEvent, 2);

        let err = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UpstreamUnavailable(_)));
        assert_eq!(storage.count_all(user.id).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cutoff_is_shared_across_banners() {
        let (mut storage, user) = setup();
        let mut existing = wish(1, BannerType::Permanent, 5 * DAY);
        existing.owner_id = Some(user.id);
        storage.bulk_insert(&[existing]).unwrap();

        // Weapon records older than the newest permanent record are treated
        // as already imported.
        let provider = ScriptedProvider::new(UID)
            .with_pages(
                BannerType::Novice,
                vec![vec![wish(90, BannerType::Novice, 9 * DAY)]],
            )
            .with_pages(
                BannerType::WeaponEvent,
                vec![vec![
                    wish(80, BannerType::WeaponEvent, 8 * DAY),
                    wish(30, BannerType::WeaponEvent, 3 * DAY),
                ]],
            );

        let stats = Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        assert_eq!(stats.get(BannerType::Novice), 1);
        assert_eq!(stats.get(BannerType::WeaponEvent), 1);
        assert_eq!(provider.requests_for(BannerType::WeaponEvent), vec![1]);
    }

    #[tokio::test]
    async fn test_strict_policy_keeps_same_instant_records() {
        let banner = BannerType::Permanent;
        let remote = vec![
            wish(12, banner, 6 * DAY),
            wish(11, banner, 5 * DAY),
            wish(10, banner, 5 * DAY),
        ];

        for (policy, expected) in [
            (CutoffPolicy::Timestamp, 1),
            (CutoffPolicy::TimestampAndId, 2),
        ] {
            let (mut storage, user) = setup();
            let mut existing = wish(10, banner, 5 * DAY);
            existing.owner_id = Some(user.id);
            storage.bulk_insert(&[existing]).unwrap();

            let provider = ScriptedProvider::new(UID).with_pages(banner, vec![remote.clone()]);
            let stats = Synchronizer::new(&mut storage, &provider)
                .with_policy(policy)
                .import_all(&user, "KEY")
                .await
                .unwrap();

            assert_eq!(stats.get(banner), expected, "{policy:?}");
        }
    }

    #[tokio::test]
    async fn test_queries_over_imported_history() {
        let (mut storage, user) = setup();
        let banner = BannerType::CharacterEvent;
        let pages = (0..6)
            .map(|i| feed(banner, 120 - i * 20, 101 - i * 20))
            .collect::<Vec<_>>();
        let provider = ScriptedProvider::new(UID)
            .with_pages(banner, pages)
            .with_pages(BannerType::Permanent, vec![feed(BannerType::Permanent, 1003, 1001)]);

        Synchronizer::new(&mut storage, &provider)
            .import_all(&user, "KEY")
            .await
            .unwrap();

        let mut sync = Synchronizer::offline(&mut storage);

        let banners = sync.get_banners(&user).unwrap();
        assert_eq!(banners.len(), BannerType::ALL.len());
        assert_eq!(banners[&banner].len(), 100);
        assert_eq!(banners[&banner][0].id, 120);
        assert_eq!(banners[&BannerType::Permanent].len(), 3);
        assert!(banners[&BannerType::Novice].is_empty());

        let page = sync.find_by_user_and_banner(&user, banner, 1).unwrap();
        assert_eq!(
            page.iter().map(|w| w.id).collect::<Vec<_>>(),
            (101..=110).rev().collect::<Vec<_>>()
        );
        assert!(sync.find_by_user_and_banner(&user, banner, 12).unwrap().is_empty());

        let counts = sync.count_by_banner(&user).unwrap();
        assert_eq!(counts.get(banner), 120);
        assert_eq!(counts.get(BannerType::Permanent), 3);
        assert_eq!(counts.total(), 123);
        assert_eq!(sync.count_by_user_and_banner(&user, banner).unwrap(), 120);

        assert_eq!(sync.delete_all(&user).unwrap(), 123);
        assert!(sync.count_by_banner(&user).unwrap().is_empty());
    }
}
