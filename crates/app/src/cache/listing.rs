use std::marker::PhantomData;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;
use uuid::Uuid;

use arbor_core::domain::listing::{ListQuery, Listing, SortField};
use arbor_core::error::CacheError;

use crate::cache::client::CacheClient;
use crate::cache::keys::{self, ListingScope};

/// Outcome of a listing lookup.
#[derive(Debug)]
pub enum ListingLookup<T> {
    Hit(Listing<T>),
    /// `fill` is the key a fresh page should be stored under. `None` when the
    /// cache could not be reached, in which case repopulating is pointless.
    Miss { fill: Option<String> },
}

/// Cache-aside wrapper for paged listings.
///
/// Each scope has a generation token stored under its own key, and every page
/// key embeds the token. Replacing the token orphans every page of the scope
/// at once; orphaned pages age out through their TTL.
pub struct ListingCache<T> {
    client: CacheClient,
    ttl: Duration,
    _items: PhantomData<fn() -> T>,
}

impl<T> Clone for ListingCache<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            ttl: self.ttl,
            _items: PhantomData,
        }
    }
}

impl<T> ListingCache<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(client: CacheClient, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            _items: PhantomData,
        }
    }

    pub async fn get<S: SortField>(
        &self,
        scope: ListingScope,
        query: &ListQuery<S>,
    ) -> ListingLookup<T> {
        match self.lookup(scope, query).await {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!(error = %err, %scope, "listing cache read failed");
                ListingLookup::Miss { fill: None }
            }
        }
    }

    async fn lookup<S: SortField>(
        &self,
        scope: ListingScope,
        query: &ListQuery<S>,
    ) -> Result<ListingLookup<T>, CacheError> {
        let generation_key = keys::listing_generation(scope);
        let generation = match self.client.get_raw(&generation_key).await? {
            Some(generation) => generation,
            None => {
                // Nothing can be cached under a scope without a token yet.
                let generation = Uuid::new_v4().simple().to_string();
                self.client
                    .set_raw(&generation_key, generation.clone(), Some(self.generation_ttl()))
                    .await?;
                return Ok(ListingLookup::Miss {
                    fill: Some(keys::listing_page(scope, &generation, query)),
                });
            }
        };
        let key = keys::listing_page(scope, &generation, query);
        Ok(match self.client.get_json(&key).await? {
            Some(listing) => ListingLookup::Hit(listing),
            None => ListingLookup::Miss { fill: Some(key) },
        })
    }

    /// Stores a page under the key handed out by a previous miss.
    pub async fn set(&self, fill: &str, listing: &Listing<T>) {
        if let Err(err) = self.client.set_json(fill, listing, Some(self.ttl)).await {
            warn!(error = %err, key = fill, "listing cache write failed");
        }
    }

    /// Makes every cached page of `scope` unreachable.
    pub async fn invalidate_scope(&self, scope: ListingScope) -> Result<(), CacheError> {
        let generation = Uuid::new_v4().simple().to_string();
        self.client
            .set_raw(
                &keys::listing_generation(scope),
                generation,
                Some(self.generation_ttl()),
            )
            .await
    }

    /// Tokens outlive the pages filled under them. An expired token is
    /// re-minted on the next lookup, which only costs a miss.
    fn generation_ttl(&self) -> Duration {
        self.ttl.saturating_mul(2)
    }
}
