use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::info;
use yoviajo_core::ListingFilter;
use yoviajo_shared::{ListingRefreshedEvent, SessionEvent};

use crate::api::ApiClient;
use crate::dispatcher::Reload;
use crate::listing::{announce, ListingFetcher, Listings};
use crate::view::{marketplace_cards, CardView};

/// The public marketplace: every ride, request and match the viewer can see.
pub struct Dashboard {
    api: ApiClient,
    fetcher: ListingFetcher,
    listings: RwLock<Listings>,
    events: broadcast::Sender<ListingRefreshedEvent>,
}

impl Dashboard {
    pub fn new(api: ApiClient) -> Self {
        let (events, _) = broadcast::channel(16);
        let fetcher = ListingFetcher::new(api.clone());
        Self { api, fetcher, listings: RwLock::new(Listings::default()), events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListingRefreshedEvent> {
        self.events.subscribe()
    }

    pub async fn listings(&self) -> Listings {
        self.listings.read().await.clone()
    }

    pub async fn cards(&self, filter: &ListingFilter, now: DateTime<Utc>) -> Vec<CardView> {
        let viewer = self.api.session().viewer().await;
        let listings = self.listings.read().await.filtered(filter);
        marketplace_cards(&listings, &viewer, now)
    }

    /// Reload whenever the session logs in or out, until the handle is aborted.
    pub fn follow_session(self: &Arc<Self>) -> JoinHandle<()> {
        let dashboard = Arc::clone(self);
        let mut session_events = self.api.session().subscribe();

        tokio::spawn(async move {
            loop {
                match session_events.recv().await {
                    Ok(SessionEvent::LoggedIn { user_id, .. }) => {
                        info!("Identity changed to user {}, reloading dashboard", user_id);
                        dashboard.reload().await;
                    }
                    Ok(SessionEvent::LoggedOut { .. }) => {
                        info!("Logged out, reloading dashboard");
                        dashboard.reload().await;
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        dashboard.reload().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[async_trait]
impl Reload for Dashboard {
    async fn reload(&self) -> ListingRefreshedEvent {
        let fresh = self.fetcher.marketplace().await;
        let counts = fresh.counts();
        *self.listings.write().await = fresh;
        announce(&self.events, counts)
    }
}
