// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, Address, B256};
use async_trait::async_trait;
use ct_market::{
    AppOffer, AppOrder, DatasetOffer, DatasetOrder, MarketError, Marketplace, Offer, Orderbook,
    Result, SignedRequestOrder, WorkerpoolOffer, WorkerpoolOrder,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

#[derive(Default)]
struct State {
    apps: HashMap<Address, Vec<AppOffer>>,
    workerpools: HashMap<Address, Vec<WorkerpoolOffer>>,
    datasets: HashMap<Address, Vec<DatasetOffer>>,
    published: Vec<SignedRequestOrder>,
    failure: Option<MarketError>,
    delay: Option<Duration>,
    queries: usize,
}

/// A marketplace that answers from fixed orderbooks and records what it is sent.
#[derive(Clone, Default)]
pub struct ScriptedMarketplace {
    state: Arc<Mutex<State>>,
}

impl ScriptedMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn list_app(&self, offer: AppOffer) -> &Self {
        let app = offer.order().app;
        self.state().apps.entry(app).or_default().push(offer);
        self
    }

    pub fn list_workerpool(&self, offer: WorkerpoolOffer) -> &Self {
        let workerpool = offer.order().workerpool;
        self.state()
            .workerpools
            .entry(workerpool)
            .or_default()
            .push(offer);
        self
    }

    pub fn list_dataset(&self, offer: DatasetOffer) -> &Self {
        let dataset = offer.order().dataset;
        self.state()
            .datasets
            .entry(dataset)
            .or_default()
            .push(offer);
        self
    }

    /// Every call fails with `error` from now on.
    pub fn fail_with(&self, error: MarketError) {
        self.state().failure = Some(error);
    }

    /// Every call takes `delay` before answering.
    pub fn delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    pub fn published(&self) -> Vec<SignedRequestOrder> {
        self.state().published.clone()
    }

    /// Orderbook queries answered so far.
    pub fn queries(&self) -> usize {
        self.state().queries
    }

    async fn enter(&self) -> Result<()> {
        let (delay, failure) = {
            let mut state = self.state();
            state.queries += 1;
            (state.delay, state.failure.clone())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn book<O: Clone>(offers: Option<&Vec<Offer<O>>>) -> Orderbook<O> {
    let offers = offers.cloned().unwrap_or_default();
    Orderbook {
        count: offers.len() as u64,
        offers,
    }
}

#[async_trait]
impl Marketplace for ScriptedMarketplace {
    async fn app_orderbook(&self, app: Address) -> Result<Orderbook<AppOrder>> {
        self.enter().await?;
        Ok(book(self.state().apps.get(&app)))
    }

    async fn workerpool_orderbook(
        &self,
        workerpool: Address,
    ) -> Result<Orderbook<WorkerpoolOrder>> {
        self.enter().await?;
        Ok(book(self.state().workerpools.get(&workerpool)))
    }

    async fn dataset_orderbook(&self, dataset: Address) -> Result<Orderbook<DatasetOrder>> {
        self.enter().await?;
        Ok(book(self.state().datasets.get(&dataset)))
    }

    async fn publish_request_order(&self, order: &SignedRequestOrder) -> Result<B256> {
        self.enter().await?;
        self.state().published.push(order.clone());
        Ok(keccak256(&order.sign))
    }
}
