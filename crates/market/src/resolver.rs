// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{MarketError, Result};
use crate::marketplace::Marketplace;
use crate::orders::{
    marketplace_domain, AppOffer, DatasetOffer, MarketOrder, Offer, Orderbook, WorkerpoolOffer,
};
use alloy::{primitives::Address, sol_types::Eip712Domain};
use tracing::{debug, info};

/// Picks the offers a transfer is built on. Read-only: it never publishes anything.
pub struct OrderResolver<M> {
    market: M,
    domain: Eip712Domain,
}

impl<M: Marketplace> OrderResolver<M> {
    pub fn new(market: M, chain_id: u64, hub: Address) -> Self {
        Self {
            market,
            domain: marketplace_domain(chain_id, hub),
        }
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn market(&self) -> &M {
        &self.market
    }

    pub async fn fetch_app_order(&self, app: Address) -> Result<AppOffer> {
        let book = self.market.app_orderbook(app).await?;
        self.select(book, app)
    }

    pub async fn fetch_workerpool_order(&self, workerpool: Address) -> Result<WorkerpoolOffer> {
        let book = self.market.workerpool_orderbook(workerpool).await?;
        self.select(book, workerpool)
    }

    pub async fn fetch_dataset_order(&self, dataset: Address) -> Result<DatasetOffer> {
        let book = self.market.dataset_orderbook(dataset).await?;
        self.select(book, dataset)
    }

    /// Take the first listed offer and authenticate it.
    fn select<O: MarketOrder>(&self, book: Orderbook<O>, resource: Address) -> Result<Offer<O>> {
        debug!(
            "{} orderbook for {}: {} listed, {} returned",
            O::KIND,
            resource,
            book.count,
            book.offers.len()
        );
        let offer = book
            .offers
            .into_iter()
            .next()
            .ok_or(MarketError::NoOfferAvailable {
                kind: O::KIND,
                resource,
            })?;
        offer.verify(&self.domain)?;
        info!(
            "Selected {} order {} (price {}, volume {})",
            O::KIND,
            offer.order_hash,
            offer.order().price(),
            offer.order().volume()
        );
        Ok(offer)
    }
}
