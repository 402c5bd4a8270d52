// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::payload::TransferPayload;
use alloy::primitives::{Address, B256, U256};
use ct_market::{AppOffer, DatasetOffer, RequestOrder, WorkerpoolOffer};

/// Builds the request order that buys one TEE execution of a transfer.
///
/// Prices, tag, category and trust are taken from the offers as listed; the request asks for
/// exactly one execution and names the ledger as both beneficiary and callback so the result
/// is written back on chain.
pub struct RequestOrderBuilder<'a> {
    app: &'a AppOffer,
    workerpool: &'a WorkerpoolOffer,
    dataset: Option<&'a DatasetOffer>,
    requester: Address,
    ledger: Address,
    salt: Option<B256>,
}

impl<'a> RequestOrderBuilder<'a> {
    pub fn new(
        app: &'a AppOffer,
        workerpool: &'a WorkerpoolOffer,
        requester: Address,
        ledger: Address,
    ) -> Self {
        Self {
            app,
            workerpool,
            dataset: None,
            requester,
            ledger,
            salt: None,
        }
    }

    pub fn dataset(mut self, dataset: Option<&'a DatasetOffer>) -> Self {
        self.dataset = dataset;
        self
    }

    /// Fix the salt instead of drawing a random one.
    pub fn salt(mut self, salt: B256) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn build(self, payload: &TransferPayload) -> RequestOrder {
        let app = self.app.order();
        let workerpool = self.workerpool.order();
        let (dataset, datasetmaxprice) = self
            .dataset
            .map(|d| (d.order().dataset, d.order().datasetprice))
            .unwrap_or((Address::ZERO, U256::ZERO));

        RequestOrder {
            app: app.app,
            appmaxprice: app.appprice,
            dataset,
            datasetmaxprice,
            workerpool: workerpool.workerpool,
            workerpoolmaxprice: workerpool.workerpoolprice,
            requester: self.requester,
            volume: U256::from(1u64),
            tag: app.tag,
            category: workerpool.category,
            trust: workerpool.trust,
            beneficiary: self.ledger,
            callback: self.ledger,
            params: payload.to_string(),
            salt: self
                .salt
                .unwrap_or_else(|| B256::from(rand::random::<[u8; 32]>())),
        }
    }
}

/// Shorthand for [`RequestOrderBuilder`] without a dataset and with a random salt.
pub fn build_request_order(
    app: &AppOffer,
    workerpool: &WorkerpoolOffer,
    requester: Address,
    ledger: Address,
    payload: &TransferPayload,
) -> RequestOrder {
    RequestOrderBuilder::new(app, workerpool, requester, ledger).build(payload)
}
