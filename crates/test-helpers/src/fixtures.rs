// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::ledger::LEDGER_ADDRESS;
use alloy::{
    primitives::{Address, Bytes, B256, U256},
    signers::{local::PrivateKeySigner, SignerSync},
    sol_types::{Eip712Domain, SolStruct},
};
use ct_config::{ChainProfile, Timeouts};
use ct_market::{
    marketplace_domain, AppOffer, AppOrder, DatasetOffer, DatasetOrder, MarketOrder, Offer,
    SignedOrder, WorkerpoolOffer, WorkerpoolOrder,
};

pub const CHAIN_ID: u64 = 31337;
pub const HUB: Address = Address::repeat_byte(0x4b);
pub const APP: Address = Address::repeat_byte(0xa9);
pub const WORKERPOOL: Address = Address::repeat_byte(0x3f);
pub const DATASET: Address = Address::repeat_byte(0xd5);

/// TEE tag: bit 0 set.
pub const TEE_TAG: B256 = B256::with_last_byte(1);

/// A chain profile pointing at the fixture resources, with deadlines short enough for tests.
pub fn test_profile() -> ChainProfile {
    ChainProfile {
        name: "local".to_string(),
        chain_id: CHAIN_ID,
        rpc_url: "http://127.0.0.1:8545".to_string(),
        ledger: LEDGER_ADDRESS,
        hub: HUB,
        market_api: "http://127.0.0.1:3000".to_string(),
        app: APP,
        workerpool: WORKERPOOL,
        dataset: None,
        escrow_payment: "1000".to_string(),
        timeouts: Timeouts {
            network_ms: 200,
            confirmation_ms: 200,
            settlement_ms: 500,
        },
    }
}

/// Resource owners who sign offers for the fixture app, workerpool and dataset.
pub struct OfferSigners {
    pub app_owner: PrivateKeySigner,
    pub workerpool_owner: PrivateKeySigner,
    pub dataset_owner: PrivateKeySigner,
    domain: Eip712Domain,
}

impl Default for OfferSigners {
    fn default() -> Self {
        Self::new(CHAIN_ID, HUB)
    }
}

impl OfferSigners {
    pub fn new(chain_id: u64, hub: Address) -> Self {
        Self {
            app_owner: PrivateKeySigner::random(),
            workerpool_owner: PrivateKeySigner::random(),
            dataset_owner: PrivateKeySigner::random(),
            domain: marketplace_domain(chain_id, hub),
        }
    }

    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn app_offer(&self) -> AppOffer {
        let order = AppOrder {
            app: APP,
            appprice: U256::ZERO,
            volume: U256::from(1_000u64),
            tag: TEE_TAG,
            salt: B256::repeat_byte(0x11),
            ..Default::default()
        };
        self.offer(order, &self.app_owner)
    }

    pub fn workerpool_offer(&self) -> WorkerpoolOffer {
        let order = WorkerpoolOrder {
            workerpool: WORKERPOOL,
            workerpoolprice: U256::from(100u64),
            volume: U256::from(50u64),
            tag: TEE_TAG,
            category: U256::from(2u64),
            trust: U256::ZERO,
            salt: B256::repeat_byte(0x22),
            ..Default::default()
        };
        self.offer(order, &self.workerpool_owner)
    }

    pub fn dataset_offer(&self) -> DatasetOffer {
        let order = DatasetOrder {
            dataset: DATASET,
            datasetprice: U256::ZERO,
            volume: U256::from(10u64),
            tag: TEE_TAG,
            salt: B256::repeat_byte(0x33),
            ..Default::default()
        };
        self.offer(order, &self.dataset_owner)
    }

    /// Sign `order` the way its owner would before listing it.
    pub fn offer<O: MarketOrder>(&self, order: O, owner: &PrivateKeySigner) -> Offer<O> {
        let order_hash = order.eip712_signing_hash(&self.domain);
        let sign = match owner.sign_hash_sync(&order_hash) {
            Ok(signature) => Bytes::from(signature.as_bytes()),
            Err(_) => Bytes::new(),
        };
        let remaining = Some(order.volume());
        Offer {
            signed: SignedOrder { order, sign },
            order_hash,
            signer: owner.address(),
            remaining,
        }
    }
}
