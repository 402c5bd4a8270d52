// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{MarketError, Result};
use alloy::{
    primitives::{Address, Bytes, Signature, B256, U256},
    sol,
    sol_types::{eip712_domain, Eip712Domain, SolStruct},
};
use std::fmt;

pub const DOMAIN_NAME: &str = "iExecODB";
pub const DOMAIN_VERSION: &str = "5.0.0";

/// The EIP-712 domain every marketplace order on `chain_id` is signed under.
pub fn marketplace_domain(chain_id: u64, hub: Address) -> Eip712Domain {
    eip712_domain! {
        name: DOMAIN_NAME,
        version: DOMAIN_VERSION,
        chain_id: chain_id,
        verifying_contract: hub,
    }
}

sol! {
    #[derive(Debug, Default, PartialEq, Eq)]
    struct AppOrder {
        address app;
        uint256 appprice;
        uint256 volume;
        bytes32 tag;
        address datasetrestrict;
        address workerpoolrestrict;
        address requesterrestrict;
        bytes32 salt;
    }

    #[derive(Debug, Default, PartialEq, Eq)]
    struct DatasetOrder {
        address dataset;
        uint256 datasetprice;
        uint256 volume;
        bytes32 tag;
        address apprestrict;
        address workerpoolrestrict;
        address requesterrestrict;
        bytes32 salt;
    }

    #[derive(Debug, Default, PartialEq, Eq)]
    struct WorkerpoolOrder {
        address workerpool;
        uint256 workerpoolprice;
        uint256 volume;
        bytes32 tag;
        uint256 category;
        uint256 trust;
        address apprestrict;
        address datasetrestrict;
        address requesterrestrict;
        bytes32 salt;
    }

    #[derive(Debug, Default, PartialEq, Eq)]
    struct RequestOrder {
        address app;
        uint256 appmaxprice;
        address dataset;
        uint256 datasetmaxprice;
        address workerpool;
        uint256 workerpoolmaxprice;
        address requester;
        uint256 volume;
        bytes32 tag;
        uint256 category;
        uint256 trust;
        address beneficiary;
        address callback;
        string params;
        bytes32 salt;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderKind {
    App,
    Workerpool,
    Dataset,
    Request,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderKind::App => "app",
            OrderKind::Workerpool => "workerpool",
            OrderKind::Dataset => "dataset",
            OrderKind::Request => "request",
        })
    }
}

/// A resource offer that can be listed in an orderbook.
pub trait MarketOrder: SolStruct + Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: OrderKind;

    /// The app, workerpool or dataset this offer sells.
    fn resource(&self) -> Address;
    fn price(&self) -> U256;
    fn volume(&self) -> U256;
}

impl MarketOrder for AppOrder {
    const KIND: OrderKind = OrderKind::App;

    fn resource(&self) -> Address {
        self.app
    }

    fn price(&self) -> U256 {
        self.appprice
    }

    fn volume(&self) -> U256 {
        self.volume
    }
}

impl MarketOrder for WorkerpoolOrder {
    const KIND: OrderKind = OrderKind::Workerpool;

    fn resource(&self) -> Address {
        self.workerpool
    }

    fn price(&self) -> U256 {
        self.workerpoolprice
    }

    fn volume(&self) -> U256 {
        self.volume
    }
}

impl MarketOrder for DatasetOrder {
    const KIND: OrderKind = OrderKind::Dataset;

    fn resource(&self) -> Address {
        self.dataset
    }

    fn price(&self) -> U256 {
        self.datasetprice
    }

    fn volume(&self) -> U256 {
        self.volume
    }
}

/// An order together with its EIP-712 signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder<O> {
    pub order: O,
    pub sign: Bytes,
}

impl<O: SolStruct> SignedOrder<O> {
    pub fn hash(&self, domain: &Eip712Domain) -> B256 {
        self.order.eip712_signing_hash(domain)
    }

    /// The address whose key produced `sign` over this order.
    pub fn recover_signer(&self, domain: &Eip712Domain) -> std::result::Result<Address, String> {
        let signature = Signature::try_from(self.sign.as_ref()).map_err(|e| e.to_string())?;
        signature
            .recover_address_from_prehash(&self.hash(domain))
            .map_err(|e| e.to_string())
    }
}

pub type SignedRequestOrder = SignedOrder<RequestOrder>;

/// One entry of an orderbook as published by the marketplace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer<O> {
    pub signed: SignedOrder<O>,
    /// The hash the marketplace indexed this order under
    pub order_hash: B256,
    /// The account the marketplace says signed the order
    pub signer: Address,
    /// Volume left to consume, when the marketplace reports it
    pub remaining: Option<U256>,
}

pub type AppOffer = Offer<AppOrder>;
pub type WorkerpoolOffer = Offer<WorkerpoolOrder>;
pub type DatasetOffer = Offer<DatasetOrder>;

impl<O: MarketOrder> Offer<O> {
    pub fn order(&self) -> &O {
        &self.signed.order
    }

    pub fn sign(&self) -> &Bytes {
        &self.signed.sign
    }

    /// Check an offer before anything is built on it: it must still have volume and its
    /// signature must recover the published signer.
    pub fn verify(&self, domain: &Eip712Domain) -> Result<()> {
        let reject = |reason: String| MarketError::InvalidOffer {
            kind: O::KIND,
            resource: self.order().resource(),
            reason,
        };

        if self.order().volume().is_zero() {
            return Err(reject("volume is zero".to_string()));
        }
        if self.remaining.is_some_and(|r| r.is_zero()) {
            return Err(reject("no remaining volume".to_string()));
        }

        let hash = self.signed.hash(domain);
        if !self.order_hash.is_zero() && self.order_hash != hash {
            return Err(reject(format!(
                "listed as {} but hashes to {}",
                self.order_hash, hash
            )));
        }

        let recovered = self
            .signed
            .recover_signer(domain)
            .map_err(|e| reject(format!("bad signature: {e}")))?;
        if recovered != self.signer {
            return Err(reject(format!(
                "signed by {recovered}, listed as signed by {}",
                self.signer
            )));
        }
        Ok(())
    }
}

/// One page of offers for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orderbook<O> {
    /// Total number of open offers the marketplace reports
    pub count: u64,
    pub offers: Vec<Offer<O>>,
}

impl<O> Orderbook<O> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            offers: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn first(&self) -> Option<&Offer<O>> {
        self.offers.first()
    }
}
