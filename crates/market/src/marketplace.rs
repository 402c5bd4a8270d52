// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{MarketError, Result};
use crate::orders::{
    AppOrder, DatasetOrder, Orderbook, SignedOrder, SignedRequestOrder, WorkerpoolOrder,
};
use crate::wire::{
    request_order_body, ApiAppOrder, ApiChallenge, ApiDatasetOrder, ApiOrderbook, ApiPublished,
    ApiWorkerpoolOrder,
};
use alloy::{
    primitives::{Address, Bytes, B256},
    signers::{local::PrivateKeySigner, Signer},
};
use alloy_dyn_abi::TypedData;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// The orderbook service compute resources are bought from.
#[async_trait]
pub trait Marketplace: Send + Sync {
    async fn app_orderbook(&self, app: Address) -> Result<Orderbook<AppOrder>>;

    async fn workerpool_orderbook(
        &self,
        workerpool: Address,
    ) -> Result<Orderbook<WorkerpoolOrder>>;

    async fn dataset_orderbook(&self, dataset: Address) -> Result<Orderbook<DatasetOrder>>;

    /// Publish a signed request order so a workerpool can match it. Returns the order hash.
    async fn publish_request_order(&self, order: &SignedRequestOrder) -> Result<B256>;
}

/// Marketplace reached over its public REST api.
#[derive(Clone)]
pub struct HttpMarketplace {
    client: reqwest::Client,
    base: Url,
    chain_id: u64,
    signer: Option<PrivateKeySigner>,
}

impl HttpMarketplace {
    pub fn new(base: Url, chain_id: u64, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MarketError::Network(e.to_string()))?;

        // Url::join drops the last path segment unless it ends with a slash
        let mut base = base;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client,
            base,
            chain_id,
            signer: None,
        })
    }

    /// Sign challenges for publishing with this key.
    pub fn with_signer(mut self, signer: PrivateKeySigner) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| MarketError::Network(format!("bad marketplace url: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self.client.get(url.clone()).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        if !status.is_success() {
            return Err(MarketError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        serde_json::from_str(&body).map_err(|e| MarketError::Decode(e.to_string()))
    }

    async fn orderbook<W, O>(
        &self,
        path: &str,
        resource_key: &str,
        resource: Address,
    ) -> Result<Orderbook<O>>
    where
        W: DeserializeOwned + Into<SignedOrder<O>> + Send,
        O: Send,
    {
        let raw: ApiOrderbook<W> = self
            .get_json(
                path,
                &[
                    ("chainId", self.chain_id.to_string()),
                    (resource_key, resource.to_string()),
                ],
            )
            .await?;
        if raw.ok == Some(false) {
            return Err(MarketError::Api {
                status: 200,
                message: format!("{path} answered ok=false"),
            });
        }
        let book = raw.into_orderbook();
        debug!("{} lists {} offers for {}", path, book.count, resource);
        Ok(book)
    }

    /// Authorization header value: `<typed data hash>_<signature>_<address>`.
    async fn authorization(&self) -> Result<String> {
        let signer = self.signer.as_ref().ok_or(MarketError::MissingSigner)?;
        let address = signer.address();
        let challenge: ApiChallenge = self
            .get_json(
                "challenge",
                &[
                    ("chainId", self.chain_id.to_string()),
                    ("address", address.to_string()),
                ],
            )
            .await?;
        if challenge.ok == Some(false) {
            return Err(MarketError::Challenge("challenge request refused".to_string()));
        }

        let typed: TypedData = serde_json::from_value(challenge.data)
            .map_err(|e| MarketError::Challenge(e.to_string()))?;
        let hash = typed
            .eip712_signing_hash()
            .map_err(|e| MarketError::Challenge(e.to_string()))?;
        let signature = signer
            .sign_hash(&hash)
            .await
            .map_err(|e| MarketError::Challenge(e.to_string()))?;

        Ok(format!(
            "{}_{}_{}",
            hash,
            Bytes::from(signature.as_bytes()),
            address
        ))
    }
}

#[async_trait]
impl Marketplace for HttpMarketplace {
    async fn app_orderbook(&self, app: Address) -> Result<Orderbook<AppOrder>> {
        self.orderbook::<ApiAppOrder, _>("apporders", "app", app).await
    }

    async fn workerpool_orderbook(
        &self,
        workerpool: Address,
    ) -> Result<Orderbook<WorkerpoolOrder>> {
        self.orderbook::<ApiWorkerpoolOrder, _>("workerpoolorders", "workerpool", workerpool)
            .await
    }

    async fn dataset_orderbook(&self, dataset: Address) -> Result<Orderbook<DatasetOrder>> {
        self.orderbook::<ApiDatasetOrder, _>("datasetorders", "dataset", dataset)
            .await
    }

    async fn publish_request_order(&self, order: &SignedRequestOrder) -> Result<B256> {
        let authorization = self.authorization().await?;
        let url = self.endpoint("requestorders")?;
        let body = request_order_body(self.chain_id, order);

        let response = self
            .client
            .post(url)
            .query(&[("chainId", self.chain_id.to_string())])
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(MarketError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let published: ApiPublished =
            serde_json::from_str(&text).map_err(|e| MarketError::Decode(e.to_string()))?;
        match (published.ok, published.published) {
            (Some(false), _) | (_, None) => Err(MarketError::Api {
                status: status.as_u16(),
                message: published
                    .error
                    .unwrap_or_else(|| "request order was not published".to_string()),
            }),
            (_, Some(p)) => {
                info!("Published request order {}", p.order_hash);
                Ok(p.order_hash)
            }
        }
    }
}
