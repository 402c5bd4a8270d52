// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! JSON shapes of the marketplace api. Numeric fields arrive as JSON numbers or as decimal /
//! hex strings depending on the endpoint; all of them are normalized to `U256` here.

use crate::orders::{
    AppOrder, DatasetOrder, Offer, Orderbook, SignedOrder, SignedRequestOrder, WorkerpoolOrder,
};
use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{de, Deserialize, Deserializer};
use serde_json::{json, Value};
use std::str::FromStr;

pub(crate) fn lenient_u256<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => U256::from_str(s.trim()).map_err(de::Error::custom),
        Value::Number(n) if n.is_u64() => Ok(U256::from(n.as_u64().unwrap_or_default())),
        Value::Number(n) => U256::from_str(&n.to_string()).map_err(de::Error::custom),
        other => Err(de::Error::custom(format!(
            "expected an integer or integer string, got {other}"
        ))),
    }
}

fn lenient_u256_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<U256>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "lenient_u256")] U256);

    Ok(Option::<Wrapper>::deserialize(d)?.map(|Wrapper(v)| v))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiOrderbook<T> {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub count: u64,
    #[serde(default = "Vec::new")]
    pub orders: Vec<ApiEntry<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiEntry<T> {
    pub order: T,
    #[serde(default)]
    pub order_hash: B256,
    pub signer: Address,
    #[serde(default, deserialize_with = "lenient_u256_opt")]
    pub remaining: Option<U256>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAppOrder {
    pub app: Address,
    #[serde(deserialize_with = "lenient_u256")]
    pub appprice: U256,
    #[serde(deserialize_with = "lenient_u256")]
    pub volume: U256,
    pub tag: B256,
    pub datasetrestrict: Address,
    pub workerpoolrestrict: Address,
    pub requesterrestrict: Address,
    pub salt: B256,
    pub sign: Bytes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiWorkerpoolOrder {
    pub workerpool: Address,
    #[serde(deserialize_with = "lenient_u256")]
    pub workerpoolprice: U256,
    #[serde(deserialize_with = "lenient_u256")]
    pub volume: U256,
    pub tag: B256,
    #[serde(deserialize_with = "lenient_u256")]
    pub category: U256,
    #[serde(deserialize_with = "lenient_u256")]
    pub trust: U256,
    pub apprestrict: Address,
    pub datasetrestrict: Address,
    pub requesterrestrict: Address,
    pub salt: B256,
    pub sign: Bytes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiDatasetOrder {
    pub dataset: Address,
    #[serde(deserialize_with = "lenient_u256")]
    pub datasetprice: U256,
    #[serde(deserialize_with = "lenient_u256")]
    pub volume: U256,
    pub tag: B256,
    pub apprestrict: Address,
    pub workerpoolrestrict: Address,
    pub requesterrestrict: Address,
    pub salt: B256,
    pub sign: Bytes,
}

impl From<ApiAppOrder> for SignedOrder<AppOrder> {
    fn from(o: ApiAppOrder) -> Self {
        SignedOrder {
            order: AppOrder {
                app: o.app,
                appprice: o.appprice,
                volume: o.volume,
                tag: o.tag,
                datasetrestrict: o.datasetrestrict,
                workerpoolrestrict: o.workerpoolrestrict,
                requesterrestrict: o.requesterrestrict,
                salt: o.salt,
            },
            sign: o.sign,
        }
    }
}

impl From<ApiWorkerpoolOrder> for SignedOrder<WorkerpoolOrder> {
    fn from(o: ApiWorkerpoolOrder) -> Self {
        SignedOrder {
            order: WorkerpoolOrder {
                workerpool: o.workerpool,
                workerpoolprice: o.workerpoolprice,
                volume: o.volume,
                tag: o.tag,
                category: o.category,
                trust: o.trust,
                apprestrict: o.apprestrict,
                datasetrestrict: o.datasetrestrict,
                requesterrestrict: o.requesterrestrict,
                salt: o.salt,
            },
            sign: o.sign,
        }
    }
}

impl From<ApiDatasetOrder> for SignedOrder<DatasetOrder> {
    fn from(o: ApiDatasetOrder) -> Self {
        SignedOrder {
            order: DatasetOrder {
                dataset: o.dataset,
                datasetprice: o.datasetprice,
                volume: o.volume,
                tag: o.tag,
                apprestrict: o.apprestrict,
                workerpoolrestrict: o.workerpoolrestrict,
                requesterrestrict: o.requesterrestrict,
                salt: o.salt,
            },
            sign: o.sign,
        }
    }
}

impl<T> ApiOrderbook<T> {
    pub fn into_orderbook<O>(self) -> Orderbook<O>
    where
        T: Into<SignedOrder<O>>,
    {
        let offers = self
            .orders
            .into_iter()
            .map(|entry| Offer {
                signed: entry.order.into(),
                order_hash: entry.order_hash,
                signer: entry.signer,
                remaining: entry.remaining,
            })
            .collect::<Vec<_>>();
        Orderbook {
            count: self.count.max(offers.len() as u64),
            offers,
        }
    }
}

/// `GET /challenge` answer. `data` is EIP-712 typed data.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiChallenge {
    #[serde(default)]
    pub ok: Option<bool>,
    pub data: Value,
}

/// `POST /requestorders` answer.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiPublished {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub published: Option<ApiPublishedOrder>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPublishedOrder {
    pub order_hash: B256,
}

/// Body of `POST /requestorders`. Integers go out as decimal strings.
pub(crate) fn request_order_body(chain_id: u64, signed: &SignedRequestOrder) -> Value {
    let o = &signed.order;
    json!({
        "chainId": chain_id,
        "order": {
            "app": o.app.to_string(),
            "appmaxprice": o.appmaxprice.to_string(),
            "dataset": o.dataset.to_string(),
            "datasetmaxprice": o.datasetmaxprice.to_string(),
            "workerpool": o.workerpool.to_string(),
            "workerpoolmaxprice": o.workerpoolmaxprice.to_string(),
            "requester": o.requester.to_string(),
            "volume": o.volume.to_string(),
            "tag": o.tag.to_string(),
            "category": o.category.to_string(),
            "trust": o.trust.to_string(),
            "beneficiary": o.beneficiary.to_string(),
            "callback": o.callback.to_string(),
            "params": o.params,
            "salt": o.salt.to_string(),
            "sign": signed.sign.to_string(),
        }
    })
}
