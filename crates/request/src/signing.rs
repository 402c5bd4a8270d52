// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{RequestError, Result};
use alloy::{
    primitives::{Address, Bytes},
    signers::Signer,
    sol_types::{Eip712Domain, SolStruct},
};
use ct_market::{RequestOrder, SignedRequestOrder};
use tracing::debug;

/// Sign a request order as its requester.
///
/// Fails with [`RequestError::Signing`] when `signer` is not the requester named in the order;
/// such an order would be rejected by the marketplace anyway.
pub async fn sign_request_order<S>(
    order: RequestOrder,
    signer: &S,
    domain: &Eip712Domain,
) -> Result<SignedRequestOrder>
where
    S: Signer + Send + Sync + ?Sized,
{
    if signer.address() != order.requester {
        return Err(RequestError::Signing {
            signer: signer.address(),
            requester: order.requester,
        });
    }

    let hash = order.eip712_signing_hash(domain);
    let signature = signer
        .sign_hash(&hash)
        .await
        .map_err(|e| RequestError::Signer(e.to_string()))?;
    debug!("Signed request order {hash}");

    Ok(SignedRequestOrder {
        order,
        sign: Bytes::from(signature.as_bytes()),
    })
}

/// Check that the signature on a request order recovers its requester.
pub fn verify_request_order(signed: &SignedRequestOrder, domain: &Eip712Domain) -> Result<Address> {
    let recovered = signed
        .recover_signer(domain)
        .map_err(RequestError::InvalidSignature)?;
    if recovered != signed.order.requester {
        return Err(RequestError::InvalidSignature(format!(
            "recovered {recovered}, requester is {}",
            signed.order.requester
        )));
    }
    Ok(recovered)
}
