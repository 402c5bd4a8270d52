// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use ct_ledger::{AppOrder, DatasetOrder, WorkerpoolOrder};
use ct_market::{AppOffer, DatasetOffer, WorkerpoolOffer};

/// Marketplace offers in the tuple layout `storeOrders` takes.
pub fn ledger_app_order(offer: &AppOffer) -> AppOrder {
    let o = offer.order();
    AppOrder {
        app: o.app,
        appprice: o.appprice,
        volume: o.volume,
        tag: o.tag,
        datasetrestrict: o.datasetrestrict,
        workerpoolrestrict: o.workerpoolrestrict,
        requesterrestrict: o.requesterrestrict,
        salt: o.salt,
        sign: offer.sign().clone(),
    }
}

pub fn ledger_workerpool_order(offer: &WorkerpoolOffer) -> WorkerpoolOrder {
    let o = offer.order();
    WorkerpoolOrder {
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
        sign: offer.sign().clone(),
    }
}

/// `None` stores the all-zero dataset order.
pub fn ledger_dataset_order(offer: Option<&DatasetOffer>) -> DatasetOrder {
    let Some(offer) = offer else {
        return DatasetOrder::empty();
    };
    let o = offer.order();
    DatasetOrder {
        dataset: o.dataset,
        datasetprice: o.datasetprice,
        volume: o.volume,
        tag: o.tag,
        apprestrict: o.apprestrict,
        workerpoolrestrict: o.workerpoolrestrict,
        requesterrestrict: o.requesterrestrict,
        salt: o.salt,
        sign: offer.sign().clone(),
    }
}
