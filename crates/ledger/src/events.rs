// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::bindings::PrivateERC20;
use crate::error::{LedgerError, Result};
use alloy::{
    primitives::{Address, B256, U256},
    rpc::types::Log,
    sol_types::SolEvent,
};
use ct_crypto::EncryptedAmount;
use std::fmt;

/// The TEE's write-back for one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdated {
    pub sender: Address,
    pub recipient: Address,
    pub new_sender_balance: EncryptedAmount,
    pub new_recipient_balance: EncryptedAmount,
}

/// Decoded ledger events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Mint {
        to: Address,
        amount: EncryptedAmount,
    },
    TransferRequested {
        from: Address,
        to: Address,
        amount: EncryptedAmount,
        escrow: U256,
    },
    BalanceUpdate(BalanceUpdated),
    OrdersStored {
        app: Address,
        workerpool: Address,
        dataset: Address,
    },
}

impl LedgerEvent {
    /// Decode a raw log. Logs from unrelated events yield `None`.
    pub fn from_log(log: &Log) -> Result<Option<Self>> {
        let Some(topic0) = log.topic0() else {
            return Ok(None);
        };
        let event = match *topic0 {
            PrivateERC20::Mint::SIGNATURE_HASH => {
                let e = decode::<PrivateERC20::Mint>(log)?;
                LedgerEvent::Mint {
                    to: e.to,
                    amount: e.amount.into(),
                }
            }
            PrivateERC20::TransferRequested::SIGNATURE_HASH => {
                let e = decode::<PrivateERC20::TransferRequested>(log)?;
                LedgerEvent::TransferRequested {
                    from: e.from,
                    to: e.to,
                    amount: e.amount.into(),
                    escrow: e.escrow,
                }
            }
            PrivateERC20::BalanceUpdate::SIGNATURE_HASH => {
                let e = decode::<PrivateERC20::BalanceUpdate>(log)?;
                LedgerEvent::BalanceUpdate(BalanceUpdated {
                    sender: e.sender,
                    recipient: e.recipient,
                    new_sender_balance: e.newSenderBalance.into(),
                    new_recipient_balance: e.newRecipientBalance.into(),
                })
            }
            PrivateERC20::OrdersStored::SIGNATURE_HASH => {
                let e = decode::<PrivateERC20::OrdersStored>(log)?;
                LedgerEvent::OrdersStored {
                    app: e.app,
                    workerpool: e.workerpool,
                    dataset: e.dataset,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Mint { .. } => "Mint",
            LedgerEvent::TransferRequested { .. } => "TransferRequested",
            LedgerEvent::BalanceUpdate(_) => "BalanceUpdate",
            LedgerEvent::OrdersStored { .. } => "OrdersStored",
        }
    }

    /// Whether this is the `TransferRequested` for exactly this sender, recipient and ciphertext.
    pub fn is_transfer_request(
        &self,
        sender: Address,
        recipient: Address,
        amount: &EncryptedAmount,
    ) -> bool {
        matches!(
            self,
            LedgerEvent::TransferRequested { from, to, amount: a, .. }
                if *from == sender && *to == recipient && a == amount
        )
    }

    pub fn as_balance_update(&self) -> Option<&BalanceUpdated> {
        match self {
            LedgerEvent::BalanceUpdate(update) => Some(update),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Mint { to, amount } => {
                write!(f, "Mint(to={to}, amount={})", amount.short())
            }
            LedgerEvent::TransferRequested {
                from,
                to,
                amount,
                escrow,
            } => write!(
                f,
                "TransferRequested(from={from}, to={to}, amount={}, escrow={escrow})",
                amount.short()
            ),
            LedgerEvent::BalanceUpdate(u) => write!(
                f,
                "BalanceUpdate(sender={}, recipient={}, sender_balance={}, recipient_balance={})",
                u.sender,
                u.recipient,
                u.new_sender_balance.short(),
                u.new_recipient_balance.short()
            ),
            LedgerEvent::OrdersStored {
                app,
                workerpool,
                dataset,
            } => write!(
                f,
                "OrdersStored(app={app}, workerpool={workerpool}, dataset={dataset})"
            ),
        }
    }
}

/// A decoded event with where it was seen on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedEvent {
    pub event: LedgerEvent,
    pub block_number: Option<u64>,
    pub tx_hash: Option<B256>,
}

impl ObservedEvent {
    pub fn from_log(log: &Log) -> Result<Option<Self>> {
        Ok(LedgerEvent::from_log(log)?.map(|event| ObservedEvent {
            event,
            block_number: log.block_number,
            tx_hash: log.transaction_hash,
        }))
    }
}

fn decode<E: SolEvent>(log: &Log) -> Result<E> {
    log.log_decode::<E>()
        .map(|decoded| decoded.inner.data)
        .map_err(|e| LedgerError::Decode(e.to_string()))
}
