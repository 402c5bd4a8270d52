// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract PrivateERC20 {
        struct AppOrder {
            address app;
            uint256 appprice;
            uint256 volume;
            bytes32 tag;
            address datasetrestrict;
            address workerpoolrestrict;
            address requesterrestrict;
            bytes32 salt;
            bytes sign;
        }

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
            bytes sign;
        }

        struct DatasetOrder {
            address dataset;
            uint256 datasetprice;
            uint256 volume;
            bytes32 tag;
            address apprestrict;
            address workerpoolrestrict;
            address requesterrestrict;
            bytes32 salt;
            bytes sign;
        }

        event Mint(address indexed to, bytes amount);

        event TransferRequested(address indexed from, address indexed to, bytes amount, uint256 escrow);

        event BalanceUpdate(address indexed sender, address indexed recipient, bytes newSenderBalance, bytes newRecipientBalance);

        event OrdersStored(address indexed app, address indexed workerpool, address dataset);

        function encryptionPublicKey() external view returns (bytes memory);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (bytes memory);
        function mint(address to, bytes calldata amount) external;
        function transfer(address to, bytes calldata amount) external payable;
        function updateBalance(address sender, address recipient, bytes calldata newSenderBalance, bytes calldata newRecipientBalance) external;
        function storeOrders(AppOrder calldata appOrder, WorkerpoolOrder calldata workerpoolOrder, DatasetOrder calldata datasetOrder) external;
    }
}

pub use PrivateERC20::{AppOrder, DatasetOrder, WorkerpoolOrder};

impl DatasetOrder {
    /// The all-zero order stored when a deployment runs without a dataset.
    pub fn empty() -> Self {
        Self {
            dataset: Default::default(),
            datasetprice: Default::default(),
            volume: Default::default(),
            tag: Default::default(),
            apprestrict: Default::default(),
            workerpoolrestrict: Default::default(),
            requesterrestrict: Default::default(),
            salt: Default::default(),
            sign: Default::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_zero() && self.volume.is_zero() && self.sign.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{
        primitives::{keccak256, Address, Bytes, U256},
        sol_types::{SolCall, SolEvent},
    };

    fn selector(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    #[test]
    fn selectors_match_the_deployed_abi() {
        assert_eq!(
            PrivateERC20::mintCall::SELECTOR,
            selector("mint(address,bytes)")
        );
        assert_eq!(
            PrivateERC20::transferCall::SELECTOR,
            selector("transfer(address,bytes)")
        );
        assert_eq!(
            PrivateERC20::updateBalanceCall::SELECTOR,
            selector("updateBalance(address,address,bytes,bytes)")
        );
        assert_eq!(
            PrivateERC20::storeOrdersCall::SIGNATURE,
            "storeOrders((address,uint256,uint256,bytes32,address,address,address,bytes32,bytes),(address,uint256,uint256,bytes32,uint256,uint256,address,address,address,bytes32,bytes),(address,uint256,uint256,bytes32,address,address,address,bytes32,bytes))"
        );
        assert_eq!(
            PrivateERC20::BalanceUpdate::SIGNATURE,
            "BalanceUpdate(address,address,bytes,bytes)"
        );
    }

    #[test]
    fn transfer_call_round_trips_through_calldata() {
        let to = Address::repeat_byte(0x42);
        let call = PrivateERC20::transferCall {
            to,
            amount: Bytes::from(vec![4u8; 120]),
        };
        let encoded = call.abi_encode();
        assert_eq!(&encoded[..4], &selector("transfer(address,bytes)"));
        let decoded = PrivateERC20::transferCall::abi_decode(&encoded).unwrap();
        assert_eq!(decoded.to, to);
        assert_eq!(decoded.amount.len(), 120);
    }

    #[test]
    fn empty_dataset_order_is_all_zero() {
        let empty = DatasetOrder::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.datasetprice, U256::ZERO);

        let mut used = DatasetOrder::empty();
        used.dataset = Address::repeat_byte(1);
        assert!(!used.is_empty());
    }
}
