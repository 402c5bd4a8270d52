// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::Context;
use crate::helpers::{ensure_hex_zeroizing, telemetry::setup_tracing};
use crate::{balance, keygen, mint, store_orders, transfer, watch};
use alloy::primitives::{Address, U256};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use ct_config::load_config;
use tracing::{info, instrument, Level};
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[command(name = "ctx")]
#[command(
    about = "Mint, move and inspect confidential token balances settled by a TEE",
    long_about = None
)]
pub struct Cli {
    /// Path to config file. Defaults to `CT_CONFIG`, then the nearest ct.config.yaml
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Chain profile to use. Defaults to `default_chain`, or the only chain configured
    #[arg(long, global = true)]
    chain: Option<String>,

    /// Wallet key used to sign ledger transactions and request orders
    #[arg(
        long = "private-key",
        env = "CT_PRIVATE_KEY",
        hide_env_values = true,
        value_parser = ensure_hex_zeroizing,
        global = true
    )]
    private_key: Option<Zeroizing<String>>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `ctx -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else {
            match self.verbose {
                0 => Level::WARN,  //
                1 => Level::INFO,  // -v
                2 => Level::DEBUG, // -vv
                _ => Level::TRACE, // -vvv
            }
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        setup_tracing(self.log_level());

        let Cli {
            config,
            chain,
            private_key,
            command,
            ..
        } = self;

        // keygen needs no deployment config
        let context = move || -> Result<Context> {
            let config = load_config(config, chain.clone())?;
            info!("Config loaded from: {:?}", config.config_file());
            let profile = config.chain(chain.as_deref())?.clone();
            Ok(Context::new(profile, private_key))
        };

        match command {
            Commands::Keygen => keygen::execute()?,
            Commands::Mint { to, amount, raw } => {
                mint::execute(&context()?, to, amount, raw).await?
            }
            Commands::Transfer {
                to,
                amount,
                raw,
                wait,
            } => transfer::execute(&context()?, to, amount, raw, wait).await?,
            Commands::StoreOrders => store_orders::execute(&context()?).await?,
            Commands::Balance { account, tee_key } => {
                balance::execute(&context()?, account, tee_key).await?
            }
            Commands::Watch { from_block } => watch::execute(&context()?, from_block).await?,
        }

        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the TEE keypair a ledger is deployed with
    Keygen,

    /// Mint an encrypted amount to an account (ledger owner only)
    Mint {
        /// Account to credit
        to: Address,

        /// Whole tokens, scaled by the ledger's decimals
        amount: U256,

        /// Treat `amount` as base units
        #[arg(long)]
        raw: bool,
    },

    /// Send a confidential transfer from the wallet account
    Transfer {
        /// Recipient account
        to: Address,

        /// Whole tokens, scaled by the ledger's decimals
        amount: U256,

        /// Treat `amount` as base units
        #[arg(long)]
        raw: bool,

        /// Wait for the TEE to write back the new balances
        #[arg(long)]
        wait: bool,
    },

    /// Resolve the configured marketplace offers and record them on the ledger
    StoreOrders,

    /// Show the encrypted balance of an account
    Balance {
        /// Account to inspect. Defaults to the wallet account
        account: Option<Address>,

        /// TEE secret key; when given the balance is decrypted
        #[arg(
            long = "tee-key",
            env = "CT_TEE_KEY",
            hide_env_values = true,
            value_parser = ensure_hex_zeroizing
        )]
        tee_key: Option<Zeroizing<String>>,
    },

    /// Print ledger events as they are mined
    Watch {
        /// Replay events from this block before following new ones
        #[arg(long)]
        from_block: Option<u64>,
    },
}
