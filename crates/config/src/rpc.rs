// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcProtocol {
    Http,
    Https,
    Ws,
    Wss,
}

impl RpcProtocol {
    pub fn is_websocket(&self) -> bool {
        matches!(self, RpcProtocol::Ws | RpcProtocol::Wss)
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, RpcProtocol::Https | RpcProtocol::Wss)
    }
}

/// A validated node endpoint. Ledger calls go over http(s); log subscriptions prefer ws(s).
#[derive(Clone, Debug)]
pub struct RpcEndpoint {
    protocol: RpcProtocol,
    url: Url,
}

impl RpcEndpoint {
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).context("Invalid URL format")?;
        let protocol = match parsed.scheme() {
            "http" => RpcProtocol::Http,
            "https" => RpcProtocol::Https,
            "ws" => RpcProtocol::Ws,
            "wss" => RpcProtocol::Wss,
            _ => bail!("Invalid protocol. Expected: http://, https://, ws://, wss://"),
        };

        if parsed.host_str().is_none() {
            bail!("URL must contain a host");
        }

        Ok(RpcEndpoint {
            protocol,
            url: parsed,
        })
    }

    pub fn protocol(&self) -> RpcProtocol {
        self.protocol
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn with_scheme(&self, websocket: bool) -> Result<String> {
        if self.protocol.is_websocket() == websocket {
            return Ok(self.url.to_string());
        }
        let scheme = match (websocket, self.protocol.is_secure()) {
            (true, true) => "wss",
            (true, false) => "ws",
            (false, true) => "https",
            (false, false) => "http",
        };
        let mut parsed = self.url.clone();
        parsed
            .set_scheme(scheme)
            .map_err(|_| anyhow!("{scheme} is a valid scheme for {}", self.url))?;
        Ok(parsed.to_string())
    }

    pub fn as_http_url(&self) -> Result<String> {
        self.with_scheme(false)
    }

    pub fn as_ws_url(&self) -> Result<String> {
        self.with_scheme(true)
    }

    pub fn is_local(&self) -> bool {
        match self.url.host_str() {
            Some("localhost") | Some("127.0.0.1") | Some("::1") | Some("[::1]") => true,
            Some(host) => host.starts_with("127."),
            None => false,
        }
    }
}
