//! Main application orchestration.
//!
//! Builds the server from configuration and applies requests read from a
//! newline-delimited JSON stream. A rejected request is logged and counted;
//! it never stops ingestion, since every rejection leaves the ledger as it
//! was.

use crate::collab::{ConfiguredAccess, ConfiguredBeneficiaries, InMemoryTransfer};
use crate::config::NodeConfig;
use crate::error::AppResult;
use crate::request::Request;
use dapi_core::SystemClock;
use dapi_server::{Collaborators, DapiServer, ServerResult};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

/// Outcome counts of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub applied: usize,
    pub rejected: usize,
    pub malformed: usize,
}

/// Main application.
pub struct Application {
    config: NodeConfig,
    server: Arc<DapiServer>,
    transfer: Arc<InMemoryTransfer>,
}

impl Application {
    pub fn new(config: NodeConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build with an explicit clock, for replays against a fixed time.
    pub fn with_clock(config: NodeConfig, clock: Arc<dyn dapi_core::Clock>) -> Self {
        let transfer = Arc::new(InMemoryTransfer::new());
        let collaborators = Collaborators {
            clock,
            access: Arc::new(ConfiguredAccess::from_config(&config)),
            beneficiaries: Arc::new(ConfiguredBeneficiaries::from_config(&config)),
            transfer: transfer.clone(),
        };
        let server = Arc::new(DapiServer::new(&config.server, collaborators));
        Self {
            config,
            server,
            transfer,
        }
    }

    pub fn server(&self) -> &Arc<DapiServer> {
        &self.server
    }

    pub fn transfers(&self) -> &InMemoryTransfer {
        &self.transfer
    }

    /// Apply every request in `input` until end of stream.
    pub async fn run<R>(&self, input: R) -> AppResult<IngestReport>
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = BufReader::new(input).lines();
        let mut report = IngestReport::default();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let request: Request = match serde_json::from_str(line) {
                Ok(request) => request,
                Err(e) => {
                    warn!(line = line_no, error = %e, "Malformed request");
                    report.malformed += 1;
                    continue;
                }
            };
            let op = request.op();
            match self.apply(request) {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    debug!(line = line_no, op, error = %e, "Request rejected");
                    report.rejected += 1;
                }
            }
        }

        info!(
            applied = report.applied,
            rejected = report.rejected,
            malformed = report.malformed,
            "Ingestion finished"
        );
        Ok(report)
    }

    /// Apply a single request to the server.
    pub fn apply(&self, request: Request) -> ServerResult<()> {
        let server = &self.server;
        match request {
            Request::UpdateBeacon { signed } => {
                server.update_beacon_with_signed_data(&signed)?;
            }
            Request::UpdateBeaconSet { beacon_ids } => {
                server.update_beacon_set_with_beacons(&beacon_ids)?;
            }
            Request::SetDapiName {
                caller,
                dapi_name,
                data_feed_id,
            } => server.set_dapi_name(caller, dapi_name, data_feed_id)?,
            Request::RegisterSubscription {
                caller,
                target,
                conditions,
                relayer,
                sponsor,
            } => {
                let conditions = conditions.encode();
                let id = match target {
                    dapi_psp::UpdateTarget::Beacon {
                        airnode,
                        template_id,
                    } => server.register_beacon_update_subscription(
                        caller,
                        airnode,
                        template_id,
                        &conditions,
                        relayer,
                        sponsor,
                    )?,
                    dapi_psp::UpdateTarget::BeaconSet { beacon_ids } => server
                        .register_beacon_set_update_subscription(
                            caller,
                            beacon_ids,
                            &conditions,
                            relayer,
                            sponsor,
                        )?,
                };
                info!(subscription_id = %id, "Subscription registered");
            }
            Request::FulfillBeacon {
                subscription_id,
                airnode,
                timestamp,
                data,
                signature,
            } => {
                server.fulfill_psp_beacon_update(
                    subscription_id,
                    airnode,
                    timestamp,
                    data,
                    signature,
                )?;
            }
            Request::FulfillBeaconSet { subscription_id } => {
                server.fulfill_psp_beacon_set_update(subscription_id)?;
            }
            Request::OevUpdate { request, bid } => {
                server.update_oev_proxy_data_feed_with_signed_data(&request, &bid)?;
            }
            Request::Withdraw { oev_proxy } => {
                server.withdraw(oev_proxy)?;
            }
        }
        Ok(())
    }

    /// Prometheus text dump of the counters recorded so far.
    pub fn metrics_text(&self) -> AppResult<String> {
        Ok(dapi_telemetry::Metrics::gather_text()?)
    }

    /// Log the current feed behind every configured dAPI name.
    pub fn report_dapi_names(&self) {
        for name in &self.config.dapi_names {
            match self.server.read_data_feed_with_dapi_name(*name) {
                Ok(feed) => info!(
                    dapi_name = %name,
                    value = %feed.value,
                    timestamp = feed.timestamp,
                    "dAPI value"
                ),
                Err(e) => warn!(dapi_name = %name, error = %e, "dAPI unreadable"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, B256, U256};
    use alloy::signers::local::PrivateKeySigner;
    use dapi_core::{DapiName, DataFeed, FeedValue, ManualClock, SignedData, TemplateId, UpdateId};
    use dapi_oev::{sign_oev_update, OevBid, OevUpdateRequest};

    const NOW: u32 = 1_700_000_000;
    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn signer() -> PrivateKeySigner {
        let key = hex::decode(KEY).unwrap();
        PrivateKeySigner::from_slice(&key).unwrap()
    }

    fn config() -> NodeConfig {
        NodeConfig::from_toml_str(
            r#"
manager = "0x4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d4d"
dapi_names = ["ETH/USD"]

[[oev_beneficiaries]]
oev_proxy = "0x0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e"
beneficiary = "0xbebebebebebebebebebebebebebebebebebebebe"
"#,
        )
        .unwrap()
    }

    fn app() -> Application {
        Application::with_clock(config(), ManualClock::new_shared(NOW))
    }

    fn line(request: &Request) -> String {
        format!("{}\n", serde_json::to_string(request).unwrap())
    }

    fn beacon_update(timestamp: u32, value: i64) -> Request {
        let value = FeedValue::try_from(value).unwrap();
        Request::UpdateBeacon {
            signed: SignedData::sign(&signer(), TemplateId::ZERO, timestamp, value).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_run_counts_outcomes() {
        let app = app();
        let update = beacon_update(NOW, 42);
        let input = [
            line(&update),
            "\n# comment\n".to_string(),
            line(&update),
            "{not json}\n".to_string(),
        ]
        .concat();

        let report = app.run(input.as_bytes()).await.unwrap();
        assert_eq!(
            report,
            IngestReport {
                applied: 1,
                rejected: 1,
                malformed: 1
            }
        );
    }

    #[tokio::test]
    async fn test_run_from_mock_reader() {
        let app = app();
        let beacon_id = dapi_core::DataFeedId::beacon(signer().address(), TemplateId::ZERO);
        let name = Request::SetDapiName {
            caller: Address::repeat_byte(0x4d),
            dapi_name: DapiName::new("ETH/USD").unwrap(),
            data_feed_id: beacon_id,
        };
        let mock = tokio_test::io::Builder::new()
            .read(line(&beacon_update(NOW - 1, 7)).as_bytes())
            .read(line(&name).as_bytes())
            .build();

        let report = app.run(mock).await.unwrap();
        assert_eq!(report.applied, 2);
        assert_eq!(
            app.server()
                .read_data_feed_with_dapi_name(DapiName::new("ETH/USD").unwrap()),
            Ok(DataFeed::new(FeedValue::try_from(7i64).unwrap(), NOW - 1))
        );
        app.report_dapi_names();
    }

    #[tokio::test]
    async fn test_metrics_text_after_run() {
        let app = app();
        let input = line(&beacon_update(NOW, 5));
        app.run(input.as_bytes()).await.unwrap();

        let text = app.metrics_text().unwrap();
        assert!(text.contains("dapi_feed_updates_total"));
        assert!(text.contains("kind=\"beacon\""));
    }

    #[test]
    fn test_oev_update_and_withdraw_pay_beneficiary() {
        let app = app();
        let proxy = Address::repeat_byte(0x0e);
        let bid = OevBid::new(Address::repeat_byte(0x5e), U256::from(250u64));
        let update_id = UpdateId(B256::repeat_byte(1));
        let value = FeedValue::try_from(11i64).unwrap();
        let entry = sign_oev_update(
            &signer(),
            proxy,
            update_id,
            &bid,
            TemplateId::ZERO,
            NOW,
            value,
        )
        .unwrap();

        app.apply(Request::OevUpdate {
            request: OevUpdateRequest {
                oev_proxy: proxy,
                update_id,
                placeholder_count: 0,
                entries: vec![entry],
            },
            bid,
        })
        .unwrap();
        app.apply(Request::Withdraw { oev_proxy: proxy }).unwrap();

        assert_eq!(
            app.transfers().balance_of(&Address::repeat_byte(0xbe)),
            U256::from(250u64)
        );
    }
}
