//! Robot lifecycle and plugin runs.
//!
//! Every exchange handed to the platform carries its own API keys in `meta`,
//! so settings objects are built here and go straight into the RPC args.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use botvs_client::{CallOptions, RpcClient};
use common::{
    DashboardStatus, Error, ExchangeCredential, ExchangeInfo, RobotSummary, StrategySummary,
};

use crate::catalog::ExchangeCatalog;
use crate::envelope::result_field;
use crate::scripts::{pair_from_symbol, HubAction, MIN_PLUGIN_PERIOD_SECS};

/// Strategy name fragment selecting the strategy robots run.
pub const MAIN_STRATEGY_MARKER: &str = "main";

/// Robot bar period (seconds).
const ROBOT_PERIOD_SECS: u64 = 60;

#[derive(Serialize)]
struct ExchangeSetting<'a> {
    eid: &'a str,
    pair: String,
    meta: ExchangeMeta<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExchangeMeta<'a> {
    access_key: &'a str,
    secret_key: &'a str,
}

impl<'a> ExchangeSetting<'a> {
    fn new(credential: &'a ExchangeCredential, pair: String) -> Self {
        Self {
            eid: &credential.eid,
            pair,
            meta: ExchangeMeta {
                access_key: &credential.access_key,
                secret_key: &credential.secret_key,
            },
        }
    }
}

#[derive(Serialize)]
struct PluginSettings<'a> {
    /// Minutes.
    period: u64,
    source: &'a str,
    exchanges: Vec<ExchangeSetting<'a>>,
}

#[derive(Serialize)]
struct RobotSettings<'a> {
    name: String,
    args: Vec<Value>,
    appid: &'a str,
    period: u64,
    strategy: i64,
    exchanges: Vec<ExchangeSetting<'a>>,
}

/// Platform tag linking robots to a dashboard user.
pub fn app_id_for(user_id: i64) -> String {
    format!("appId_{}", user_id)
}

/// Summarize a user's robots the way the dashboard shows them.
///
/// `profit` follows the robots in order and stops at the first live one.
pub fn dashboard_status(robots: &[RobotSummary]) -> DashboardStatus {
    let mut status = DashboardStatus {
        robot_id: robots.first().map(|r| r.id).unwrap_or(-1),
        profit: 0.0,
        running: false,
    };
    for robot in robots {
        status.profit = robot.profit;
        if robot.is_running() {
            status.running = true;
            break;
        }
    }
    status
}

/// A registered exchange joined with its catalog entry, as the hub lists it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubPlatform {
    pub id: i64,
    pub pid: i64,
    pub name: String,
    pub symbols: Value,
    pub eid: String,
    pub label: String,
}

pub struct RobotOps {
    rpc: RpcClient,
    catalog: Arc<ExchangeCatalog>,
    strategy_ttl: Duration,
}

impl RobotOps {
    /// `strategy_ttl` bounds how long the strategy list is reused.
    pub fn new(rpc: RpcClient, catalog: Arc<ExchangeCatalog>, strategy_ttl: Duration) -> Self {
        Self {
            rpc,
            catalog,
            strategy_ttl,
        }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn catalog(&self) -> &Arc<ExchangeCatalog> {
        &self.catalog
    }

    // ── Queries ───────────────────────────────────────────────────────

    /// Strategies on the account, reused for `strategy_ttl`.
    pub async fn strategy_list(&self) -> Result<Vec<StrategySummary>, Error> {
        self.strategies(CallOptions::cached(self.strategy_ttl)).await
    }

    async fn strategies(&self, options: CallOptions) -> Result<Vec<StrategySummary>, Error> {
        let env = self.rpc.call("GetStrategyList", &[], options).await?;
        result_field(&env, "strategies")
    }

    pub async fn robot_list(&self, app_id: &str) -> Result<Vec<RobotSummary>, Error> {
        let env = self
            .rpc
            .call("GetRobotList", &[json!(app_id)], CallOptions::live())
            .await?;
        result_field(&env, "robots")
    }

    pub async fn status(&self, app_id: &str) -> Result<DashboardStatus, Error> {
        let robots = self.robot_list(app_id).await?;
        Ok(dashboard_status(&robots))
    }

    /// Registered exchanges that the catalog knows, in registration order.
    pub async fn hub_platforms(
        &self,
        credentials: &[ExchangeCredential],
    ) -> Result<Vec<HubPlatform>, Error> {
        let catalog = self.catalog.list(false).await?;
        Ok(credentials
            .iter()
            .filter_map(|cred| {
                catalog
                    .iter()
                    .find(|info| info.eid == cred.eid)
                    .map(|info: &ExchangeInfo| HubPlatform {
                        id: cred.id,
                        pid: cred.id,
                        name: info.name.clone(),
                        symbols: info.symbols.clone(),
                        eid: cred.eid.clone(),
                        label: cred.label.clone(),
                    })
            })
            .collect())
    }

    // ── Commands ──────────────────────────────────────────────────────

    /// Run a one-shot plugin script against `exchanges`.
    ///
    /// Without an explicit `pair`, the first exchange's default pair is used
    /// for all of them.
    pub async fn plugin_run(
        &self,
        exchanges: &[ExchangeCredential],
        source: &str,
        pair: Option<&str>,
        period_secs: u64,
    ) -> Result<Value, Error> {
        if period_secs < MIN_PLUGIN_PERIOD_SECS {
            return Err(Error::InvalidArgument(format!(
                "plugin period must be at least {MIN_PLUGIN_PERIOD_SECS}s"
            )));
        }
        let mut pair = pair.map(str::to_string);
        let mut settings = PluginSettings {
            period: period_secs / 60,
            source,
            exchanges: Vec::with_capacity(exchanges.len()),
        };

        for cred in exchanges {
            let p = match pair.clone() {
                Some(p) => p,
                None => {
                    let p = self.catalog.default_stock(&cred.eid).await?;
                    pair = Some(p.clone());
                    p
                }
            };
            settings.exchanges.push(ExchangeSetting::new(cred, p));
        }

        debug!(
            "PluginRun on {} exchange(s), period={}m",
            settings.exchanges.len(),
            settings.period
        );
        self.rpc
            .call(
                "PluginRun",
                &[serde_json::to_value(&settings)?],
                CallOptions::live(),
            )
            .await
    }

    /// Run one hub action against a single registered exchange.
    pub async fn run_hub(
        &self,
        credential: &ExchangeCredential,
        symbol: Option<&str>,
        action: &HubAction,
    ) -> Result<Value, Error> {
        let pair = symbol.map(pair_from_symbol).transpose()?;
        self.plugin_run(
            std::slice::from_ref(credential),
            &action.script(),
            pair,
            action.period_secs(),
        )
        .await
    }

    /// Start a robot on the main strategy, or restart `robot_id` when > 0.
    ///
    /// The strategy list is always fetched live here.
    pub async fn robot_run(
        &self,
        robot_id: i64,
        app_id: &str,
        exchanges: &[ExchangeCredential],
    ) -> Result<Value, Error> {
        let strategy_id = self
            .strategies(CallOptions::live())
            .await?
            .iter()
            .rev()
            .find(|s| s.name.contains(MAIN_STRATEGY_MARKER))
            .map(|s| s.id)
            .ok_or_else(|| Error::StrategyNotFound(MAIN_STRATEGY_MARKER.into()))?;

        let mut settings = RobotSettings {
            name: format!("robot for {}", app_id),
            args: Vec::new(),
            appid: app_id,
            period: ROBOT_PERIOD_SECS,
            strategy: strategy_id,
            exchanges: Vec::with_capacity(exchanges.len()),
        };
        for cred in exchanges {
            let pair = self.catalog.default_stock(&cred.eid).await?;
            settings.exchanges.push(ExchangeSetting::new(cred, pair));
        }
        let settings = serde_json::to_value(&settings)?;

        if robot_id > 0 {
            info!("Restarting robot {} (strategy {})", robot_id, strategy_id);
            self.rpc
                .call(
                    "RestartRobot",
                    &[json!(robot_id), settings],
                    CallOptions::live(),
                )
                .await
        } else {
            info!("Creating robot for {} (strategy {})", app_id, strategy_id);
            self.rpc
                .call("NewRobot", &[settings], CallOptions::live())
                .await
        }
    }

    /// Stop every robot tagged with `app_id`.
    ///
    /// Returns the last platform reply, or `{"code": 0}` when none were running.
    pub async fn stop_all(&self, app_id: &str) -> Result<Value, Error> {
        let robots = self.robot_list(app_id).await?;
        let mut last = None;
        for robot in &robots {
            info!("Stopping robot {}", robot.id);
            last = Some(
                self.rpc
                    .call("StopRobot", &[json!(robot.id)], CallOptions::live())
                    .await?,
            );
        }
        Ok(last.unwrap_or_else(|| json!({"code": 0})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubPlatform, CATALOG};

    fn cred(id: i64, eid: &str) -> ExchangeCredential {
        ExchangeCredential {
            id,
            eid: eid.into(),
            label: format!("label-{id}"),
            access_key: format!("ak-{id}"),
            secret_key: format!("sk-{id}"),
        }
    }

    fn ops(stub: &Arc<StubPlatform>) -> RobotOps {
        stub.serve_catalog(CATALOG);
        let catalog = Arc::new(ExchangeCatalog::new(stub.clone(), "u"));
        RobotOps::new(stub.client(), catalog, Duration::from_secs(600))
    }

    fn robot(id: i64, status: i64, profit: f64) -> RobotSummary {
        RobotSummary {
            id,
            name: format!("robot-{id}"),
            status,
            profit,
        }
    }

    #[test]
    fn test_app_id() {
        assert_eq!(app_id_for(42), "appId_42");
    }

    #[test]
    fn test_dashboard_status() {
        assert_eq!(
            dashboard_status(&[]),
            DashboardStatus { robot_id: -1, profit: 0.0, running: false }
        );

        let robots = [robot(9, 4, 1.5), robot(10, 1, 2.5), robot(11, 4, 9.0)];
        assert_eq!(
            dashboard_status(&robots),
            DashboardStatus { robot_id: 9, profit: 2.5, running: true }
        );

        let stopped = [robot(9, 4, 1.5), robot(10, 5, 3.0)];
        assert_eq!(
            dashboard_status(&stopped),
            DashboardStatus { robot_id: 9, profit: 3.0, running: false }
        );
    }

    #[tokio::test]
    async fn test_plugin_run_settings_shape() {
        let stub = StubPlatform::new();
        stub.reply("PluginRun", json!({"code": 0, "data": {"result": "ok"}}));
        let ops = ops(&stub);

        let creds = [cred(1, "OKCoin_EN"), cred(2, "Huobi")];
        let out = ops
            .plugin_run(&creds, "function main() {}", None, 900)
            .await
            .unwrap();
        assert_eq!(out["data"]["result"], "ok");

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "PluginRun");
        assert_eq!(
            calls[0].args,
            vec![json!({
                "period": 15,
                "source": "function main() {}",
                "exchanges": [
                    {"eid": "OKCoin_EN", "pair": "BTC_USD",
                     "meta": {"AccessKey": "ak-1", "SecretKey": "sk-1"}},
                    {"eid": "Huobi", "pair": "BTC_USD",
                     "meta": {"AccessKey": "ak-2", "SecretKey": "sk-2"}}
                ]
            })]
        );
    }

    #[tokio::test]
    async fn test_plugin_run_unknown_exchange() {
        let stub = StubPlatform::new();
        let ops = ops(&stub);
        let err = ops
            .plugin_run(&[cred(1, "Nowhere")], "x", None, 60)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExchangeNotFound(_)));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_plugin_run_rejects_sub_minute_period() {
        let stub = StubPlatform::new();
        let ops = ops(&stub);
        let err = ops
            .plugin_run(&[cred(1, "Huobi")], "x", Some("BTC_CNY"), 59)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(stub.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_hub_uses_symbol_pair() {
        let stub = StubPlatform::new();
        stub.reply("PluginRun", json!({"code": 0, "data": {"result": []}}));
        let ops = ops(&stub);

        ops.run_hub(
            &cred(3, "Huobi"),
            Some("Huobi.LTC_CNY"),
            &HubAction::Market { period_secs: 300 },
        )
        .await
        .unwrap();

        let args = &stub.calls()[0].args[0];
        assert_eq!(args["period"], 5);
        assert_eq!(args["exchanges"][0]["pair"], "LTC_CNY");
        assert!(args["source"].as_str().unwrap().contains("GetRecords"));
    }

    #[tokio::test]
    async fn test_robot_run_new_robot() {
        let stub = StubPlatform::new();
        stub.reply(
            "GetStrategyList",
            json!({"data": {"result": {"strategies": [
                {"id": 3, "name": "main-v1"},
                {"id": 5, "name": "scratch"},
                {"id": 7, "name": "main-v2"}
            ]}}}),
        );
        stub.reply("NewRobot", json!({"code": 0, "data": {"result": 99}}));
        let ops = ops(&stub);

        ops.robot_run(-1, "appId_1", &[cred(1, "Huobi")]).await.unwrap();

        let calls = stub.calls();
        assert_eq!(stub.methods(), vec!["GetStrategyList", "NewRobot"]);
        assert_eq!(
            calls[1].args,
            vec![json!({
                "name": "robot for appId_1",
                "args": [],
                "appid": "appId_1",
                "period": 60,
                "strategy": 7,
                "exchanges": [{"eid": "Huobi", "pair": "BTC_CNY",
                               "meta": {"AccessKey": "ak-1", "SecretKey": "sk-1"}}]
            })]
        );
    }

    #[tokio::test]
    async fn test_robot_run_restart() {
        let stub = StubPlatform::new();
        stub.reply(
            "GetStrategyList",
            json!({"data": {"result": {"strategies": [{"id": 7, "name": "main"}]}}}),
        );
        stub.reply("RestartRobot", json!({"code": 0, "data": {"result": 1}}));
        let ops = ops(&stub);

        ops.robot_run(12, "appId_1", &[]).await.unwrap();

        assert_eq!(stub.methods(), vec!["GetStrategyList", "RestartRobot"]);
        assert_eq!(stub.calls()[1].args[0], json!(12));
    }

    #[tokio::test]
    async fn test_strategy_list_is_cached() {
        let stub = StubPlatform::new();
        stub.reply(
            "GetStrategyList",
            json!({"data": {"result": {"strategies": [{"id": 7, "name": "main"}]}}}),
        );
        let ops = ops(&stub);

        ops.strategy_list().await.unwrap();
        let list = ops.strategy_list().await.unwrap();
        assert_eq!(list[0].id, 7);
        assert_eq!(stub.methods(), vec!["GetStrategyList"]);
    }

    #[tokio::test]
    async fn test_robot_run_sees_strategy_created_after_listing() {
        let stub = StubPlatform::new();
        stub.reply(
            "GetStrategyList",
            json!({"data": {"result": {"strategies": [{"id": 5, "name": "scratch"}]}}}),
        );
        stub.reply("NewRobot", json!({"code": 0, "data": {"result": 99}}));
        let ops = ops(&stub);

        // Warm the cached listing before the main strategy exists.
        assert!(ops.strategy_list().await.unwrap().iter().all(|s| s.id != 8));

        stub.reply(
            "GetStrategyList",
            json!({"data": {"result": {"strategies": [
                {"id": 5, "name": "scratch"},
                {"id": 8, "name": "main"}
            ]}}}),
        );
        ops.robot_run(-1, "appId_1", &[]).await.unwrap();

        assert_eq!(
            stub.methods(),
            vec!["GetStrategyList", "GetStrategyList", "NewRobot"]
        );
        assert_eq!(stub.calls()[2].args[0]["strategy"], 8);
    }

    #[tokio::test]
    async fn test_robot_run_without_main_strategy() {
        let stub = StubPlatform::new();
        stub.reply(
            "GetStrategyList",
            json!({"data": {"result": {"strategies": [{"id": 5, "name": "scratch"}]}}}),
        );
        let ops = ops(&stub);

        let err = ops.robot_run(-1, "appId_1", &[]).await.unwrap_err();
        assert!(matches!(err, Error::StrategyNotFound(_)));
        assert_eq!(stub.methods(), vec!["GetStrategyList"]);
    }

    #[tokio::test]
    async fn test_stop_all() {
        let stub = StubPlatform::new();
        stub.reply(
            "GetRobotList",
            json!({"data": {"result": {"robots": [
                {"id": 1, "status": 1, "profit": 0.0},
                {"id": 2, "status": 4, "profit": 1.0}
            ]}}}),
        );
        stub.reply("StopRobot", json!({"code": 0, "data": {"result": 2}}));
        let ops = ops(&stub);

        let out = ops.stop_all("appId_1").await.unwrap();
        assert_eq!(out["data"]["result"], 2);
        let calls = stub.calls();
        assert_eq!(calls[0].args, vec![json!("appId_1")]);
        assert_eq!(calls[1].args, vec![json!(1)]);
        assert_eq!(calls[2].args, vec![json!(2)]);
    }

    #[tokio::test]
    async fn test_stop_all_without_robots() {
        let stub = StubPlatform::new();
        stub.reply("GetRobotList", json!({"data": {"result": {"robots": []}}}));
        let ops = ops(&stub);

        assert_eq!(ops.stop_all("appId_1").await.unwrap(), json!({"code": 0}));
        assert_eq!(stub.methods(), vec!["GetRobotList"]);
    }

    #[tokio::test]
    async fn test_status_surfaces_remote_error() {
        let stub = StubPlatform::new();
        stub.reply("GetRobotList", json!({"code": 4, "data": {"error": "Invalid sign"}}));
        let ops = ops(&stub);

        assert!(matches!(
            ops.status("appId_1").await,
            Err(Error::Remote { code: 4, .. })
        ));
    }

    #[tokio::test]
    async fn test_hub_platforms_join_catalog() {
        let stub = StubPlatform::new();
        let ops = ops(&stub);

        let list = ops
            .hub_platforms(&[cred(1, "Huobi"), cred(2, "Nowhere"), cred(3, "OKCoin_EN")])
            .await
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Huobi");
        assert_eq!(list[1].pid, 3);
        assert_eq!(list[1].symbols, json!(["BTC_USD"]));
    }
}
