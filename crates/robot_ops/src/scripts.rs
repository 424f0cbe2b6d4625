//! Plugin scripts behind the hub's manual actions.
//!
//! Each action renders a small JavaScript `main()` that the platform runs
//! once against a single exchange via `PluginRun`.

use serde_json::Value;

use common::Error;

/// Default plugin period when an action does not set one (seconds).
pub const DEFAULT_PLUGIN_PERIOD_SECS: u64 = 900;

/// Shortest plugin period the platform accepts (seconds).
pub const MIN_PLUGIN_PERIOD_SECS: u64 = 60;

const MARKET_BODY: &str = r#"    var a = exchange.Go("GetTicker");
    var b = exchange.Go("GetDepth");
    var c = exchange.Go("GetRecords");
    return [a.wait(), b.wait(), c.wait()];"#;

#[derive(Debug, Clone, PartialEq)]
pub enum HubAction {
    /// Ticker, depth and K-lines; `period_secs` is the K-line period.
    Market { period_secs: u64 },
    Buy { price: f64, amount: f64 },
    Sell { price: f64, amount: f64 },
    Cancel { order_id: Value },
    /// Open orders and account balances.
    Balance,
}

impl HubAction {
    /// Parse a hub request: action name plus its positional args.
    pub fn parse(action: &str, args: &[Value]) -> Result<Self, Error> {
        let action = action.trim().to_ascii_lowercase();
        match action.as_str() {
            "market" => {
                let period_secs = match args.first() {
                    Some(v) => v.as_u64().ok_or_else(|| {
                        Error::InvalidArgument("market period must be a positive integer".into())
                    })?,
                    None => DEFAULT_PLUGIN_PERIOD_SECS,
                };
                // The platform takes whole minutes.
                if period_secs < MIN_PLUGIN_PERIOD_SECS {
                    return Err(Error::InvalidArgument(format!(
                        "market period must be at least {MIN_PLUGIN_PERIOD_SECS}s, got {period_secs}s"
                    )));
                }
                Ok(Self::Market { period_secs })
            }
            "buy" | "sell" => {
                let price = number_arg(args, 0, "price")?;
                let amount = number_arg(args, 1, "amount")?;
                if action == "buy" {
                    Ok(Self::Buy { price, amount })
                } else {
                    Ok(Self::Sell { price, amount })
                }
            }
            "cancel" => match args.first() {
                Some(id @ (Value::String(_) | Value::Number(_))) => Ok(Self::Cancel {
                    order_id: id.clone(),
                }),
                _ => Err(Error::InvalidArgument(
                    "cancel needs an order id".into(),
                )),
            },
            "balance" => Ok(Self::Balance),
            other => Err(Error::InvalidArgument(format!("unknown hub action '{other}'"))),
        }
    }

    /// Plugin period for this action.
    pub fn period_secs(&self) -> u64 {
        match self {
            Self::Market { period_secs } => *period_secs,
            _ => DEFAULT_PLUGIN_PERIOD_SECS,
        }
    }

    /// JavaScript source for the platform plugin.
    pub fn script(&self) -> String {
        let body = match self {
            Self::Market { .. } => MARKET_BODY.to_string(),
            Self::Buy { price, amount } => {
                format!("    return exchange.Buy({price:.6}, {amount:.6});")
            }
            Self::Sell { price, amount } => {
                format!("    return exchange.Sell({price:.6}, {amount:.6});")
            }
            // JSON rendering keeps string ids quoted inside the script.
            Self::Cancel { order_id } => format!("    return exchange.CancelOrder({order_id});"),
            Self::Balance => "    return [exchange.GetOrders(), exchange.GetAccount()];".to_string(),
        };

        format!("function main() {{\n    exchange.SetTimeout(2000);\n{body}\n}}\n")
    }
}

fn number_arg(args: &[Value], idx: usize, name: &str) -> Result<f64, Error> {
    let v = args
        .get(idx)
        .ok_or_else(|| Error::InvalidArgument(format!("missing {name}")))?;
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
        .ok_or_else(|| Error::InvalidArgument(format!("{name} must be a number")))
}

/// Pair part of a hub symbol such as `"Huobi.BTC_CNY"`.
pub fn pair_from_symbol(symbol: &str) -> Result<&str, Error> {
    match symbol.split('.').nth(1) {
        Some(pair) if !pair.is_empty() => Ok(pair),
        _ => Err(Error::InvalidArgument(format!(
            "symbol '{symbol}' is not <exchange>.<pair>"
        ))),
    }
}
