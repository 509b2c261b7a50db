use serde::{Deserialize, Serialize};

/// Envelope of the Yahoo Finance v8 chart endpoint.
#[derive(Serialize, Deserialize, Debug)]
pub struct ChartResponse {
    pub chart: ChartResult,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChartResult {
    pub result: Option<Vec<ChartResultItem>>,
    pub error: Option<ChartError>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChartResultItem {
    pub meta: ChartMeta,
}

/// Quote summary carried in `chart.result[].meta`.
///
/// Numbers stay as `serde_json::Number` and reach `Decimal` through their
/// shortest round-trip text, so `189.84` arrives as `189.84` and not as the
/// binary expansion of the underlying `f64`.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub exchange_name: Option<String>,
    pub regular_market_price: Option<serde_json::Number>,
    pub previous_close: Option<serde_json::Number>,
    pub regular_market_day_high: Option<serde_json::Number>,
    pub regular_market_day_low: Option<serde_json::Number>,
    pub regular_market_volume: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    pub description: Option<String>,
}
