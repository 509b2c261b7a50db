use serde::{Deserialize, Serialize};

/// Response of `function=GLOBAL_QUOTE`.
///
/// Alpha Vantage answers HTTP 200 for everything; errors and throttling show
/// up as alternative top-level keys.
#[derive(Serialize, Deserialize, Debug)]
pub struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    pub global_quote: Option<GlobalQuote>,
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Information")]
    pub information: Option<String>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
}

/// Fields of a global quote. All values are strings; an unknown symbol
/// yields an empty object, so every field is optional.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "03. high")]
    pub high: Option<String>,
    #[serde(rename = "04. low")]
    pub low: Option<String>,
    #[serde(rename = "05. price")]
    pub price: Option<String>,
    #[serde(rename = "06. volume")]
    pub volume: Option<String>,
    #[serde(rename = "07. latest trading day")]
    pub latest_trading_day: Option<String>,
    #[serde(rename = "08. previous close")]
    pub previous_close: Option<String>,
}
