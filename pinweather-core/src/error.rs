use thiserror::Error;

/// Failure while searching locations or fetching a forecast.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Failed to send request to WeatherAPI.com ({endpoint}): {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("WeatherAPI {endpoint} request failed with status {status}: {body}")]
    Status { endpoint: &'static str, status: u16, body: String },

    #[error("Failed to parse WeatherAPI {endpoint} JSON: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("WeatherAPI response contained no {0} data")]
    MissingData(&'static str),

    #[error("Unrecognized timestamp '{0}' in WeatherAPI response")]
    Timestamp(String),
}

/// Failure while reading or writing persisted client state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access store entry '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize store entry '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while mutating the pinned list.
#[derive(Debug, Error)]
pub enum PinError {
    #[error("Pinned index {index} is out of range (have {len} pinned locations)")]
    OutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}
