use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{CalendarKey, RawDay};

pub const DEFAULT_API_URL: &str = "https://api.aladhan.com/v1/calendar";

/// How a calendar fetch failed. Nothing here is retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("No response from Aladhan service. Please check your internet connection. ({0})")]
    Network(String),

    #[error("Aladhan server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response format from Aladhan API: {0}")]
    InvalidResponse(String),

    #[error("Aladhan request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Worth offering the user a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Server { status, .. } => *status >= 500 || *status == 429,
            FetchError::InvalidResponse(_) | FetchError::Request(_) => false,
        }
    }
}

/// Anything that can produce a raw month of prayer times for a key.
pub trait CalendarSource: Send + Sync {
    fn fetch_month(&self, key: &CalendarKey) -> Result<Vec<RawDay>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: u16,
    #[serde(default)]
    data: serde_json::Value,
}

/// Unwrap the `{code, status, data}` envelope of a calendar response body.
pub fn parse_calendar_response(body: &str) -> Result<Vec<RawDay>, FetchError> {
    let envelope: Envelope =
        serde_json::from_str(body).map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

    if envelope.code != 200 {
        return Err(FetchError::InvalidResponse(format!("code {}", envelope.code)));
    }
    if !envelope.data.is_array() {
        return Err(FetchError::InvalidResponse("missing data array".to_string()));
    }

    serde_json::from_value(envelope.data).map_err(|e| FetchError::InvalidResponse(e.to_string()))
}

/// Error message out of a non-2xx body; the service puts it in `data`.
fn server_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("data")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown error".to_string())
}

pub struct AladhanClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl AladhanClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("waqt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn month_url(&self, key: &CalendarKey) -> String {
        format!("{}/{}/{}", self.base_url, key.year, key.month)
    }
}

impl CalendarSource for AladhanClient {
    fn fetch_month(&self, key: &CalendarKey) -> Result<Vec<RawDay>, FetchError> {
        let url = self.month_url(key);
        debug!("GET {} for {}", url, key);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", key.coordinates.latitude.to_string()),
                ("longitude", key.coordinates.longitude.to_string()),
                ("method", key.method.to_string()),
                ("school", key.school.api_param().to_string()),
            ])
            .send()
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    FetchError::Network(e.to_string())
                } else {
                    FetchError::Request(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Server {
                status: status.as_u16(),
                message: server_message(&body),
            });
        }

        let days = parse_calendar_response(&body)?;
        info!("Fetched {} days for {}", days.len(), key);
        Ok(days)
    }
}

/// Aladhan calculation method ids.
pub const CALC_METHODS: &[(u8, &str)] = &[
    (0, "Shia Ithna-Ashari (Jafari)"),
    (1, "University of Islamic Sciences, Karachi"),
    (2, "Islamic Society of North America"),
    (3, "Muslim World League"),
    (4, "Umm Al-Qura University, Makkah"),
    (5, "Egyptian General Authority of Survey"),
    (7, "Institute of Geophysics, University of Tehran"),
    (8, "Gulf Region"),
    (9, "Kuwait"),
    (10, "Qatar"),
    (11, "Majlis Ugama Islam Singapura"),
    (12, "Union Organization Islamic de France"),
    (13, "Diyanet İşleri Başkanlığı, Turkey"),
    (14, "Spiritual Administration of Muslims of Russia"),
    (15, "Moonsighting Committee Worldwide"),
    (16, "Dubai"),
    (17, "Jabatan Kemajuan Islam Malaysia (JAKIM)"),
    (18, "Tunisia"),
    (19, "Algeria"),
    (20, "Kementerian Agama Republik Indonesia"),
    (21, "Morocco"),
    (22, "Comunidade Islamica de Lisboa"),
    (23, "Ministry of Awqaf, Islamic Affairs and Holy Places, Jordan"),
];

pub fn method_name(id: u8) -> Option<&'static str> {
    CALC_METHODS
        .iter()
        .find(|(m, _)| *m == id)
        .map(|(_, name)| *name)
}
