//! Google Sheets row source.
//!
//! Authenticates with a service account: an RS256-signed JWT assertion is
//! exchanged for a short-lived bearer token at the account's token endpoint,
//! and the token is cached until shortly before expiry. Rows come back as
//! header-keyed records, one map per data row.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::RowSource;

/// Read-only spreadsheet scope requested for the bearer token.
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// OAuth grant type for service-account assertions.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Values API base URL.
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Assertion lifetime in seconds.
const ASSERTION_TTL_SECS: i64 = 3600;

/// Safety margin subtracted from the token's reported lifetime.
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

/// HTTP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP total timeout per request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Relevant fields of the service-account JSON blob.
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: SecretString,
    token_uri: String,
}

/// JWT assertion claims for the token exchange.
#[derive(Debug, Serialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Cached bearer token.
struct CachedToken {
    token: Arc<SecretString>,
    expires_at: Instant,
}

/// `values/{sheet}` response body.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets client for one spreadsheet.
pub struct SheetsClient {
    client_email: String,
    token_uri: String,
    signing_key: EncodingKey,
    spreadsheet_id: String,
    token_cache: RwLock<Option<CachedToken>>,
    http: reqwest::Client,
}

impl SheetsClient {
    /// Build a client from service-account credentials JSON.
    ///
    /// Malformed credentials fail here, before any fetch is attempted.
    pub fn new(credentials_json: &SecretString, spreadsheet_id: String) -> AppResult<Self> {
        let key: ServiceAccountKey = serde_json::from_str(credentials_json.expose_secret())
            .map_err(|e| AppError::Sheets(format!("invalid service-account credentials: {}", e)))?;

        let signing_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| AppError::Sheets(format!("invalid service-account key: {}", e)))?;

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(SheetsClient {
            client_email: key.client_email,
            token_uri: key.token_uri,
            signing_key,
            spreadsheet_id,
            token_cache: RwLock::new(None),
            http,
        })
    }

    /// Current bearer token, exchanging a fresh assertion when the cached
    /// one is missing or stale.
    async fn access_token(&self) -> AppResult<Arc<SecretString>> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref()
                && cached.expires_at > Instant::now()
            {
                return Ok(Arc::clone(&cached.token));
            }
        }

        let issued_at = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: SHEETS_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: issued_at,
            exp: issued_at + ASSERTION_TTL_SECS,
        };

        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| AppError::Sheets(format!("failed to sign token assertion: {}", e)))?;

        debug!(token_uri = %self.token_uri, "exchanging service-account assertion");
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Sheets(format!(
                "token exchange returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;
        let cached = CachedToken {
            token: Arc::new(SecretString::from(token.access_token)),
            expires_at: Instant::now()
                + Duration::from_secs(token.expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)),
        };
        let secret = Arc::clone(&cached.token);
        *self.token_cache.write().await = Some(cached);

        Ok(secret)
    }
}

#[async_trait::async_trait]
impl RowSource for SheetsClient {
    async fn fetch_rows(&self, sheet_name: &str) -> AppResult<Vec<HashMap<String, String>>> {
        let token = self.access_token().await?;

        let url = format!(
            "{}/{}/values/{}",
            SHEETS_API_BASE,
            self.spreadsheet_id,
            urlencoding::encode(sheet_name)
        );
        debug!(url = %url, "fetching sheet values");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Sheets(format!(
                "values fetch for '{}' returned {}",
                sheet_name,
                response.status()
            )));
        }

        let body: ValueRange = response.json().await?;
        Ok(records_from_values(body.values))
    }
}

/// Zip the header row with each data row into keyed records.
///
/// Trailing cells the API omitted come back as empty strings, matching the
/// tracker's own export behavior. A sheet without a header row has no
/// records.
fn records_from_values(values: Vec<Vec<Value>>) -> Vec<HashMap<String, String>> {
    let mut rows = values.into_iter();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header_row.iter().map(cell_text).collect();

    rows.map(|row| {
        header
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let value = row.get(i).map(cell_text).unwrap_or_default();
                (field.clone(), value)
            })
            .collect()
    })
    .collect()
}

/// Cell value as display text.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cells(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| json!(v)).collect()
    }

    #[test]
    fn test_records_keyed_by_header_row() {
        let records = records_from_values(vec![
            cells(&["Date", "Title"]),
            cells(&["03/15/2024", "Login button unresponsive"]),
            cells(&["03/14/2024", "Tournament payout rounding"]),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Date"], "03/15/2024");
        assert_eq!(records[1]["Title"], "Tournament payout rounding");
    }

    #[test]
    fn test_short_rows_pad_with_empty_strings() {
        let records = records_from_values(vec![
            cells(&["Date", "Title", "Severity"]),
            cells(&["03/15/2024"]),
        ]);

        assert_eq!(records[0]["Date"], "03/15/2024");
        assert_eq!(records[0]["Title"], "");
        assert_eq!(records[0]["Severity"], "");
    }

    #[test]
    fn test_empty_sheet_has_no_records() {
        assert!(records_from_values(Vec::new()).is_empty());
        assert!(records_from_values(vec![cells(&["Date"])]).is_empty());
    }

    #[test]
    fn test_non_string_cells_render_as_text() {
        let records = records_from_values(vec![
            cells(&["Date", "Count"]),
            vec![json!("03/15/2024"), json!(4)],
        ]);
        assert_eq!(records[0]["Count"], "4");
    }

    #[test]
    fn test_extra_cells_beyond_header_are_dropped() {
        let records = records_from_values(vec![
            cells(&["Date"]),
            cells(&["03/15/2024", "stray"]),
        ]);
        assert_eq!(records[0].len(), 1);
        assert_eq!(records[0]["Date"], "03/15/2024");
    }
}
