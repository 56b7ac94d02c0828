//! The Ratchet license client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ed25519_dalek::VerifyingKey;
use reqwest::Client as HttpClient;

use crate::cache::CachedLicense;
use crate::device::{generate_uuid, get_hardware_id, get_machine_name, get_os_info};
use crate::error::{Result, SdkError};
use crate::storage::{keys, MemoryStorage, StorageAdapter};
use crate::types::*;
use crate::verify::{decode_public_key, verify_key};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PHONE_HOME_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Configuration options for [`LicenseClient`].
#[derive(Clone, Default)]
pub struct ClientOptions {
    /// Server public key (base64) for local key pre-validation. Optional;
    /// the server verdict is authoritative either way.
    pub public_key: Option<String>,
    /// Custom storage adapter (default: MemoryStorage)
    pub storage: Option<Arc<dyn StorageAdapter>>,
    /// Override the hardware id (default: stable machine fingerprint)
    pub hardware_id: Option<String>,
    /// Phone-home interval (default: 24 hours)
    pub phone_home_interval: Option<Duration>,
    /// Offline grace window from the last successful phone-home
    /// (default: 30 days)
    pub grace_period: Option<Duration>,
    /// HTTP request timeout (default: 10 seconds)
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("public_key", &self.public_key)
            .field("storage", &"<storage>")
            .field("hardware_id", &self.hardware_id)
            .field("phone_home_interval", &self.phone_home_interval)
            .field("grace_period", &self.grace_period)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Ratchet SDK client.
///
/// # Example
/// ```rust,ignore
/// use ratchet_sdk::{ClientOptions, LicenseClient};
///
/// let client = LicenseClient::new("https://licenses.example.com", Default::default())?;
/// let result = client.activate("BASE64.BASE64").await?;
/// println!("Activated tier {}", result.tier);
///
/// if client.has_feature("inventory") {
///     // unlock inventory module
/// }
/// ```
pub struct LicenseClient {
    base_url: String,
    public_key: Option<VerifyingKey>,
    storage: Arc<dyn StorageAdapter>,
    hardware_id: String,
    phone_home_interval: Duration,
    grace_period: Duration,
    http: HttpClient,
    phone_home_running: AtomicBool,
}

impl LicenseClient {
    /// Create a new client for the given server.
    pub fn new(base_url: &str, options: ClientOptions) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let public_key = match &options.public_key {
            Some(encoded) => Some(decode_public_key(encoded).ok_or(SdkError::InvalidKey)?),
            None => None,
        };

        let storage: Arc<dyn StorageAdapter> = options
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));

        let hardware_id = options.hardware_id.unwrap_or_else(|| {
            if let Some(id) = storage.get(keys::HARDWARE_ID) {
                return id;
            }
            let id = get_hardware_id().unwrap_or_else(|_| generate_uuid());
            storage.set(keys::HARDWARE_ID, &id);
            id
        });

        let http = HttpClient::builder()
            .user_agent(concat!("ratchet-sdk-rust/", env!("CARGO_PKG_VERSION")))
            .timeout(options.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(Self {
            base_url,
            public_key,
            storage,
            hardware_id,
            phone_home_interval: options
                .phone_home_interval
                .unwrap_or(DEFAULT_PHONE_HOME_INTERVAL),
            grace_period: options.grace_period.unwrap_or(DEFAULT_GRACE_PERIOD),
            http,
            phone_home_running: AtomicBool::new(false),
        })
    }

    /// The hardware id this client reports to the server.
    pub fn hardware_id(&self) -> &str {
        &self.hardware_id
    }

    // ==================== Cache ====================

    /// The cached license from the last successful server interaction.
    pub fn cached(&self) -> Option<CachedLicense> {
        let raw = self.storage.get(keys::LICENSE)?;
        serde_json::from_str(&raw).ok()
    }

    fn save_cache(&self, cache: &CachedLicense) {
        if let Ok(raw) = serde_json::to_string(cache) {
            self.storage.set(keys::LICENSE, &raw);
        }
    }

    fn clear_cache(&self) {
        self.storage.remove(keys::LICENSE);
    }

    // ==================== State ====================

    /// Current license state, derived entirely from the cache.
    pub fn current_state(&self) -> LicenseState {
        match self.cached() {
            Some(cache) => cache.state(
                Utc::now().timestamp(),
                self.phone_home_interval.as_secs() as i64,
                self.grace_period.as_secs() as i64,
            ),
            None => LicenseState::NotActivated,
        }
    }

    /// Whether the application should block licensed functionality.
    pub fn is_blocked(&self) -> bool {
        self.current_state().is_blocked()
    }

    /// Whether a feature is enabled.
    ///
    /// NotActivated reports every feature enabled - evaluation installs
    /// run fully featured until a license enters the picture. Once
    /// activated the cached feature list decides, and blocked states
    /// gate everything off.
    pub fn has_feature(&self, feature: &str) -> bool {
        match self.current_state() {
            LicenseState::NotActivated => true,
            state if state.is_blocked() => false,
            _ => self.cached().is_some_and(|c| c.has_feature(feature)),
        }
    }

    // ==================== Server Operations ====================

    /// Activate this machine against the server.
    pub async fn activate(&self, license_key: &str) -> Result<ActivateResponse> {
        // Reject tampered keys locally when we can.
        if let Some(ref public_key) = self.public_key {
            if verify_key(public_key, license_key).is_none() {
                return Err(SdkError::InvalidKey);
            }
        }

        let request = ActivateRequest {
            license_key: license_key.to_string(),
            hardware_id: self.hardware_id.clone(),
            machine_name: get_machine_name(),
            os_info: Some(get_os_info()),
        };

        let response = self
            .http
            .post(format!("{}/activate", self.base_url))
            .json(&request)
            .send()
            .await?;
        let result: ActivateResponse = expect_success(response).await?;

        self.save_cache(&CachedLicense {
            license_key: license_key.to_string(),
            hardware_id: self.hardware_id.clone(),
            activation_id: result.activation_id.clone(),
            tier: result.tier.clone(),
            features: result.features.clone(),
            expires_at: result.expires_at,
            last_validated: Utc::now().timestamp(),
            revoked: false,
        });

        Ok(result)
    }

    /// Release this machine's activation, freeing a seat, and forget the
    /// cached license.
    pub async fn deactivate(&self) -> Result<()> {
        let cache = self.cached().ok_or(SdkError::NotActivated)?;

        let request = DeactivateRequest {
            license_key: cache.license_key,
            hardware_id: self.hardware_id.clone(),
        };

        let response = self
            .http
            .post(format!("{}/deactivate", self.base_url))
            .json(&request)
            .send()
            .await?;
        let _: serde_json::Value = expect_success(response).await?;

        self.clear_cache();
        Ok(())
    }

    /// Revalidate against the server and fold the verdict into the cache.
    ///
    /// Network failures leave the cache untouched; the state machine
    /// degrades through GracePeriod on its own as the verdict ages.
    pub async fn phone_home(&self) -> Result<PhoneHomeResponse> {
        let mut cache = self.cached().ok_or(SdkError::NotActivated)?;

        let request = PhoneHomeRequest {
            license_key: cache.license_key.clone(),
            hardware_id: self.hardware_id.clone(),
        };

        let response = self
            .http
            .post(format!("{}/phone-home", self.base_url))
            .json(&request)
            .send()
            .await?;
        let result: PhoneHomeResponse = expect_success(response).await?;
        self.apply_verdict(&mut cache, &result);
        Ok(result)
    }

    /// Fold a phone-home answer into the cached license.
    ///
    /// Branches on the server's machine-readable `reason` code, never on
    /// the human-facing message text. Unknown reasons leave the cache as
    /// is and let the state machine degrade through GracePeriod.
    fn apply_verdict(&self, cache: &mut CachedLicense, result: &PhoneHomeResponse) {
        if result.valid {
            cache.last_validated = Utc::now().timestamp();
            cache.revoked = false;
            if let Some(tier) = &result.tier {
                cache.tier = tier.clone();
            }
            if let Some(expires_at) = result.expires_at {
                cache.expires_at = expires_at;
            }
            self.save_cache(cache);
            return;
        }

        match result.reason.as_deref() {
            Some(reason::REVOKED) => {
                cache.revoked = true;
                self.save_cache(cache);
            }
            Some(reason::NO_ACTIVE_ACTIVATION) => {
                // The server no longer knows this binding; back to square one.
                self.clear_cache();
            }
            Some(reason::EXPIRED) => {
                if let Some(expires_at) = result.expires_at {
                    cache.expires_at = expires_at;
                }
                // Even without a timestamp the verdict stops refreshing
                // last_validated, so expiry asserts itself locally.
                self.save_cache(cache);
            }
            _ => {}
        }
    }

    /// Spawn the periodic phone-home loop.
    ///
    /// One timer task per client; overlapping ticks are skipped rather
    /// than queued. Abort the returned handle to stop the loop.
    pub fn start_phone_home_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(client.phone_home_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it, activation just
            // validated.
            interval.tick().await;

            loop {
                interval.tick().await;

                if client
                    .phone_home_running
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    continue;
                }
                let _ = client.phone_home().await;
                client.phone_home_running.store(false, Ordering::SeqCst);
            }
        })
    }
}

impl std::fmt::Debug for LicenseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicenseClient")
            .field("base_url", &self.base_url)
            .field("hardware_id", &self.hardware_id)
            .finish()
    }
}

/// Deserialize a success body, or surface the server's `{error}` message.
async fn expect_success<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        Ok(response.json().await?)
    } else {
        let message = response
            .json::<ApiErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| status.to_string());
        Err(SdkError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
