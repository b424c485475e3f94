//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "session": { "userId": "admin-1" },
//!   "import": { "dateOrder": "monthFirst", "strictAmounts": false, "extraSynonyms": { "driver": ["chofer"] } },
//!   "analytics": { "projectionLookbackWeeks": 12 }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    session: SessionSettings,
    #[serde(default)]
    import: ImportSettings,
    #[serde(default)]
    analytics: AnalyticsSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// The locally signed-in user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Which component comes first in slash/dash dates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateOrder {
    #[default]
    MonthFirst,
    DayFirst,
}

/// CSV import behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSettings {
    #[serde(default)]
    pub date_order: DateOrder,
    /// Reject the whole row when any earning amount is invalid
    #[serde(default)]
    pub strict_amounts: bool,
    #[serde(default = "default_max_amount")]
    pub max_amount: Decimal,
    /// Additional header synonyms keyed by field name (`date`, `driver`, `uber`, ...)
    #[serde(default)]
    pub extra_synonyms: HashMap<String, Vec<String>>,
}

fn default_max_amount() -> Decimal {
    Decimal::new(99_999_999, 2)
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            date_order: DateOrder::default(),
            strict_amounts: false,
            max_amount: default_max_amount(),
            extra_synonyms: HashMap::new(),
        }
    }
}

/// Analytics tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSettings {
    #[serde(default = "default_lookback_weeks")]
    pub projection_lookback_weeks: u32,
    /// A day above mean * ratio is flagged as a spike
    #[serde(default = "default_high_ratio")]
    pub anomaly_high_ratio: Decimal,
    /// A day below mean * ratio is flagged as a drop
    #[serde(default = "default_low_ratio")]
    pub anomaly_low_ratio: Decimal,
    /// Minimum observations per driver before flagging anything
    #[serde(default = "default_min_samples")]
    pub anomaly_min_samples: usize,
}

fn default_lookback_weeks() -> u32 {
    12
}

fn default_high_ratio() -> Decimal {
    Decimal::from(2)
}

fn default_low_ratio() -> Decimal {
    Decimal::new(5, 1)
}

fn default_min_samples() -> usize {
    5
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            projection_lookback_weeks: default_lookback_weeks(),
            anomaly_high_ratio: default_high_ratio(),
            anomaly_low_ratio: default_low_ratio(),
            anomaly_min_samples: default_min_samples(),
        }
    }
}

/// FleetLedger configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Session as stored in settings.json
    pub session: SessionSettings,
    pub import: ImportSettings,
    pub analytics: AnalyticsSettings,
    /// Read-time user override, never saved
    user_override: Option<String>,
}

impl Config {
    /// Load config from the data directory
    ///
    /// `FLEETLEDGER_USER_ID` overrides the stored session user for this process.
    pub fn load(data_dir: &Path) -> Result<Self> {
        Self::load_with_user_override(data_dir, std::env::var("FLEETLEDGER_USER_ID").ok())
    }

    pub fn load_with_user_override(data_dir: &Path, user_override: Option<String>) -> Result<Self> {
        let raw = Self::read_settings(data_dir)?;
        Ok(Self {
            session: raw.session,
            import: raw.import,
            analytics: raw.analytics,
            user_override: user_override
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        })
    }

    /// The signed-in user: the override if set, otherwise the stored session
    pub fn user_id(&self) -> Option<&str> {
        self.user_override
            .as_deref()
            .or(self.session.user_id.as_deref())
    }

    /// Save config to the data directory, keeping keys this crate doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = Self::read_settings(data_dir)?;

        settings.session = self.session.clone();
        settings.import = self.import.clone();
        settings.analytics = self.analytics.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(data_dir.join("settings.json"), content)?;
        Ok(())
    }

    fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
        let settings_path = data_dir.join("settings.json");
        if !settings_path.exists() {
            return Ok(SettingsFile::default());
        }
        let content = std::fs::read_to_string(&settings_path)?;
        match serde_json::from_str(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(path = %settings_path.display(), error = %e, "ignoring unreadable settings file");
                Ok(SettingsFile::default())
            }
        }
    }
}
