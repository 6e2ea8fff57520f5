//! The run record and its grouping axis.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::format_seconds_as_hhmmss;
use crate::hydrate::Hydrate;

/// Wire format for `run_date`.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Aggregation axis for run listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl GroupBy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One run record as stored by the service.
///
/// `id` is `None` until the record has been persisted; a `Some` id switches
/// save from create to update semantics. `pace` is derived server-side and
/// never sent back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunData {
    pub id: Option<i64>,
    pub run_date: NaiveDate,
    pub distance_m: f64,
    pub duration_s: u64,
    pub calories: f64,
    pub vo2max: f64,
    pub pace: f64,
}

impl RunData {
    /// Distance in kilometers, formatted to two decimal places.
    #[must_use]
    pub fn distance_km(&self) -> String {
        format!("{:.2}", self.distance_m / 1000.0)
    }

    /// Duration as zero-padded `HH:MM:SS`.
    #[must_use]
    pub fn duration_hhmmss(&self) -> String {
        format_seconds_as_hhmmss(self.duration_s)
    }

    /// Request body for create/update: identity plus every data field
    /// except the server-derived `pace`, with `run_date` normalized to
    /// ISO `YYYY-MM-DD`.
    #[must_use]
    pub fn save_body(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "run_date": self.run_date.format(ISO_DATE_FORMAT).to_string(),
            "distance_m": self.distance_m,
            "duration_s": self.duration_s,
            "calories": self.calories,
            "vo2max": self.vo2max,
        })
    }
}

impl Hydrate for RunData {
    fn apply_field(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "id" => match value {
                Value::Null => {
                    self.id = None;
                    true
                }
                _ => value
                    .as_i64()
                    .map(|id| {
                        self.id = Some(id);
                    })
                    .is_some(),
            },
            "run_date" => value
                .as_str()
                .and_then(|raw| NaiveDate::parse_from_str(raw, ISO_DATE_FORMAT).ok())
                .map(|date| {
                    self.run_date = date;
                })
                .is_some(),
            "distance_m" => value
                .as_f64()
                .map(|distance| {
                    self.distance_m = distance;
                })
                .is_some(),
            "duration_s" => value
                .as_u64()
                .map(|duration| {
                    self.duration_s = duration;
                })
                .is_some(),
            "calories" => value
                .as_f64()
                .map(|calories| {
                    self.calories = calories;
                })
                .is_some(),
            "vo2max" => value
                .as_f64()
                .map(|vo2max| {
                    self.vo2max = vo2max;
                })
                .is_some(),
            "pace" => value
                .as_f64()
                .map(|pace| {
                    self.pace = pace;
                })
                .is_some(),
            _ => false,
        }
    }
}
