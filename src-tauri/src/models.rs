use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

static LAST_ISSUED_ID: AtomicU64 = AtomicU64::new(0);

/// Record ids are creation timestamps (millisecond decimal strings). Two
/// records minted inside the same millisecond would collide, so the counter
/// never goes backwards.
pub fn creation_timestamp_id() -> String {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_ISSUED_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ISSUED_ID.compare_exchange(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return candidate.to_string(),
            Err(observed) => last = observed,
        }
    }
}

/// Wall-clock alarm time. Whatever date the picker produced is stripped at
/// the screen boundary; scheduling is always daily-repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmTime {
    pub hour: u32,
    pub minute: u32,
}

impl AlarmTime {
    pub fn now_local() -> Self {
        let now = Local::now().time();
        Self {
            hour: now.hour(),
            minute: now.minute(),
        }
    }
}

/// Scheduling state against the host notification service. A tagged sum
/// rather than an optional handle, so every consumer handles both cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ScheduleState {
    Scheduled { id: String },
    Unscheduled,
}

impl ScheduleState {
    pub fn handle(&self) -> Option<&str> {
        match self {
            Self::Scheduled { id } => Some(id),
            Self::Unscheduled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: String,
    pub time: AlarmTime,
    pub label: String,
    pub enabled: bool,
    pub barcode_id: String,
    pub schedule: ScheduleState,
    // Carried on the wire for compatibility with existing records; no
    // behavior is attached to it yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_days: Option<Vec<u8>>,
}

/// A captured barcode usable as a dismissal key. Immutable once created;
/// there is no update or delete surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBarcode {
    pub id: String,
    pub data: String,
    pub symbology: String,
    pub label: String,
    pub captured_at: String,
}

/// Named navigation destinations of the shell. `ScanBarcode` threads the
/// caller back through `return_to` once the external scan screen finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Route {
    Home,
    AddAlarm,
    ScanBarcode { return_to: Box<Route> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapState {
    pub alarms: Vec<Alarm>,
    pub saved_barcodes: Vec<SavedBarcode>,
    pub notifications_granted: bool,
    pub platform: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAlarmInput {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAlarmInput {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAlarmTimeInput {
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAlarmLabelInput {
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectBarcodeInput {
    pub barcode_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBarcodeInput {
    pub data: String,
    pub symbology: String,
    #[serde(default)]
    pub label: String,
}

/// What the add-alarm screen renders for the barcode requirement: a scan
/// action when nothing was ever captured, a selection list otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BarcodeOptions {
    ScanFirst { scan: Route },
    Choose { barcodes: Vec<SavedBarcode> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAlarmView {
    pub time: AlarmTime,
    pub label: String,
    pub selected_barcode: Option<String>,
    pub barcode_options: BarcodeOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub alarm: Alarm,
    pub navigate_to: Route,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeErrorEvent {
    pub code: String,
    pub message: String,
    pub source: String,
}
