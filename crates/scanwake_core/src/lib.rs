use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

type SharedCallback = Arc<dyn Fn(&str, &Value) + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmTime {
    pub hour: u32,
    pub minute: u32,
}

/// Scheduling state of an alarm against the host notification service.
/// Modeled as a tagged sum instead of an optional handle so every consumer
/// has to handle the unscheduled case.
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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: String,
    pub time: AlarmTime,
    pub label: String,
    pub enabled: bool,
    pub barcode_id: String,
    pub schedule: ScheduleState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_days: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBarcode {
    pub id: String,
    pub data: String,
    pub symbology: String,
    pub label: String,
    pub captured_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeRequest {
    pub command: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<InvokeError>,
}

pub const EVENT_ALARMS_CHANGED: &str = "alarms://changed";
pub const EVENT_BARCODES_CHANGED: &str = "barcodes://changed";

struct RuntimeState {
    alarms: Vec<Alarm>,
    barcodes: Vec<SavedBarcode>,
}

/// Embeddable runtime for native shells that host the alarm logic without a
/// webview. Constructed explicitly at startup; nothing here registers itself
/// as a side effect of being linked in.
pub struct Runtime {
    config: RuntimeConfig,
    state: Mutex<RuntimeState>,
    callback: Mutex<Option<SharedCallback>>,
}

impl Runtime {
    pub fn new(config_json: &str) -> anyhow::Result<Self> {
        let config = if config_json.trim().is_empty() {
            RuntimeConfig {
                data_dir: None,
                platform: Some(std::env::consts::OS.to_string()),
            }
        } else {
            serde_json::from_str(config_json)?
        };

        Ok(Self {
            config,
            state: Mutex::new(RuntimeState {
                alarms: Vec::new(),
                barcodes: Vec::new(),
            }),
            callback: Mutex::new(None),
        })
    }

    pub fn set_event_callback<F>(&self, callback: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        let mut guard = self.callback.lock().expect("callback mutex poisoned");
        *guard = Some(Arc::new(callback));
    }

    pub fn clear_event_callback(&self) {
        let mut guard = self.callback.lock().expect("callback mutex poisoned");
        *guard = None;
    }

    pub fn invoke_json(&self, request_json: &str) -> String {
        let parsed = serde_json::from_str::<InvokeRequest>(request_json);
        let response = match parsed {
            Ok(request) => self.dispatch(request),
            Err(error) => Err(InvokeError {
                code: "invalid_request".to_string(),
                message: format!("invalid request JSON: {error}"),
            }),
        };

        let payload = match response {
            Ok(data) => InvokeResponse {
                ok: true,
                data: Some(data),
                error: None,
            },
            Err(error) => InvokeResponse {
                ok: false,
                data: None,
                error: Some(error),
            },
        };

        serde_json::to_string(&payload).unwrap_or_else(|_| {
            r#"{"ok":false,"error":{"code":"serialization_failure","message":"failed to serialize response"}}"#
                .to_string()
        })
    }

    fn dispatch(&self, request: InvokeRequest) -> Result<Value, InvokeError> {
        match request.command.as_str() {
            "get_bootstrap_state" => self.get_bootstrap_state(),
            "list_alarms" => {
                let state = self.state.lock().expect("runtime state mutex poisoned");
                Ok(serde_json::to_value(&state.alarms).unwrap_or_else(|_| json!([])))
            }
            "toggle_alarm" => self.toggle_alarm(request.payload),
            "delete_alarm" => self.delete_alarm(request.payload),
            "save_alarm" => self.save_alarm(request.payload),
            "list_saved_barcodes" => {
                let state = self.state.lock().expect("runtime state mutex poisoned");
                Ok(serde_json::to_value(&state.barcodes).unwrap_or_else(|_| json!([])))
            }
            "save_barcode" => self.save_barcode(request.payload),
            "request_notification_permissions" => Ok(json!({
                "granted": false,
                "note": "FFI runtime skeleton has no host notification service attached"
            })),
            _ => Err(InvokeError {
                code: "unknown_command".to_string(),
                message: format!("unsupported command: {}", request.command),
            }),
        }
    }

    fn get_bootstrap_state(&self) -> Result<Value, InvokeError> {
        let state = self.state.lock().expect("runtime state mutex poisoned");
        let platform = self
            .config
            .platform
            .clone()
            .unwrap_or_else(|| std::env::consts::OS.to_string());

        Ok(json!({
            "alarms": state.alarms,
            "savedBarcodes": state.barcodes,
            "notificationsGranted": false,
            "platform": platform,
        }))
    }

    fn toggle_alarm(&self, payload: Value) -> Result<Value, InvokeError> {
        #[derive(Deserialize)]
        struct Input {
            id: String,
        }

        let input = serde_json::from_value::<Input>(payload).map_err(invalid_payload)?;
        let mut state = self.state.lock().expect("runtime state mutex poisoned");
        let Some(alarm) = state.alarms.iter_mut().find(|alarm| alarm.id == input.id) else {
            return Err(InvokeError {
                code: "unknown_alarm".to_string(),
                message: format!("no alarm with id {}", input.id),
            });
        };

        alarm.enabled = !alarm.enabled;
        alarm.schedule = if alarm.enabled {
            // no real scheduler attached; re-enabling still mints a fresh handle
            ScheduleState::Scheduled {
                id: Uuid::new_v4().to_string(),
            }
        } else {
            ScheduleState::Unscheduled
        };

        let snapshot = serde_json::to_value(&state.alarms).unwrap_or_else(|_| json!([]));
        drop(state);
        self.emit_event(EVENT_ALARMS_CHANGED, &snapshot);
        Ok(snapshot)
    }

    fn delete_alarm(&self, payload: Value) -> Result<Value, InvokeError> {
        #[derive(Deserialize)]
        struct Input {
            id: String,
        }

        let input = serde_json::from_value::<Input>(payload).map_err(invalid_payload)?;
        let mut state = self.state.lock().expect("runtime state mutex poisoned");
        state.alarms.retain(|alarm| alarm.id != input.id);

        let snapshot = serde_json::to_value(&state.alarms).unwrap_or_else(|_| json!([]));
        drop(state);
        self.emit_event(EVENT_ALARMS_CHANGED, &snapshot);
        Ok(snapshot)
    }

    fn save_alarm(&self, payload: Value) -> Result<Value, InvokeError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Input {
            hour: u32,
            minute: u32,
            #[serde(default)]
            label: String,
            #[serde(default)]
            barcode_id: String,
        }

        let input = serde_json::from_value::<Input>(payload).map_err(invalid_payload)?;
        if input.barcode_id.is_empty() {
            return Err(InvokeError {
                code: "barcode_not_selected".to_string(),
                message: "select a barcode to disable this alarm".to_string(),
            });
        }
        if input.hour > 23 || input.minute > 59 {
            return Err(InvokeError {
                code: "invalid_time".to_string(),
                message: format!("{:02}:{:02} is not a wall-clock time", input.hour, input.minute),
            });
        }

        let mut state = self.state.lock().expect("runtime state mutex poisoned");
        if !state
            .barcodes
            .iter()
            .any(|barcode| barcode.id == input.barcode_id)
        {
            return Err(InvokeError {
                code: "unknown_barcode".to_string(),
                message: format!("no saved barcode with id {}", input.barcode_id),
            });
        }

        let alarm = Alarm {
            id: mint_record_id(),
            time: AlarmTime {
                hour: input.hour,
                minute: input.minute,
            },
            label: if input.label.is_empty() {
                "Alarm".to_string()
            } else {
                input.label
            },
            enabled: true,
            barcode_id: input.barcode_id,
            schedule: ScheduleState::Scheduled {
                id: Uuid::new_v4().to_string(),
            },
            repeat_days: None,
        };

        state.alarms.push(alarm.clone());
        let snapshot = serde_json::to_value(&state.alarms).unwrap_or_else(|_| json!([]));
        drop(state);
        self.emit_event(EVENT_ALARMS_CHANGED, &snapshot);
        Ok(serde_json::to_value(alarm).unwrap_or_else(|_| json!({})))
    }

    fn save_barcode(&self, payload: Value) -> Result<Value, InvokeError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Input {
            data: String,
            symbology: String,
            #[serde(default)]
            label: String,
        }

        let input = serde_json::from_value::<Input>(payload).map_err(invalid_payload)?;
        let barcode = SavedBarcode {
            id: mint_record_id(),
            data: input.data,
            symbology: input.symbology,
            label: input.label,
            captured_at: epoch_millis_now().to_string(),
        };

        let mut state = self.state.lock().expect("runtime state mutex poisoned");
        state.barcodes.push(barcode.clone());
        let snapshot = serde_json::to_value(&state.barcodes).unwrap_or_else(|_| json!([]));
        drop(state);
        self.emit_event(EVENT_BARCODES_CHANGED, &snapshot);
        Ok(serde_json::to_value(barcode).unwrap_or_else(|_| json!({})))
    }

    fn emit_event(&self, event: &str, payload: &Value) {
        let callback = {
            let guard = self.callback.lock().expect("callback mutex poisoned");
            guard.clone()
        };
        if let Some(callback) = callback {
            let event_payload = json!({
                "event": event,
                "payload": payload
            });
            callback(event, &event_payload);
        }
    }
}

fn invalid_payload(error: serde_json::Error) -> InvokeError {
    InvokeError {
        code: "invalid_payload".to_string(),
        message: error.to_string(),
    }
}

fn epoch_millis_now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or_default()
}

/// Record ids are creation timestamps. Two records minted inside the same
/// millisecond would collide, so the counter never goes backwards.
fn mint_record_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

    let now = epoch_millis_now();
    let mut last = LAST_ISSUED.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ISSUED.compare_exchange(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate.to_string(),
            Err(observed) => last = observed,
        }
    }
}
