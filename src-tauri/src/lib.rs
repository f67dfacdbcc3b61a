pub mod events;
pub mod models;
pub mod notifications;
pub mod screens;
pub mod storage;

use chrono::{SecondsFormat, Utc};
use models::{
    creation_timestamp_id, AddAlarmView, Alarm, BootstrapState, DeleteAlarmInput, Route,
    RuntimeErrorEvent, SaveBarcodeInput, SaveOutcome, SavedBarcode, SelectBarcodeInput,
    SetAlarmLabelInput, SetAlarmTimeInput, ToggleAlarmInput,
};
use notifications::{NotificationService, PermissionVerdict};
use screens::{AddAlarmScreen, HomeScreen};
use storage::StorageService;
use tauri::{AppHandle, Emitter, Manager, State};

struct AppState {
    storage: StorageService,
    notifications: NotificationService,
    home: HomeScreen,
    add_alarm: AddAlarmScreen,
}

#[tauri::command]
async fn get_bootstrap_state(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<BootstrapState, String> {
    let alarms = state.home.load().map_err(to_string_error)?;
    let saved_barcodes = state.storage.get_barcodes().map_err(to_string_error)?;

    let verdict = state
        .notifications
        .request_permissions()
        .map_err(to_string_error)?;
    if !verdict.granted {
        emit_permission_denied(&app, &verdict);
    }

    Ok(BootstrapState {
        alarms,
        saved_barcodes,
        notifications_granted: verdict.granted,
        platform: std::env::consts::OS.to_string(),
    })
}

#[tauri::command]
async fn list_alarms(state: State<'_, AppState>) -> Result<Vec<Alarm>, String> {
    state.home.load().map_err(to_string_error)
}

#[tauri::command]
async fn toggle_alarm(
    app: AppHandle,
    state: State<'_, AppState>,
    input: ToggleAlarmInput,
) -> Result<Vec<Alarm>, String> {
    let alarms = state.home.toggle(&input.id).map_err(to_string_error)?;
    emit_alarms_changed(&app, &alarms);
    Ok(alarms)
}

#[tauri::command]
async fn delete_alarm(
    app: AppHandle,
    state: State<'_, AppState>,
    input: DeleteAlarmInput,
) -> Result<Vec<Alarm>, String> {
    let alarms = state.home.delete(&input.id).map_err(to_string_error)?;
    emit_alarms_changed(&app, &alarms);
    Ok(alarms)
}

#[tauri::command]
async fn open_add_alarm(state: State<'_, AppState>) -> Result<AddAlarmView, String> {
    state.add_alarm.open().await.map_err(to_string_error)
}

#[tauri::command]
async fn set_alarm_time(
    state: State<'_, AppState>,
    input: SetAlarmTimeInput,
) -> Result<AddAlarmView, String> {
    state
        .add_alarm
        .set_time(input.hour, input.minute)
        .await
        .map_err(to_string_error)
}

#[tauri::command]
async fn set_alarm_label(
    state: State<'_, AppState>,
    input: SetAlarmLabelInput,
) -> Result<AddAlarmView, String> {
    state
        .add_alarm
        .set_label(input.label)
        .await
        .map_err(to_string_error)
}

#[tauri::command]
async fn select_alarm_barcode(
    state: State<'_, AppState>,
    input: SelectBarcodeInput,
) -> Result<AddAlarmView, String> {
    state
        .add_alarm
        .select_barcode(input.barcode_id)
        .await
        .map_err(to_string_error)
}

#[tauri::command]
async fn save_alarm(app: AppHandle, state: State<'_, AppState>) -> Result<SaveOutcome, String> {
    let outcome = state.add_alarm.save().await.map_err(to_string_error)?;
    let alarms = state.home.load().map_err(to_string_error)?;
    emit_alarms_changed(&app, &alarms);
    Ok(outcome)
}

#[tauri::command]
async fn cancel_add_alarm(state: State<'_, AppState>) -> Result<Route, String> {
    Ok(state.add_alarm.cancel().await)
}

#[tauri::command]
async fn list_saved_barcodes(state: State<'_, AppState>) -> Result<Vec<SavedBarcode>, String> {
    state.storage.get_barcodes().map_err(to_string_error)
}

#[tauri::command]
async fn save_barcode(
    app: AppHandle,
    state: State<'_, AppState>,
    input: SaveBarcodeInput,
) -> Result<SavedBarcode, String> {
    let barcode = SavedBarcode {
        id: creation_timestamp_id(),
        data: input.data,
        symbology: input.symbology,
        label: input.label,
        captured_at: now_iso(),
    };

    let mut barcodes = state.storage.get_barcodes().map_err(to_string_error)?;
    barcodes.push(barcode.clone());
    state
        .storage
        .save_barcodes(&barcodes)
        .map_err(to_string_error)?;

    emit_barcodes_changed(&app, &barcodes);
    Ok(barcode)
}

#[tauri::command]
async fn request_notification_permissions(
    app: AppHandle,
    state: State<'_, AppState>,
) -> Result<PermissionVerdict, String> {
    let verdict = state
        .notifications
        .request_permissions()
        .map_err(to_string_error)?;
    if !verdict.granted {
        emit_permission_denied(&app, &verdict);
    }
    Ok(verdict)
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::init();

    tauri::Builder::default()
        .plugin(tauri_plugin_notification::init())
        .setup(|app| {
            let storage = StorageService::new(resolve_data_dir());
            let notifications = NotificationService::platform(app.handle().clone());
            let app_state = AppState {
                home: HomeScreen::new(storage.clone(), notifications.clone()),
                add_alarm: AddAlarmScreen::new(storage.clone(), notifications.clone()),
                storage,
                notifications,
            };
            app.manage(app_state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_bootstrap_state,
            list_alarms,
            toggle_alarm,
            delete_alarm,
            open_add_alarm,
            set_alarm_time,
            set_alarm_label,
            select_alarm_barcode,
            save_alarm,
            cancel_add_alarm,
            list_saved_barcodes,
            save_barcode,
            request_notification_permissions
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

fn emit_alarms_changed(app: &AppHandle, alarms: &[Alarm]) {
    let _ = app.emit(events::EVENT_ALARMS_CHANGED, alarms);
}

fn emit_barcodes_changed(app: &AppHandle, barcodes: &[SavedBarcode]) {
    let _ = app.emit(events::EVENT_BARCODES_CHANGED, barcodes);
}

fn emit_permission_denied(app: &AppHandle, verdict: &PermissionVerdict) {
    let message = verdict
        .message
        .clone()
        .unwrap_or_else(|| "Notification permission was not granted".to_string());
    log::warn!("notification permission denied: {message}");
    let _ = app.emit(
        events::EVENT_RUNTIME_ERROR,
        RuntimeErrorEvent {
            code: "NOTIFICATIONS_UNAVAILABLE".to_string(),
            message,
            source: "notifications".to_string(),
        },
    );
}

fn resolve_data_dir() -> std::path::PathBuf {
    if let Some(dir) = dirs::data_local_dir() {
        return dir.join("scanwake");
    }

    std::env::current_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join(".scanwake")
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_string_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}
