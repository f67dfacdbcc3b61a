use anyhow::Result;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    models::{
        creation_timestamp_id, AddAlarmView, Alarm, AlarmTime, BarcodeOptions, Route, SaveOutcome,
        SavedBarcode, ScheduleState,
    },
    notifications::NotificationService,
    storage::StorageService,
};

const DEFAULT_LABEL: &str = "Alarm";

/// Rejections the user sees as alerts. Everything else on this screen is an
/// infrastructure failure and propagates untranslated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SaveAlarmError {
    #[error("Please select a barcode to disable this alarm")]
    NoBarcodeSelected,
    #[error("no saved barcode with id {0}")]
    UnknownBarcode(String),
    #[error("the add-alarm screen is not open")]
    NoDraft,
}

#[derive(Debug, Clone)]
struct AlarmDraft {
    time: AlarmTime,
    label: String,
    selected_barcode: Option<String>,
    barcodes: Vec<SavedBarcode>,
}

impl AlarmDraft {
    fn view(&self) -> AddAlarmView {
        AddAlarmView {
            time: self.time,
            label: self.label.clone(),
            selected_barcode: self.selected_barcode.clone(),
            barcode_options: if self.barcodes.is_empty() {
                BarcodeOptions::ScanFirst {
                    scan: Route::ScanBarcode {
                        return_to: Box::new(Route::AddAlarm),
                    },
                }
            } else {
                BarcodeOptions::Choose {
                    barcodes: self.barcodes.clone(),
                }
            },
        }
    }
}

/// Draft state machine behind the add-alarm screen. Two fields are required
/// before save goes through: a time (defaulted to the wall clock at open)
/// and a barcode selected from the captured collection.
pub struct AddAlarmScreen {
    storage: StorageService,
    notifications: NotificationService,
    draft: Mutex<Option<AlarmDraft>>,
}

impl AddAlarmScreen {
    pub fn new(storage: StorageService, notifications: NotificationService) -> Self {
        Self {
            storage,
            notifications,
            draft: Mutex::new(None),
        }
    }

    pub async fn open(&self) -> Result<AddAlarmView> {
        let barcodes = self.storage.get_barcodes()?;
        let draft = AlarmDraft {
            time: AlarmTime::now_local(),
            label: String::new(),
            selected_barcode: None,
            barcodes,
        };

        let view = draft.view();
        *self.draft.lock().await = Some(draft);
        Ok(view)
    }

    pub async fn set_time(&self, hour: u32, minute: u32) -> Result<AddAlarmView> {
        if hour > 23 || minute > 59 {
            anyhow::bail!("{hour:02}:{minute:02} is not a wall-clock time");
        }

        let mut guard = self.draft.lock().await;
        let draft = guard.as_mut().ok_or(SaveAlarmError::NoDraft)?;
        draft.time = AlarmTime { hour, minute };
        Ok(draft.view())
    }

    pub async fn set_label(&self, label: String) -> Result<AddAlarmView> {
        let mut guard = self.draft.lock().await;
        let draft = guard.as_mut().ok_or(SaveAlarmError::NoDraft)?;
        draft.label = label;
        Ok(draft.view())
    }

    /// Only identifiers present in the captured collection are selectable;
    /// this is where the armed-alarm-references-a-real-barcode invariant is
    /// enforced, not in the data layer.
    pub async fn select_barcode(&self, barcode_id: String) -> Result<AddAlarmView> {
        let mut guard = self.draft.lock().await;
        let draft = guard.as_mut().ok_or(SaveAlarmError::NoDraft)?;

        if !draft.barcodes.iter().any(|barcode| barcode.id == barcode_id) {
            return Err(SaveAlarmError::UnknownBarcode(barcode_id).into());
        }

        draft.selected_barcode = Some(barcode_id);
        Ok(draft.view())
    }

    /// Schedules first to obtain the platform handle, then appends the fully
    /// formed alarm and persists the whole sequence. Without a selected
    /// barcode nothing happens at all: no storage write, no schedule call.
    pub async fn save(&self) -> Result<SaveOutcome> {
        let mut guard = self.draft.lock().await;
        let draft = guard.as_ref().ok_or(SaveAlarmError::NoDraft)?;
        let Some(barcode_id) = draft.selected_barcode.clone() else {
            return Err(SaveAlarmError::NoBarcodeSelected.into());
        };

        let mut alarm = Alarm {
            id: creation_timestamp_id(),
            time: draft.time,
            label: if draft.label.trim().is_empty() {
                DEFAULT_LABEL.to_string()
            } else {
                draft.label.clone()
            },
            enabled: true,
            barcode_id,
            schedule: ScheduleState::Unscheduled,
            repeat_days: None,
        };

        let handle = self.notifications.schedule_alarm(&alarm)?;
        alarm.schedule = ScheduleState::Scheduled { id: handle };

        let mut alarms = self.storage.get_alarms()?;
        alarms.push(alarm.clone());
        self.storage.save_alarms(&alarms)?;

        *guard = None;
        Ok(SaveOutcome {
            alarm,
            navigate_to: Route::Home,
        })
    }

    pub async fn cancel(&self) -> Route {
        *self.draft.lock().await = None;
        Route::Home
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::tempdir;

    use crate::notifications::testing::RecordingScheduler;

    use super::*;

    fn barcode(id: &str) -> SavedBarcode {
        SavedBarcode {
            id: id.to_string(),
            data: "9002236311036".to_string(),
            symbology: "ean13".to_string(),
            label: "Cereal box".to_string(),
            captured_at: "2025-11-02T06:15:00.000Z".to_string(),
        }
    }

    fn screen_with_barcodes(
        barcodes: &[SavedBarcode],
    ) -> (AddAlarmScreen, Arc<RecordingScheduler>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let storage = StorageService::new(dir.path().to_path_buf());
        storage.save_barcodes(barcodes).unwrap();

        let scheduler = Arc::new(RecordingScheduler::default());
        let notifications = NotificationService::with_scheduler(scheduler.clone());
        (
            AddAlarmScreen::new(storage.clone(), notifications),
            scheduler,
            dir,
        )
    }

    #[tokio::test]
    async fn opening_without_captures_offers_the_scan_route() {
        let (screen, _, _dir) = screen_with_barcodes(&[]);

        let view = screen.open().await.unwrap();
        assert_eq!(
            view.barcode_options,
            BarcodeOptions::ScanFirst {
                scan: Route::ScanBarcode {
                    return_to: Box::new(Route::AddAlarm),
                },
            }
        );
        assert!(view.selected_barcode.is_none());
    }

    #[tokio::test]
    async fn opening_with_captures_offers_the_selection_list() {
        let (screen, _, _dir) = screen_with_barcodes(&[barcode("B1"), barcode("B2")]);

        let view = screen.open().await.unwrap();
        let BarcodeOptions::Choose { barcodes } = view.barcode_options else {
            panic!("expected a selection list");
        };
        assert_eq!(barcodes.len(), 2);
    }

    #[tokio::test]
    async fn save_without_a_selection_has_no_side_effect() {
        let (screen, scheduler, dir) = screen_with_barcodes(&[barcode("B1")]);
        let storage = StorageService::new(dir.path().to_path_buf());

        screen.open().await.unwrap();
        let error = screen.save().await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<SaveAlarmError>(),
            Some(&SaveAlarmError::NoBarcodeSelected)
        );

        assert!(storage.get_alarms().unwrap().is_empty());
        assert!(scheduler.scheduled.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn selecting_a_barcode_that_was_never_captured_is_rejected() {
        let (screen, _, _dir) = screen_with_barcodes(&[barcode("B1")]);

        screen.open().await.unwrap();
        let error = screen.select_barcode("B9".to_string()).await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<SaveAlarmError>(),
            Some(&SaveAlarmError::UnknownBarcode("B9".to_string()))
        );
    }

    #[tokio::test]
    async fn mutating_a_screen_that_is_not_open_is_rejected() {
        let (screen, _, _dir) = screen_with_barcodes(&[barcode("B1")]);

        let error = screen.set_label("Gym".to_string()).await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<SaveAlarmError>(),
            Some(&SaveAlarmError::NoDraft)
        );
    }

    #[tokio::test]
    async fn out_of_range_times_never_reach_the_draft() {
        let (screen, _, _dir) = screen_with_barcodes(&[barcode("B1")]);

        screen.open().await.unwrap();
        assert!(screen.set_time(24, 0).await.is_err());
        assert!(screen.set_time(7, 60).await.is_err());
    }

    #[tokio::test]
    async fn accepted_save_persists_a_scheduled_alarm_and_navigates_home() {
        let (screen, scheduler, dir) = screen_with_barcodes(&[barcode("B1")]);
        let storage = StorageService::new(dir.path().to_path_buf());

        screen.open().await.unwrap();
        screen.set_time(7, 30).await.unwrap();
        screen.set_label("Wake up".to_string()).await.unwrap();
        screen.select_barcode("B1".to_string()).await.unwrap();

        let outcome = screen.save().await.unwrap();
        assert_eq!(outcome.navigate_to, Route::Home);

        let stored = storage.get_alarms().unwrap();
        assert_eq!(stored.len(), 1);
        let saved = &stored[0];
        assert_eq!(saved.time, AlarmTime { hour: 7, minute: 30 });
        assert_eq!(saved.label, "Wake up");
        assert_eq!(saved.barcode_id, "B1");
        assert!(saved.enabled);
        assert!(!saved.id.is_empty());
        match &saved.schedule {
            ScheduleState::Scheduled { id } => assert!(!id.is_empty()),
            ScheduleState::Unscheduled => panic!("a fresh alarm must carry a platform handle"),
        }

        // the schedule call happened before persistence and exactly once
        let scheduled = scheduler.scheduled.lock().unwrap();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].0.hour, 7);
        assert_eq!(scheduled[0].0.minute, 30);
        assert_eq!(scheduled[0].1.body, "Wake up");
    }

    #[tokio::test]
    async fn empty_label_falls_back_to_the_stock_one() {
        let (screen, _, dir) = screen_with_barcodes(&[barcode("B1")]);
        let storage = StorageService::new(dir.path().to_path_buf());

        screen.open().await.unwrap();
        screen.select_barcode("B1".to_string()).await.unwrap();
        screen.save().await.unwrap();

        assert_eq!(storage.get_alarms().unwrap()[0].label, "Alarm");
    }

    #[tokio::test]
    async fn save_appends_to_the_existing_sequence() {
        let (screen, _, dir) = screen_with_barcodes(&[barcode("B1")]);
        let storage = StorageService::new(dir.path().to_path_buf());

        for _ in 0..2 {
            screen.open().await.unwrap();
            screen.select_barcode("B1".to_string()).await.unwrap();
            screen.save().await.unwrap();
        }

        assert_eq!(storage.get_alarms().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cancel_discards_the_draft() {
        let (screen, _, _dir) = screen_with_barcodes(&[barcode("B1")]);

        screen.open().await.unwrap();
        assert_eq!(screen.cancel().await, Route::Home);

        let error = screen.save().await.unwrap_err();
        assert_eq!(
            error.downcast_ref::<SaveAlarmError>(),
            Some(&SaveAlarmError::NoDraft)
        );
    }
}
