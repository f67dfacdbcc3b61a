use std::sync::Arc;

use anyhow::Result;

use crate::models::{Alarm, AlarmTime};

pub mod platform;

use platform::PlatformScheduler;

pub const ALARM_TITLE: &str = "Alarm!";
pub const ALARM_FALLBACK_BODY: &str = "Time to wake up!";
pub const ALARM_SOUND: &str = "alarm.mp3";

/// Hour/minute repeating trigger handed to the host scheduler. The alarm's
/// date component never reaches this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyTrigger {
    pub hour: u32,
    pub minute: u32,
    pub repeats: bool,
}

impl DailyTrigger {
    pub fn from_time(time: AlarmTime) -> Self {
        Self {
            hour: time.hour,
            minute: time.minute,
            repeats: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityHint {
    Max,
}

/// Content payload of the registered notification. `alarm_id` rides along in
/// the data field so a fired notification can be correlated back to its
/// alarm by whoever receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmContent {
    pub title: String,
    pub body: String,
    pub sound: String,
    pub priority: PriorityHint,
    pub alarm_id: String,
}

impl AlarmContent {
    pub fn for_alarm(alarm: &Alarm) -> Self {
        Self {
            title: ALARM_TITLE.to_string(),
            body: if alarm.label.is_empty() {
                ALARM_FALLBACK_BODY.to_string()
            } else {
                alarm.label.clone()
            },
            sound: ALARM_SOUND.to_string(),
            priority: PriorityHint::Max,
            alarm_id: alarm.id.clone(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionVerdict {
    pub granted: bool,
    pub message: Option<String>,
}

/// Thin, stateless adapter in front of the host notification scheduler.
/// Correctness of delivery is bounded by the platform, not by this crate.
pub trait NotificationScheduler: Send + Sync {
    fn request_permissions(&self) -> Result<PermissionVerdict>;
    fn schedule(&self, trigger: &DailyTrigger, content: &AlarmContent) -> Result<String>;
    fn cancel(&self, schedule_id: &str) -> Result<()>;
    fn cancel_all(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct NotificationService {
    scheduler: Arc<dyn NotificationScheduler>,
}

impl NotificationService {
    pub fn platform(app: tauri::AppHandle) -> Self {
        Self {
            scheduler: Arc::new(PlatformScheduler::new(app)),
        }
    }

    #[cfg(test)]
    pub fn with_scheduler(scheduler: Arc<dyn NotificationScheduler>) -> Self {
        Self { scheduler }
    }

    pub fn request_permissions(&self) -> Result<PermissionVerdict> {
        self.scheduler.request_permissions()
    }

    /// Registers a daily-repeating trigger for the alarm and returns the
    /// opaque platform handle used later to cancel it.
    pub fn schedule_alarm(&self, alarm: &Alarm) -> Result<String> {
        let trigger = DailyTrigger::from_time(alarm.time);
        let content = AlarmContent::for_alarm(alarm);
        self.scheduler.schedule(&trigger, &content)
    }

    pub fn cancel_alarm(&self, schedule_id: &str) -> Result<()> {
        self.scheduler.cancel(schedule_id)
    }

    pub fn cancel_all_alarms(&self) -> Result<()> {
        self.scheduler.cancel_all()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use anyhow::Result;

    use super::{AlarmContent, DailyTrigger, NotificationScheduler, PermissionVerdict};

    /// Records every scheduling interaction and mints sequential handles.
    #[derive(Default)]
    pub struct RecordingScheduler {
        pub scheduled: Mutex<Vec<(DailyTrigger, AlarmContent)>>,
        pub cancelled: Mutex<Vec<String>>,
        pub deny_permissions: bool,
    }

    impl NotificationScheduler for RecordingScheduler {
        fn request_permissions(&self) -> Result<PermissionVerdict> {
            Ok(PermissionVerdict {
                granted: !self.deny_permissions,
                message: self
                    .deny_permissions
                    .then(|| "notifications denied for this test".to_string()),
            })
        }

        fn schedule(&self, trigger: &DailyTrigger, content: &AlarmContent) -> Result<String> {
            let mut scheduled = self.scheduled.lock().unwrap();
            scheduled.push((*trigger, content.clone()));
            Ok(format!("sched-{}", scheduled.len()))
        }

        fn cancel(&self, schedule_id: &str) -> Result<()> {
            self.cancelled.lock().unwrap().push(schedule_id.to_string());
            Ok(())
        }

        fn cancel_all(&self) -> Result<()> {
            self.cancelled.lock().unwrap().push("*".to_string());
            Ok(())
        }
    }

    #[test]
    fn a_denied_scheduler_fails_closed_with_a_user_facing_message() {
        use std::sync::Arc;

        let scheduler = Arc::new(RecordingScheduler {
            deny_permissions: true,
            ..Default::default()
        });
        let service = super::NotificationService::with_scheduler(scheduler);

        let verdict = service.request_permissions().unwrap();
        assert!(!verdict.granted);
        assert!(verdict.message.is_some());
    }

    #[test]
    fn cancel_all_reaches_the_scheduler() {
        use std::sync::Arc;

        let scheduler = Arc::new(RecordingScheduler::default());
        let service = super::NotificationService::with_scheduler(scheduler.clone());

        service.cancel_all_alarms().unwrap();
        assert_eq!(*scheduler.cancelled.lock().unwrap(), vec!["*".to_string()]);
    }

    #[test]
    fn trigger_derivation_discards_everything_but_wall_clock() {
        use crate::models::AlarmTime;

        let trigger = DailyTrigger::from_time(AlarmTime { hour: 7, minute: 30 });
        assert_eq!(trigger.hour, 7);
        assert_eq!(trigger.minute, 30);
        assert!(trigger.repeats);
    }

    #[test]
    fn content_falls_back_to_the_stock_body_for_unlabeled_alarms() {
        use crate::models::{Alarm, AlarmTime, ScheduleState};

        let mut alarm = Alarm {
            id: "1699".to_string(),
            time: AlarmTime { hour: 6, minute: 0 },
            label: String::new(),
            enabled: true,
            barcode_id: "B1".to_string(),
            schedule: ScheduleState::Unscheduled,
            repeat_days: None,
        };

        let content = AlarmContent::for_alarm(&alarm);
        assert_eq!(content.body, super::ALARM_FALLBACK_BODY);
        assert_eq!(content.alarm_id, "1699");

        alarm.label = "Gym".to_string();
        assert_eq!(AlarmContent::for_alarm(&alarm).body, "Gym");
    }
}
