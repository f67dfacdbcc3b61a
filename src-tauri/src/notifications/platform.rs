use anyhow::Result;

use super::{AlarmContent, DailyTrigger, NotificationScheduler, PermissionVerdict};

/// Adapter over `tauri-plugin-notification`. Scheduled triggers exist only
/// on a physical device; the desktop webview shell takes the simulator's
/// role and fails closed.
pub struct PlatformScheduler {
    #[cfg_attr(desktop, allow(dead_code))]
    app: tauri::AppHandle,
}

impl PlatformScheduler {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

#[cfg(desktop)]
impl NotificationScheduler for PlatformScheduler {
    fn request_permissions(&self) -> Result<PermissionVerdict> {
        Ok(PermissionVerdict {
            granted: false,
            message: Some("Notifications only work on physical devices".to_string()),
        })
    }

    fn schedule(&self, trigger: &DailyTrigger, _content: &AlarmContent) -> Result<String> {
        anyhow::bail!(
            "cannot register a {:02}:{:02} trigger: scheduled notifications are unavailable in the desktop shell",
            trigger.hour,
            trigger.minute
        )
    }

    fn cancel(&self, schedule_id: &str) -> Result<()> {
        log::warn!("no platform schedule to cancel in the desktop shell (handle {schedule_id})");
        Ok(())
    }

    fn cancel_all(&self) -> Result<()> {
        log::warn!("no platform schedules to cancel in the desktop shell");
        Ok(())
    }
}

#[cfg(mobile)]
impl NotificationScheduler for PlatformScheduler {
    fn request_permissions(&self) -> Result<PermissionVerdict> {
        use tauri_plugin_notification::{NotificationExt, PermissionState};

        let granted = match self.app.notification().permission_state()? {
            PermissionState::Granted => true,
            _ => matches!(
                self.app.notification().request_permission()?,
                PermissionState::Granted
            ),
        };

        Ok(PermissionVerdict {
            granted,
            message: (!granted).then(|| "Notification permission was not granted".to_string()),
        })
    }

    fn schedule(&self, trigger: &DailyTrigger, content: &AlarmContent) -> Result<String> {
        use tauri_plugin_notification::{NotificationExt, Schedule, ScheduleInterval};

        let id = uuid::Uuid::new_v4().as_u128() as i32;
        self.app
            .notification()
            .builder()
            .id(id)
            .title(&content.title)
            .body(&content.body)
            .sound(&content.sound)
            .extra("alarmId", content.alarm_id.clone())
            .schedule(Schedule::Interval {
                interval: ScheduleInterval {
                    hour: Some(trigger.hour as u8),
                    minute: Some(trigger.minute as u8),
                    ..Default::default()
                },
                allow_while_idle: true,
            })
            .show()?;

        Ok(id.to_string())
    }

    fn cancel(&self, schedule_id: &str) -> Result<()> {
        use anyhow::Context;
        use tauri_plugin_notification::NotificationExt;

        let id: i32 = schedule_id
            .parse()
            .with_context(|| format!("malformed platform schedule handle {schedule_id}"))?;
        self.app.notification().cancel(vec![id])?;
        Ok(())
    }

    fn cancel_all(&self) -> Result<()> {
        use tauri_plugin_notification::NotificationExt;

        self.app.notification().cancel_all()?;
        Ok(())
    }
}
