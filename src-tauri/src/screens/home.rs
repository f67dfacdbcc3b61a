use anyhow::{anyhow, Result};
use log::warn;

use crate::{
    models::{Alarm, ScheduleState},
    notifications::NotificationService,
    storage::StorageService,
};

/// Controller behind the alarm list: load on activation, toggle, delete.
/// Every mutation writes the full sequence back; there is no partial update.
#[derive(Clone)]
pub struct HomeScreen {
    storage: StorageService,
    notifications: NotificationService,
}

impl HomeScreen {
    pub fn new(storage: StorageService, notifications: NotificationService) -> Self {
        Self {
            storage,
            notifications,
        }
    }

    pub fn load(&self) -> Result<Vec<Alarm>> {
        self.storage.get_alarms()
    }

    /// Flips `enabled`. Turning on schedules anew, so a re-enabled alarm
    /// always carries a fresh platform handle; turning off cancels the
    /// stored one and leaves the alarm `Unscheduled`.
    pub fn toggle(&self, id: &str) -> Result<Vec<Alarm>> {
        let mut alarms = self.storage.get_alarms()?;
        let alarm = alarms
            .iter_mut()
            .find(|alarm| alarm.id == id)
            .ok_or_else(|| anyhow!("no alarm with id {id}"))?;

        if alarm.enabled {
            match &alarm.schedule {
                ScheduleState::Scheduled { id: handle } => {
                    self.notifications.cancel_alarm(handle)?;
                }
                ScheduleState::Unscheduled => {
                    warn!("alarm {} was enabled without a platform schedule; nothing to cancel", alarm.id);
                }
            }
            alarm.enabled = false;
            alarm.schedule = ScheduleState::Unscheduled;
        } else {
            alarm.enabled = true;
            let handle = self.notifications.schedule_alarm(alarm)?;
            alarm.schedule = ScheduleState::Scheduled { id: handle };
        }

        self.storage.save_alarms(&alarms)?;
        Ok(alarms)
    }

    /// Removes exactly the matching identifier, keeping the rest in their
    /// original relative order, and cancels its platform schedule so no
    /// orphaned trigger keeps firing.
    pub fn delete(&self, id: &str) -> Result<Vec<Alarm>> {
        let mut alarms = self.storage.get_alarms()?;

        if let Some(alarm) = alarms.iter().find(|alarm| alarm.id == id) {
            match &alarm.schedule {
                ScheduleState::Scheduled { id: handle } => {
                    self.notifications.cancel_alarm(handle)?;
                }
                ScheduleState::Unscheduled => {}
            }
        }

        alarms.retain(|alarm| alarm.id != id);
        self.storage.save_alarms(&alarms)?;
        Ok(alarms)
    }
}
