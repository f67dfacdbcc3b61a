use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::models::{Alarm, SavedBarcode};

const ALARMS_KEY: &str = "alarms";
const BARCODES_KEY: &str = "barcodes";

/// Key-value JSON store: one file per key under the app data directory,
/// each holding a bare JSON array. There is no schema version field; any
/// shape change is a breaking migration.
#[derive(Clone)]
pub struct JsonStoreRepository {
    base_dir: PathBuf,
}

impl JsonStoreRepository {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn get_alarms(&self) -> Result<Vec<Alarm>> {
        self.read_collection(ALARMS_KEY)
    }

    pub fn save_alarms(&self, alarms: &[Alarm]) -> Result<()> {
        self.write_collection(ALARMS_KEY, alarms)
    }

    pub fn get_barcodes(&self) -> Result<Vec<SavedBarcode>> {
        self.read_collection(BARCODES_KEY)
    }

    pub fn save_barcodes(&self, barcodes: &[SavedBarcode]) -> Result<()> {
        self.write_collection(BARCODES_KEY, barcodes)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw)
            .with_context(|| format!("failed to deserialize {key} from {}", path.display()))
    }

    fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        self.ensure_base_dir()?;
        let path = self.key_path(key);
        let tmp_path = path.with_extension("tmp");

        let serialized = serde_json::to_string_pretty(items)?;
        fs::write(&tmp_path, serialized)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path).with_context(|| {
            format!(
                "failed to atomically move {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    fn ensure_base_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("failed to create {}", self.base_dir.display()))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::models::{AlarmTime, ScheduleState};

    use super::*;

    fn alarm(id: &str, minute: u32) -> Alarm {
        Alarm {
            id: id.to_string(),
            time: AlarmTime { hour: 7, minute },
            label: "Wake up".to_string(),
            enabled: true,
            barcode_id: "B1".to_string(),
            schedule: ScheduleState::Scheduled {
                id: format!("sched-{id}"),
            },
            repeat_days: None,
        }
    }

    fn barcode(id: &str) -> SavedBarcode {
        SavedBarcode {
            id: id.to_string(),
            data: "4006381333931".to_string(),
            symbology: "ean13".to_string(),
            label: "Shampoo".to_string(),
            captured_at: "2025-11-02T06:15:00.000Z".to_string(),
        }
    }

    #[test]
    fn missing_keys_read_as_empty_sequences() {
        let dir = tempdir().unwrap();
        let repo = JsonStoreRepository::new(dir.path().to_path_buf());

        assert!(repo.get_alarms().unwrap().is_empty());
        assert!(repo.get_barcodes().unwrap().is_empty());
    }

    #[test]
    fn alarms_round_trip_as_an_equal_sequence() {
        let dir = tempdir().unwrap();
        let repo = JsonStoreRepository::new(dir.path().to_path_buf());

        let alarms = vec![alarm("1699000000000", 30), alarm("1699000000001", 45)];
        repo.save_alarms(&alarms).unwrap();

        assert_eq!(repo.get_alarms().unwrap(), alarms);
    }

    #[test]
    fn barcodes_round_trip_as_an_equal_sequence() {
        let dir = tempdir().unwrap();
        let repo = JsonStoreRepository::new(dir.path().to_path_buf());

        let barcodes = vec![barcode("B1"), barcode("B2")];
        repo.save_barcodes(&barcodes).unwrap();

        assert_eq!(repo.get_barcodes().unwrap(), barcodes);
    }

    #[test]
    fn save_overwrites_instead_of_merging() {
        let dir = tempdir().unwrap();
        let repo = JsonStoreRepository::new(dir.path().to_path_buf());

        repo.save_alarms(&[alarm("a", 10), alarm("b", 20)]).unwrap();
        repo.save_alarms(&[alarm("c", 30)]).unwrap();

        let stored = repo.get_alarms().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "c");
    }

    #[test]
    fn the_two_collections_live_under_separate_keys() {
        let dir = tempdir().unwrap();
        let repo = JsonStoreRepository::new(dir.path().to_path_buf());

        repo.save_alarms(&[alarm("a", 0)]).unwrap();
        repo.save_barcodes(&[barcode("B1")]).unwrap();

        assert!(dir.path().join("alarms.json").exists());
        assert!(dir.path().join("barcodes.json").exists());
    }

    #[test]
    fn wire_shape_uses_camel_case_and_a_tagged_schedule() {
        let dir = tempdir().unwrap();
        let repo = JsonStoreRepository::new(dir.path().to_path_buf());

        repo.save_alarms(&[alarm("1699000000000", 30)]).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("alarms.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let record = &parsed[0];

        assert_eq!(record["barcodeId"], "B1");
        assert_eq!(record["schedule"]["state"], "scheduled");
        assert_eq!(record["schedule"]["id"], "sched-1699000000000");
        // repeatDays is absent, not null, when unset
        assert!(record.get("repeatDays").is_none());
    }

    #[test]
    fn unscheduled_alarms_deserialize_back() {
        let dir = tempdir().unwrap();
        let repo = JsonStoreRepository::new(dir.path().to_path_buf());

        let mut one = alarm("1", 5);
        one.enabled = false;
        one.schedule = ScheduleState::Unscheduled;
        repo.save_alarms(std::slice::from_ref(&one)).unwrap();

        let stored = repo.get_alarms().unwrap();
        assert_eq!(stored[0].schedule, ScheduleState::Unscheduled);
        assert_eq!(stored[0].schedule.handle(), None);
    }
}
