use std::{path::PathBuf, sync::Arc};

use anyhow::Result;

use crate::models::{Alarm, SavedBarcode};

pub mod json_repo;

use json_repo::JsonStoreRepository;

/// Full-overwrite access to the two persisted collections. Reads of a key
/// that was never written yield an empty sequence; every save replaces the
/// prior value wholesale.
pub trait BarcodeAlarmRepository: Send + Sync {
    fn get_alarms(&self) -> Result<Vec<Alarm>>;
    fn save_alarms(&self, alarms: &[Alarm]) -> Result<()>;
    fn get_barcodes(&self) -> Result<Vec<SavedBarcode>>;
    fn save_barcodes(&self, barcodes: &[SavedBarcode]) -> Result<()>;
}

impl BarcodeAlarmRepository for JsonStoreRepository {
    fn get_alarms(&self) -> Result<Vec<Alarm>> {
        self.get_alarms()
    }

    fn save_alarms(&self, alarms: &[Alarm]) -> Result<()> {
        self.save_alarms(alarms)
    }

    fn get_barcodes(&self) -> Result<Vec<SavedBarcode>> {
        self.get_barcodes()
    }

    fn save_barcodes(&self, barcodes: &[SavedBarcode]) -> Result<()> {
        self.save_barcodes(barcodes)
    }
}

#[derive(Clone)]
pub struct StorageService {
    repo: Arc<dyn BarcodeAlarmRepository>,
}

impl StorageService {
    pub fn new(base_dir: PathBuf) -> Self {
        Self {
            repo: Arc::new(JsonStoreRepository::new(base_dir)),
        }
    }

    pub fn get_alarms(&self) -> Result<Vec<Alarm>> {
        self.repo.get_alarms()
    }

    pub fn save_alarms(&self, alarms: &[Alarm]) -> Result<()> {
        self.repo.save_alarms(alarms)
    }

    pub fn get_barcodes(&self) -> Result<Vec<SavedBarcode>> {
        self.repo.get_barcodes()
    }

    pub fn save_barcodes(&self, barcodes: &[SavedBarcode]) -> Result<()> {
        self.repo.save_barcodes(barcodes)
    }
}
