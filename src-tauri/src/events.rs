pub const EVENT_ALARMS_CHANGED: &str = "alarms://changed";
pub const EVENT_BARCODES_CHANGED: &str = "barcodes://changed";
pub const EVENT_RUNTIME_ERROR: &str = "runtime://error";
