pub mod add_alarm;
pub mod home;

pub use add_alarm::{AddAlarmScreen, SaveAlarmError};
pub use home::HomeScreen;
