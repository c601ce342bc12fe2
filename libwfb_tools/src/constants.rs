// Label names as stored by the wfbrowser
pub const CAVITY_LABEL_NAME: &str = "cavity";
pub const FAULT_LABEL_NAME: &str = "fault-type";

// Event service
pub const EVENT_PATH: &str = "/wfbrowser/ajax/event";
pub const EVENT_LABEL_PATH: &str = "/wfbrowser/ajax/event-label";
pub const LABEL_SUMMARY_PATH: &str = "/wfbrowser/reports/rf-label-summary";
pub const SCREENSHOT_PATH: &str = "/puppet-show/screenshot";
pub const RF_SYSTEM: &str = "rf";

// Values the random labeler draws from
pub const CAVITY_LABELS: [&str; 10] = ["1", "2", "3", "4", "5", "6", "7", "8", "multiple", "junk"];
pub const FAULT_LABELS: [&str; 5] = [
    "Single Cavity Turn Off",
    "Multi Cavity Turn Off",
    "Microphonics",
    "Quench",
    "E_Quench",
];
pub const DEFAULT_MODEL_NAME: &str = "my_random_labeler";

// BPM capture files
pub const CONVERTED_ROOT_NAME: &str = "cebaf";
/// Capture files state deltaT in seconds; converted files use milliseconds
pub const SECONDS_PER_TIME_UNIT: f64 = 1e-3;
