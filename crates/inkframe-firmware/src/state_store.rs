//! The persisted selection lives in NVS so it survives both power-down and
//! a missing SD card.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use esp_idf_svc::sys::EspError;

use inkframe_core::state::{StateError, StateStore};

const NAMESPACE: &str = "inkframe";
const KEY: &str = "state";
const MAX_RECORD: usize = 128;

pub struct NvsStateStore {
    nvs: EspNvs<NvsDefault>,
}

impl NvsStateStore {
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, EspError> {
        Ok(Self {
            nvs: EspNvs::new(partition, NAMESPACE, true)?,
        })
    }
}

impl StateStore for NvsStateStore {
    fn read(&mut self) -> Result<Option<String>, StateError> {
        let mut buf = [0u8; MAX_RECORD];
        self.nvs
            .get_str(KEY, &mut buf)
            .map(|value| value.map(String::from))
            .map_err(|err| StateError::Read(format!("{}", err)))
    }

    fn write(&mut self, contents: &str) -> Result<(), StateError> {
        self.nvs
            .set_str(KEY, contents)
            .map_err(|err| StateError::Write(format!("{}", err)))
    }

    fn remove(&mut self) -> Result<(), StateError> {
        self.nvs
            .remove(KEY)
            .map(|_| ())
            .map_err(|err| StateError::Write(format!("{}", err)))
    }
}
