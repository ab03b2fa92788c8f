//! Station-mode radio. The driver is created on first use and kept for the
//! rest of the cycle.

use core::convert::TryInto;

use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys;
use esp_idf_svc::wifi::EspWifi;

use inkframe_core::network::{Radio, RadioError};

pub struct StationRadio {
    modem: Option<Modem>,
    sys_loop: EspSystemEventLoop,
    nvs: Option<EspDefaultNvsPartition>,
    wifi: Option<EspWifi<'static>>,
    active: bool,
}

impl StationRadio {
    pub fn new(modem: Modem, sys_loop: EspSystemEventLoop, nvs: EspDefaultNvsPartition) -> Self {
        Self {
            modem: Some(modem),
            sys_loop,
            nvs: Some(nvs),
            wifi: None,
            active: false,
        }
    }

    fn ensure_wifi(&mut self) -> Result<&mut EspWifi<'static>, RadioError> {
        if self.wifi.is_none() {
            let modem = self
                .modem
                .take()
                .ok_or_else(|| RadioError(String::from("modem already taken")))?;
            let esp_wifi = EspWifi::new(modem, self.sys_loop.clone(), self.nvs.take())
                .map_err(|err| RadioError(format!("wifi init failed: {}", err)))?;
            self.wifi = Some(esp_wifi);
        }
        self.wifi
            .as_mut()
            .ok_or_else(|| RadioError(String::from("wifi init failed")))
    }
}

impl Radio for StationRadio {
    fn activate(&mut self) -> Result<(), RadioError> {
        let wifi = self.ensure_wifi()?;
        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(|err| RadioError(format!("wifi sta config failed: {}", err)))?;
        wifi.start()
            .map_err(|err| RadioError(format!("wifi start failed: {}", err)))?;
        // Modem power save stretches DHCP and TLS handshakes past the poll window.
        let res = unsafe { sys::esp_wifi_set_ps(sys::wifi_ps_type_t_WIFI_PS_NONE) };
        if res != sys::ESP_OK {
            log::warn!("wifi: could not disable power save: {}", res);
        }
        self.active = true;
        Ok(())
    }

    fn join(&mut self, ssid: &str, credential: &str) -> Result<(), RadioError> {
        let ssid_h = ssid
            .try_into()
            .map_err(|_| RadioError(String::from("SSID too long (max 32)")))?;
        let (auth_method, password_h) = if credential.is_empty() {
            (AuthMethod::None, Default::default())
        } else {
            (
                AuthMethod::WPA2Personal,
                credential
                    .try_into()
                    .map_err(|_| RadioError(String::from("password too long (max 64)")))?,
            )
        };

        let wifi = self.ensure_wifi()?;
        let conf = Configuration::Client(ClientConfiguration {
            ssid: ssid_h,
            bssid: None,
            auth_method,
            password: password_h,
            channel: None,
            ..Default::default()
        });
        wifi.set_configuration(&conf)
            .map_err(|err| RadioError(format!("wifi sta config failed: {}", err)))?;
        wifi.connect()
            .map_err(|err| RadioError(format!("wifi connect failed: {}", err)))
    }

    fn is_joined(&mut self) -> bool {
        let Some(wifi) = self.wifi.as_ref() else {
            return false;
        };
        let associated = wifi.is_connected().unwrap_or(false);
        associated && wifi.sta_netif().is_up().unwrap_or(false)
    }

    fn deactivate(&mut self) -> Result<(), RadioError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let Some(wifi) = self.wifi.as_mut() else {
            return Ok(());
        };
        let _ = wifi.disconnect();
        wifi.stop()
            .map_err(|err| RadioError(format!("wifi stop failed: {}", err)))
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
