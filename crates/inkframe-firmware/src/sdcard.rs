//! SD card on its own SPI bus, mounted on the FAT VFS.

use core::ptr;
use std::ffi::CString;
use std::fs;
use std::io::ErrorKind;

use esp_idf_svc::hal::spi::SpiDriver;
use esp_idf_svc::sys;

use inkframe_core::storage::{MountMode, Storage, StorageError};

const SD_MAX_FILES: i32 = 4;

pub struct SdCard<'d> {
    spi: SpiDriver<'d>,
    cs_gpio: i32,
    card: *mut sys::sdmmc_card_t,
    mounted_at: Option<CString>,
}

impl<'d> SdCard<'d> {
    pub fn new(spi: SpiDriver<'d>, cs_gpio: i32) -> Self {
        Self {
            spi,
            cs_gpio,
            card: ptr::null_mut(),
            mounted_at: None,
        }
    }
}

impl Storage for SdCard<'_> {
    fn mount(&mut self, mount_point: &str, mode: MountMode) -> Result<(), StorageError> {
        let mount_failed = |reason: String| StorageError::MountFailed {
            mount_point: mount_point.to_string(),
            reason,
        };
        if self.mounted_at.is_some() {
            return Err(mount_failed(String::from("already mounted")));
        }
        let c_base = CString::new(mount_point)
            .map_err(|_| mount_failed(String::from("invalid mount path")))?;

        let host = build_sdspi_host(self.spi.host());
        let slot_config = sys::sdspi_device_config_t {
            host_id: self.spi.host(),
            gpio_cs: self.cs_gpio,
            gpio_cd: -1,
            gpio_wp: -1,
            gpio_int: -1,
            gpio_wp_polarity: false,
        };
        let mount_config = sys::esp_vfs_fat_mount_config_t {
            format_if_mount_failed: false,
            max_files: SD_MAX_FILES,
            allocation_unit_size: 0,
            disk_status_check_enable: false,
            use_one_fat: false,
        };

        let res = unsafe {
            sys::esp_vfs_fat_sdspi_mount(
                c_base.as_ptr(),
                &host,
                &slot_config,
                &mount_config,
                &mut self.card,
            )
        };
        if res != sys::ESP_OK {
            return Err(mount_failed(format!("esp_err {}", res)));
        }

        // The FAT VFS has no read-only mount; nothing here writes anyway.
        log::info!("SD card mounted at {} ({:?})", mount_point, mode);
        self.mounted_at = Some(c_base);
        Ok(())
    }

    fn unmount(&mut self, mount_point: &str) -> Result<(), StorageError> {
        let Some(c_base) = self.mounted_at.take() else {
            return Ok(());
        };
        let res = unsafe { sys::esp_vfs_fat_sdcard_unmount(c_base.as_ptr(), self.card) };
        self.card = ptr::null_mut();
        if res != sys::ESP_OK {
            return Err(StorageError::Io(format!("unmount {}: esp_err {}", mount_point, res)));
        }
        Ok(())
    }

    fn read_to_string(&mut self, path: &str) -> Result<String, StorageError> {
        if self.mounted_at.is_none() {
            return Err(StorageError::NotMounted);
        }
        fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Io(format!("{}: {}", path, err)),
        })
    }
}

fn build_sdspi_host(host_id: sys::spi_host_device_t) -> sys::sdmmc_host_t {
    const SDMMC_HOST_FLAG_SPI: u32 = 1 << 3;
    const SDMMC_HOST_FLAG_DEINIT_ARG: u32 = 1 << 5;

    sys::sdmmc_host_t {
        flags: SDMMC_HOST_FLAG_SPI | SDMMC_HOST_FLAG_DEINIT_ARG,
        slot: host_id as _,
        max_freq_khz: 20_000,
        io_voltage: 3.3,
        init: Some(sys::sdspi_host_init),
        set_bus_width: None,
        get_bus_width: None,
        set_bus_ddr_mode: None,
        set_card_clk: Some(sys::sdspi_host_set_card_clk),
        set_cclk_always_on: None,
        do_transaction: Some(sys::sdspi_host_do_transaction),
        __bindgen_anon_1: sys::sdmmc_host_t__bindgen_ty_1 {
            deinit_p: Some(sys::sdspi_host_remove_device),
        },
        io_int_enable: Some(sys::sdspi_host_io_int_enable),
        io_int_wait: Some(sys::sdspi_host_io_int_wait),
        command_timeout_ms: 0,
        get_real_freq: Some(sys::sdspi_host_get_real_freq),
        input_delay_phase: sys::sdmmc_delay_phase_t_SDMMC_DELAY_PHASE_0,
        set_input_delay: None,
        dma_aligned_buffer: ptr::null_mut(),
        pwr_ctrl_handle: ptr::null_mut(),
        get_dma_info: Some(sys::sdspi_host_get_dma_info),
    }
}
