//! BLE command adapter.
//!
//! Exposes one GATT service with one write-only characteristic.  Every
//! write is copied into the inbound [`CommandChannel`] and nothing else
//! happens on the Bluetooth task; decoding and actuation belong to the
//! dispatch loop.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid GATT server via `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Item          | UUID                                   | Perms |
//! |---------------|----------------------------------------|-------|
//! | Fan service   | `12345678-1234-5678-1234-56789abcdef0` |       |
//! | Fan command   | `abcdef01-1234-5678-1234-56789abcdef0` | Write |
//!
//! Advertising restarts whenever a central disconnects.  Stack failures
//! after start-up are reported to the dispatch loop through
//! [`SHUTDOWN`](crate::inbound::SHUTDOWN).

use log::{debug, info};

use crate::error::CommsError;
use crate::inbound::{self, CommandChannel, InboundError};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x12345678_1234_5678_1234_56789abcdef0;
pub const CHAR_FAN_COMMAND: u128 = 0xabcdef01_1234_5678_1234_56789abcdef0;

/// Attribute handles reserved for the service (declaration + one char).
#[cfg(target_os = "espidf")]
const SERVICE_NUM_HANDLES: u16 = 4;

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Failed,
}

/// Hand one characteristic write to the dispatch loop.
///
/// Runs on the Bluetooth task.  Never blocks; a full queue or an oversized
/// write drops the payload.
pub fn deliver_command(channel: &CommandChannel, data: &[u8]) -> Result<(), InboundError> {
    debug!("BLE: command write ({} bytes)", data.len());
    inbound::submit(channel, data)
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF Bluedroid glue
// ───────────────────────────────────────────────────────────────

// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures.  These atomics bridge the callback context to the adapter.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CMD_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONNECTED: AtomicBool = AtomicBool::new(false);

#[cfg(target_os = "espidf")]
static SERVICE_UUID_LE: [u8; 16] = SERVICE_UUID.to_le_bytes();

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    unsafe {
        t.uuid.uuid128 = uuid.to_le_bytes();
    }
    t
}

#[cfg(target_os = "espidf")]
fn transport_failed(e: CommsError) {
    log::error!("BLE: {}", e);
    inbound::request_shutdown(
        &inbound::SHUTDOWN,
        inbound::ShutdownRequest::TransportFailed(e),
    );
}

#[cfg(target_os = "espidf")]
unsafe fn start_advertising() {
    use esp_idf_svc::sys::*;
    let mut adv_params = esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        ..unsafe { core::mem::zeroed() }
    };
    let ret = unsafe { esp_ble_gap_start_advertising(&mut adv_params) };
    if ret != ESP_OK as i32 {
        transport_failed(CommsError::AdvertisingFailed);
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => unsafe {
            start_advertising();
        },
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            let status = unsafe { (*param).adv_start_cmpl.status };
            if status == esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::info!("BLE GAP: advertising started");
            } else {
                transport_failed(CommsError::AdvertisingFailed);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            if unsafe { (*param).reg.status } != esp_gatt_status_t_ESP_GATT_OK {
                transport_failed(CommsError::GattRegisterFailed);
                return;
            }
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            let mut svc_id = esp_gatt_srvc_id_t {
                id: esp_gatt_id_t {
                    uuid: uuid128_to_esp(SERVICE_UUID),
                    inst_id: 0,
                },
                is_primary: true,
            };
            unsafe { esp_ble_gatts_create_service(gatts_if, &mut svc_id, SERVICE_NUM_HANDLES) };
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let p = unsafe { &(*param).create };
            if p.status != esp_gatt_status_t_ESP_GATT_OK {
                transport_failed(CommsError::GattRegisterFailed);
                return;
            }
            let svc_handle = p.service_handle;
            BLE_SVC_HANDLE.store(svc_handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            let mut char_uuid = uuid128_to_esp(CHAR_FAN_COMMAND);
            unsafe {
                esp_ble_gatts_start_service(svc_handle);
                esp_ble_gatts_add_char(
                    svc_handle,
                    &mut char_uuid,
                    ESP_GATT_PERM_WRITE as esp_gatt_perm_t,
                    ESP_GATT_CHAR_PROP_BIT_WRITE as esp_gatt_char_prop_t,
                    core::ptr::null_mut(),
                    core::ptr::null_mut(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let p = unsafe { &(*param).add_char };
            if p.status != esp_gatt_status_t_ESP_GATT_OK {
                transport_failed(CommsError::GattRegisterFailed);
                return;
            }
            BLE_CMD_CHAR_HANDLE.store(p.attr_handle as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: command char (handle={})", p.attr_handle);
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let p = unsafe { &(*param).connect };
            BLE_CONNECTED.store(true, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client connected (conn_id={})", p.conn_id);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            BLE_CONNECTED.store(false, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: client disconnected, re-advertising");
            unsafe { start_advertising() };
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            if p.handle as u32 == BLE_CMD_CHAR_HANDLE.load(AtomicOrdering::Relaxed) {
                let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
                let _ = deliver_command(&inbound::COMMAND_CHANNEL, data);
            }
            if p.need_rsp {
                unsafe {
                    esp_ble_gatts_send_response(
                        gatts_if,
                        p.conn_id,
                        p.trans_id,
                        esp_gatt_status_t_ESP_GATT_OK,
                        core::ptr::null_mut(),
                    );
                }
            }
        }
        _ => {}
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdapter {
    state: BleState,
    device_name: heapless::String<24>,
    channel: &'static CommandChannel,
    #[cfg(not(target_os = "espidf"))]
    sim_connected: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_adv_starts: u32,
}

impl BleAdapter {
    /// Adapter feeding the firmware-wide [`inbound::COMMAND_CHANNEL`].
    pub fn new(device_name: heapless::String<24>) -> Self {
        Self::with_channel(device_name, &inbound::COMMAND_CHANNEL)
    }

    pub fn with_channel(device_name: heapless::String<24>, channel: &'static CommandChannel) -> Self {
        Self {
            state: BleState::Idle,
            device_name,
            channel,
            #[cfg(not(target_os = "espidf"))]
            sim_connected: false,
            #[cfg(not(target_os = "espidf"))]
            sim_adv_starts: 0,
        }
    }

    pub fn state(&self) -> BleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == BleState::Advertising
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Queue this adapter's writes are delivered to.
    pub fn channel(&self) -> &'static CommandChannel {
        self.channel
    }

    /// Bring up the stack, register the service and start advertising.
    pub fn start(&mut self) -> Result<(), CommsError> {
        info!("BLE: starting advertising as '{}'", self.device_name);
        match self.platform_start() {
            Ok(()) => {
                self.state = BleState::Advertising;
                Ok(())
            }
            Err(e) => {
                self.state = BleState::Failed;
                Err(e)
            }
        }
    }

    pub fn stop(&mut self) {
        if self.state == BleState::Idle {
            return;
        }
        self.platform_stop();
        self.state = BleState::Idle;
        info!("BLE: stopped");
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    pub fn is_connected(&self) -> bool {
        BLE_CONNECTED.load(AtomicOrdering::Relaxed)
    }

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), CommsError> {
        use esp_idf_svc::sys::*;

        let check = |ret: i32, step: &str, e: CommsError| {
            if ret == ESP_OK as i32 {
                Ok(())
            } else {
                log::error!("BLE: {} failed ({})", step, ret);
                Err(e)
            }
        };

        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            check(
                esp_bt_controller_init(&mut bt_cfg),
                "bt_controller_init",
                CommsError::BleInitFailed,
            )?;
            check(
                esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE),
                "bt_controller_enable",
                CommsError::BleInitFailed,
            )?;
            check(esp_bluedroid_init(), "bluedroid_init", CommsError::BleInitFailed)?;
            check(esp_bluedroid_enable(), "bluedroid_enable", CommsError::BleInitFailed)?;

            check(
                esp_ble_gap_register_callback(Some(ble_gap_event_handler)),
                "gap_register_callback",
                CommsError::BleInitFailed,
            )?;
            check(
                esp_ble_gatts_register_callback(Some(ble_gatts_event_handler)),
                "gatts_register_callback",
                CommsError::GattRegisterFailed,
            )?;
            check(
                esp_ble_gatts_app_register(0),
                "gatts_app_register",
                CommsError::GattRegisterFailed,
            )?;

            let mut name = [0u8; 25];
            name[..self.device_name.len()].copy_from_slice(self.device_name.as_bytes());
            check(
                esp_ble_gap_set_device_name(name.as_ptr() as *const _),
                "set_device_name",
                CommsError::AdvertisingFailed,
            )?;

            // Advertising starts from the GAP callback once the data is set.
            let mut adv_data = esp_ble_adv_data_t {
                set_scan_rsp: false,
                include_name: true,
                include_txpower: false,
                min_interval: 0x0006,
                max_interval: 0x0010,
                service_uuid_len: SERVICE_UUID_LE.len() as u16,
                p_service_uuid: SERVICE_UUID_LE.as_ptr() as *mut u8,
                flag: (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8,
                ..core::mem::zeroed()
            };
            check(
                esp_ble_gap_config_adv_data(&mut adv_data),
                "config_adv_data",
                CommsError::AdvertisingFailed,
            )?;
        }

        info!(
            "BLE(espidf): Bluedroid up, advertising as '{}'",
            self.device_name
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) {
        use esp_idf_svc::sys::*;
        unsafe {
            esp_ble_gap_stop_advertising();
            esp_bluedroid_disable();
            esp_bluedroid_deinit();
            esp_bt_controller_disable();
            esp_bt_controller_deinit();
        }
        info!("BLE(espidf): stack shut down");
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn is_connected(&self) -> bool {
        self.sim_connected
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), CommsError> {
        self.sim_adv_starts += 1;
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, SERVICE_UUID
        );
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) {
        self.sim_connected = false;
        info!("BLE(sim): stopped");
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Simulate a central writing the command characteristic.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_write(&self, data: &[u8]) -> Result<(), InboundError> {
        deliver_command(self.channel, data)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_connect(&mut self) {
        info!("BLE(sim): central connected");
        self.sim_connected = true;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_disconnect(&mut self) {
        info!("BLE(sim): central disconnected, re-advertising");
        self.sim_connected = false;
        if self.state == BleState::Advertising {
            self.sim_adv_starts += 1;
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_adv_starts(&self) -> u32 {
        self.sim_adv_starts
    }
}

impl Drop for BleAdapter {
    fn drop(&mut self) {
        self.stop();
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
