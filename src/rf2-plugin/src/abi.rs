//! Host structures of the internals plugin interface (version 7).
//!
//! Only the structures the adapter reads or writes carry field definitions.
//! Everything else is an opaque handle that hooks receive by reference and
//! may cast to their own `#[repr(C)]` definition when they need the fields.
//!
//! The host compiles its interface with 4-byte packing and a 32-bit `long`,
//! which the definitions below reproduce.

use std::marker::{PhantomData, PhantomPinned};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::ptr;

/// The host's `long` (32 bits on its only supported platform).
pub type HostLong = i32;

/// Interface version reported by `GetPluginVersion`.
pub const INTERFACE_VERSION: i32 = 7;

/// Capacity of [`MessageInfoV01::text`], terminator included.
pub const MESSAGE_CAPACITY: usize = 128;

pub const ENVIRONMENT_PATH_COUNT: usize = 16;

/// Index of the user data directory in [`EnvironmentInfoV01::path`].
pub const PATH_USER_DATA: usize = 0;
/// Index of the custom plugin options JSON file.
pub const PATH_PLUGIN_OPTIONS: usize = 1;
/// Index of the latest results file.
pub const PATH_LATEST_RESULTS: usize = 2;

/// Kind of object a plugin library exposes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginObjectType {
    Invalid = -1,
    GameStats = 0,
    NcPlugin = 1,
    IVibe = 2,
    Internals = 3,
    RfOnline = 4,
}

#[repr(C, packed(4))]
#[derive(Clone, Copy, Default)]
pub struct TelemVect3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Session-wide scoring snapshot delivered with every scoring update.
#[repr(C, packed(4))]
#[derive(Clone, Copy)]
pub struct ScoringInfoV01 {
    pub track_name: [u8; 64],
    pub session: HostLong,
    pub current_et: f64,
    pub end_et: f64,
    pub max_laps: HostLong,
    pub lap_dist: f64,
    pub results_stream: *mut c_char,
    pub num_vehicles: HostLong,
    pub game_phase: u8,
    pub yellow_flag_state: i8,
    pub sector_flag: [i8; 3],
    pub start_light: u8,
    pub num_red_lights: u8,
    pub in_realtime: bool,
    pub player_name: [u8; 32],
    pub plr_file_name: [u8; 64],
    pub dark_cloud: f64,
    pub raining: f64,
    pub ambient_temp: f64,
    pub track_temp: f64,
    pub wind: TelemVect3,
    pub min_path_wetness: f64,
    pub max_path_wetness: f64,
    pub game_mode: u8,
    pub is_password_protected: bool,
    pub server_port: u16,
    pub server_public_ip: u32,
    pub max_players: HostLong,
    pub server_name: [u8; 32],
    pub start_et: f32,
    pub avg_path_wetness: f64,
    pub expansion: [u8; 200],
    pub vehicle: *mut VehicleScoringInfoV01,
}

impl Default for ScoringInfoV01 {
    fn default() -> Self {
        // SAFETY: every field is an integer, float, bool, byte array or raw
        // pointer, all of which are valid when zeroed.
        unsafe { std::mem::zeroed() }
    }
}

impl ScoringInfoV01 {
    pub fn track_name(&self) -> String {
        let name = self.track_name;
        c_buffer_to_string(&name)
    }

    pub fn player_name(&self) -> String {
        let name = self.player_name;
        c_buffer_to_string(&name)
    }

    pub fn server_name(&self) -> String {
        let name = self.server_name;
        c_buffer_to_string(&name)
    }

    pub fn set_track_name(&mut self, name: &str) {
        let mut buf = [0u8; 64];
        copy_to_c_buffer(&mut buf, name);
        self.track_name = buf;
    }
}

/// Paths the host announces once per environment change.
///
/// Each slot points to a NUL-terminated string owned by the host and valid
/// only for the duration of the `SetEnvironment` call.
#[repr(C, packed(4))]
pub struct EnvironmentInfoV01 {
    path: [*const c_char; ENVIRONMENT_PATH_COUNT],
    expansion: [u8; 256],
}

impl Default for EnvironmentInfoV01 {
    fn default() -> Self {
        Self {
            path: [ptr::null(); ENVIRONMENT_PATH_COUNT],
            expansion: [0; 256],
        }
    }
}

impl EnvironmentInfoV01 {
    /// Path at `index`, `None` when out of range, null or empty.
    pub fn path(&self, index: usize) -> Option<String> {
        let paths = self.path;
        let slot = *paths.get(index)?;
        if slot.is_null() {
            return None;
        }
        // SAFETY: non-null slots point to NUL-terminated strings that outlive
        // `self` (host contract, or `set_path`'s contract).
        let path = unsafe { CStr::from_ptr(slot) }.to_string_lossy().into_owned();
        (!path.is_empty()).then_some(path)
    }

    /// Points slot `index` at `value`; out-of-range indices are ignored.
    ///
    /// # Safety
    /// `value` must be null or a NUL-terminated string that stays valid for
    /// as long as this structure is read.
    pub unsafe fn set_path(&mut self, index: usize, value: *const c_char) {
        let mut paths = self.path;
        if let Some(slot) = paths.get_mut(index) {
            *slot = value;
        }
        self.path = paths;
    }
}

/// Buffer the host hands out when polling for a message to show.
#[repr(C, packed(4))]
#[derive(Clone, Copy)]
pub struct MessageInfoV01 {
    pub text: [u8; MESSAGE_CAPACITY],
    pub destination: u8,
    pub translate: u8,
    pub expansion: [u8; 126],
}

impl Default for MessageInfoV01 {
    fn default() -> Self {
        Self {
            text: [0; MESSAGE_CAPACITY],
            destination: 0,
            translate: 0,
            expansion: [0; 126],
        }
    }
}

impl MessageInfoV01 {
    pub fn text(&self) -> String {
        let text = self.text;
        c_buffer_to_string(&text)
    }
}

macro_rules! opaque_host_types {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _data: [u8; 0],
                _marker: PhantomData<(*mut u8, PhantomPinned)>,
            }
        )*
    };
}

opaque_host_types! {
    /// Per-vehicle scoring entry, pointed to by [`ScoringInfoV01::vehicle`].
    VehicleScoringInfoV01;
    /// Player vehicle telemetry.
    TelemInfoV01;
    GraphicsInfoV01;
    GraphicsInfoV02;
    CommentaryRequestInfoV01;
    PhysicsOptionsV01;
    CameraControlInfoV01;
    ScreenInfoV01;
    CustomControlInfoV01;
    WeatherControlInfoV01;
    CustomVariableV01;
    CustomSettingV01;
    MultiSessionRulesV01;
    TrackRulesV01;
    PitMenuV01;
}

/// Text up to the first NUL; invalid UTF-8 is replaced.
pub fn c_buffer_to_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Copies as much of `text` as fits while leaving room for a terminator and
/// without splitting a UTF-8 sequence. Returns the number of bytes copied.
pub fn copy_to_c_buffer(buf: &mut [u8], text: &str) -> usize {
    let Some(capacity) = buf.len().checked_sub(1) else {
        return 0;
    };
    let mut end = text.len().min(capacity);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    buf[..end].copy_from_slice(&text.as_bytes()[..end]);
    buf[end] = 0;
    end
}
