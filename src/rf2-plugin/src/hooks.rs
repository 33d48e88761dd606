//! Capability traits a plugin registers on [`PluginBuilder`](crate::PluginBuilder).
//!
//! Each trait groups the host callbacks of one concern. A plugin implements
//! only the traits it needs and only the methods it cares about; every
//! method has a neutral default. Host callbacks of a capability that was
//! never registered answer with the host's own defaults (`false`, `0`).
//!
//! Registering a capability opts in to its main feed: the "wants updates"
//! query of [`ScoringHooks`], [`TelemetryHooks`], [`GraphicsHooks`],
//! [`HardwareHooks`] and [`WeatherHooks`] defaults to yes. The three rule
//! sets of [`RulesHooks`] are independent and must each be opted in.

use crate::abi::{
    CameraControlInfoV01, CommentaryRequestInfoV01, CustomControlInfoV01, CustomSettingV01,
    CustomVariableV01, EnvironmentInfoV01, GraphicsInfoV01, GraphicsInfoV02, HostLong,
    MessageInfoV01, MultiSessionRulesV01, PhysicsOptionsV01, PitMenuV01, ScoringInfoV01,
    ScreenInfoV01, TelemInfoV01, TrackRulesV01, WeatherControlInfoV01,
};
use crate::context::PluginContext;
use rf2_core::SessionType;

/// Session parameters reported with the first scoring update of a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionInfo {
    /// `None` when the host reports a code this adapter does not know.
    pub kind: Option<SessionType>,
    pub code: i32,
    /// Session end time in seconds.
    pub duration: f64,
    pub max_laps: i32,
}

impl SessionInfo {
    pub fn from_scoring(info: &ScoringInfoV01) -> Self {
        let code = info.session;
        Self {
            kind: SessionType::from_code(code),
            code,
            duration: info.end_et,
            max_laps: info.max_laps,
        }
    }
}

/// Host thread announced through `ThreadStarted`/`ThreadStopping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadKind {
    Multimedia,
    Simulation,
    Other(HostLong),
}

impl ThreadKind {
    pub fn from_code(code: HostLong) -> Self {
        match code {
            0 => ThreadKind::Multimedia,
            1 => ThreadKind::Simulation,
            other => ThreadKind::Other(other),
        }
    }
}

/// Telemetry feed requested from the host.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TelemetryRequest {
    #[default]
    Off = 0,
    PlayerOnly = 1,
    AllVehicles = 2,
}

impl TelemetryRequest {
    pub fn code(&self) -> HostLong {
        *self as HostLong
    }
}

/// Game flow and environment notifications.
pub trait SessionHooks: Send {
    fn startup(&mut self, _ctx: &PluginContext, _version: HostLong) {}

    fn shutdown(&mut self, _ctx: &PluginContext) {}

    fn load(&mut self, _ctx: &PluginContext) {}

    fn unload(&mut self, _ctx: &PluginContext) {}

    fn start_session(&mut self, _ctx: &PluginContext) {}

    fn end_session(&mut self, _ctx: &PluginContext) {}

    fn enter_realtime(&mut self, _ctx: &PluginContext) {}

    fn exit_realtime(&mut self, _ctx: &PluginContext) {}

    /// Called once per load, on the first scoring update after it.
    ///
    /// Requires scoring updates, so register [`ScoringHooks`] as well.
    fn track_loaded(&mut self, _ctx: &PluginContext, _track: &str, _lap_distance: f64) {}

    /// Called once per session start, on the first scoring update after it.
    ///
    /// Requires scoring updates, so register [`ScoringHooks`] as well.
    fn session_started(&mut self, _ctx: &PluginContext, _session: &SessionInfo) {}

    fn error(&mut self, _ctx: &PluginContext, _message: &str) {}

    /// The context already holds the new paths when this runs.
    fn set_environment(&mut self, _ctx: &PluginContext, _info: &EnvironmentInfoV01) {}

    fn set_physics_options(&mut self, _ctx: &PluginContext, _options: &mut PhysicsOptionsV01) {}

    fn thread_started(&mut self, _ctx: &PluginContext, _kind: ThreadKind) {}

    fn thread_stopping(&mut self, _ctx: &PluginContext, _kind: ThreadKind) {}
}

pub trait ScoringHooks: Send {
    fn wants_scoring_updates(&mut self, _ctx: &PluginContext) -> bool {
        true
    }

    fn update_scoring(&mut self, _ctx: &PluginContext, _info: &ScoringInfoV01) {}
}

pub trait TelemetryHooks: Send {
    fn wants_telemetry_updates(&mut self, _ctx: &PluginContext) -> TelemetryRequest {
        TelemetryRequest::PlayerOnly
    }

    fn update_telemetry(&mut self, _ctx: &PluginContext, _info: &TelemInfoV01) {}
}

pub trait GraphicsHooks: Send {
    fn wants_graphics_updates(&mut self, _ctx: &PluginContext) -> bool {
        true
    }

    fn update_graphics(&mut self, _ctx: &PluginContext, _info: &GraphicsInfoV01) {}

    fn update_graphics_v2(&mut self, _ctx: &PluginContext, _info: &GraphicsInfoV02) {}

    /// Non-zero takes over the camera.
    fn wants_to_view_vehicle(&mut self, _ctx: &PluginContext, _camera: &mut CameraControlInfoV01) -> u8 {
        0
    }
}

/// Controller inputs and force feedback.
pub trait HardwareHooks: Send {
    fn has_hardware_inputs(&mut self, _ctx: &PluginContext) -> bool {
        true
    }

    fn update_hardware(&mut self, _ctx: &PluginContext, _delta_seconds: f64) {}

    fn enable_hardware(&mut self, _ctx: &PluginContext) {}

    fn disable_hardware(&mut self, _ctx: &PluginContext) {}

    /// Return `true` and set `value` to drive `control`.
    fn check_hw_control(&mut self, _ctx: &PluginContext, _control: &str, _value: &mut f64) -> bool {
        false
    }

    fn force_feedback(&mut self, _ctx: &PluginContext, _force: &mut f64) -> bool {
        false
    }

    fn init_custom_control(&mut self, _ctx: &PluginContext, _info: &mut CustomControlInfoV01) -> bool {
        false
    }
}

/// Commentary and messages beyond the adapter's own queue.
pub trait MessageHooks: Send {
    fn request_commentary(&mut self, _ctx: &PluginContext, _info: &mut CommentaryRequestInfoV01) -> bool {
        false
    }

    /// Only consulted while the queue fed by
    /// [`PluginContext::display_message`] is empty.
    fn wants_to_display_message(&mut self, _ctx: &PluginContext, _info: &mut MessageInfoV01) -> bool {
        false
    }
}

pub trait ScreenHooks: Send {
    fn init_screen(&mut self, _ctx: &PluginContext, _info: &ScreenInfoV01) {}

    fn uninit_screen(&mut self, _ctx: &PluginContext, _info: &ScreenInfoV01) {}

    fn deactivate_screen(&mut self, _ctx: &PluginContext, _info: &ScreenInfoV01) {}

    fn reactivate_screen(&mut self, _ctx: &PluginContext, _info: &ScreenInfoV01) {}

    fn render_before_overlays(&mut self, _ctx: &PluginContext, _info: &ScreenInfoV01) {}

    fn render_after_overlays(&mut self, _ctx: &PluginContext, _info: &ScreenInfoV01) {}

    fn pre_reset(&mut self, _ctx: &PluginContext, _info: &ScreenInfoV01) {}

    fn post_reset(&mut self, _ctx: &PluginContext, _info: &ScreenInfoV01) {}
}

pub trait WeatherHooks: Send {
    fn wants_weather_access(&mut self, _ctx: &PluginContext) -> bool {
        true
    }

    fn access_weather(
        &mut self,
        _ctx: &PluginContext,
        _track_node_size: f64,
        _info: &mut WeatherControlInfoV01,
    ) -> bool {
        false
    }
}

/// Variables shown in the host's plugin options UI.
pub trait CustomVariableHooks: Send {
    /// Describe variable `index`; return `false` once past the last one.
    fn get_custom_variable(&mut self, _ctx: &PluginContext, _index: HostLong, _var: &mut CustomVariableV01) -> bool {
        false
    }

    fn access_custom_variable(&mut self, _ctx: &PluginContext, _var: &mut CustomVariableV01) {}

    fn get_custom_variable_setting(
        &mut self,
        _ctx: &PluginContext,
        _var: &mut CustomVariableV01,
        _index: HostLong,
        _setting: &mut CustomSettingV01,
    ) {
    }
}

/// Access to multi-session rules, track rules and the pit menu.
pub trait RulesHooks: Send {
    fn wants_multi_session_rules_access(&mut self, _ctx: &PluginContext) -> bool {
        false
    }

    fn access_multi_session_rules(&mut self, _ctx: &PluginContext, _info: &mut MultiSessionRulesV01) -> bool {
        false
    }

    fn wants_track_rules_access(&mut self, _ctx: &PluginContext) -> bool {
        false
    }

    fn access_track_rules(&mut self, _ctx: &PluginContext, _info: &mut TrackRulesV01) -> bool {
        false
    }

    fn wants_pit_menu_access(&mut self, _ctx: &PluginContext) -> bool {
        false
    }

    fn access_pit_menu(&mut self, _ctx: &PluginContext, _info: &mut PitMenuV01) -> bool {
        false
    }
}
