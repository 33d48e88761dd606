//! The object the host holds: a vtable pointer followed by the adapter.
//!
//! The host drives plugins through a C++ class whose virtual functions it
//! calls through the object's first word. [`InternalsPluginVTable`] lists
//! those functions in the host header's declaration order; every entry is a
//! thunk that recovers the [`PluginAdapter`] and forwards to it. With the
//! host's calling convention a member call passes the object pointer as the
//! first argument, which `extern "C"` reproduces.
//!
//! Thunks never let a panic unwind into the host: it is logged and the
//! callback answers with its neutral value instead. The host may call from
//! its simulation and hardware threads at once, so thunks only ever borrow
//! the adapter immutably; [`PluginAdapter`] does its own locking.

use crate::abi::{
    CameraControlInfoV01, CommentaryRequestInfoV01, CustomControlInfoV01, CustomSettingV01,
    CustomVariableV01, EnvironmentInfoV01, GraphicsInfoV01, GraphicsInfoV02, HostLong,
    MessageInfoV01, MultiSessionRulesV01, PhysicsOptionsV01, PitMenuV01, ScoringInfoV01,
    ScreenInfoV01, TelemInfoV01, TrackRulesV01, WeatherControlInfoV01,
};
use crate::adapter::PluginAdapter;
use std::any::Any;
use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_uint};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

/// Host-visible plugin instance.
#[repr(C)]
pub struct PluginObject {
    vtable: &'static InternalsPluginVTable,
    adapter: PluginAdapter,
}

impl PluginObject {
    pub fn new(adapter: PluginAdapter) -> Box<Self> {
        Box::new(Self {
            vtable: &VTABLE,
            adapter,
        })
    }

    pub fn adapter(&self) -> &PluginAdapter {
        &self.adapter
    }

    pub fn vtable(&self) -> &'static InternalsPluginVTable {
        self.vtable
    }

    /// Hands ownership to the host.
    pub fn into_raw(self: Box<Self>) -> *mut PluginObject {
        Box::into_raw(self)
    }

    /// Releases an object obtained from [`PluginObject::into_raw`]. Null is
    /// ignored.
    ///
    /// # Safety
    /// `object` must be null or come from `into_raw` and not be used again.
    pub unsafe fn destroy(object: *mut PluginObject) {
        if object.is_null() {
            return;
        }
        // SAFETY: guaranteed by the caller.
        let object = unsafe { Box::from_raw(object) };
        tracing::debug!(plugin = %object.adapter.context().name(), "plugin object destroyed");
        drop(object);
    }
}

/// Builds the adapter and boxes it for the host; null when `create` panics.
pub fn create_plugin_object(create: impl FnOnce() -> PluginAdapter) -> *mut PluginObject {
    match panic::catch_unwind(AssertUnwindSafe(create)) {
        Ok(adapter) => PluginObject::new(adapter).into_raw(),
        Err(payload) => {
            tracing::error!(panic = panic_message(payload.as_ref()), "plugin construction panicked");
            ptr::null_mut()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        "non-string panic payload"
    }
}

/// Runs `f` on the adapter behind `this`, answering `neutral` for a null
/// object or a panicking hook.
unsafe fn with_adapter<R>(
    this: *mut PluginObject,
    callback: &'static str,
    neutral: R,
    f: impl FnOnce(&PluginAdapter) -> R,
) -> R {
    // SAFETY: the host only calls through objects it got from us. Calls may
    // overlap across host threads, so only shared references are formed.
    let Some(object) = (unsafe { this.as_ref() }) else {
        return neutral;
    };
    match panic::catch_unwind(AssertUnwindSafe(|| f(&object.adapter))) {
        Ok(value) => value,
        Err(payload) => {
            tracing::error!(
                callback,
                panic = panic_message(payload.as_ref()),
                "plugin hook panicked"
            );
            neutral
        }
    }
}

type This = *mut PluginObject;

/// Virtual function table of the host's `InternalsPluginV07`.
#[repr(C)]
pub struct InternalsPluginVTable {
    // PluginObject
    pub deleting_destructor: unsafe extern "C" fn(This, c_uint) -> *mut c_void,
    pub destroy: unsafe extern "C" fn(This),
    pub get_info: unsafe extern "C" fn(This) -> *mut c_void,
    pub get_property_count: unsafe extern "C" fn(This) -> c_uint,
    pub get_property_by_name: unsafe extern "C" fn(This, *const c_char) -> *mut c_void,
    pub get_property_by_index: unsafe extern "C" fn(This, c_uint) -> *mut c_void,

    // V01
    pub startup: unsafe extern "C" fn(This, HostLong),
    pub shutdown: unsafe extern "C" fn(This),
    pub load: unsafe extern "C" fn(This),
    pub unload: unsafe extern "C" fn(This),
    pub start_session: unsafe extern "C" fn(This),
    pub end_session: unsafe extern "C" fn(This),
    pub enter_realtime: unsafe extern "C" fn(This),
    pub exit_realtime: unsafe extern "C" fn(This),
    pub wants_scoring_updates: unsafe extern "C" fn(This) -> bool,
    pub update_scoring: unsafe extern "C" fn(This, *const ScoringInfoV01),
    pub wants_telemetry_updates: unsafe extern "C" fn(This) -> HostLong,
    pub update_telemetry: unsafe extern "C" fn(This, *const TelemInfoV01),
    pub wants_graphics_updates: unsafe extern "C" fn(This) -> bool,
    pub update_graphics: unsafe extern "C" fn(This, *const GraphicsInfoV01),
    pub request_commentary: unsafe extern "C" fn(This, *mut CommentaryRequestInfoV01) -> bool,
    pub has_hardware_inputs: unsafe extern "C" fn(This) -> bool,
    pub update_hardware: unsafe extern "C" fn(This, f64),
    pub enable_hardware: unsafe extern "C" fn(This),
    pub disable_hardware: unsafe extern "C" fn(This),
    pub check_hw_control: unsafe extern "C" fn(This, *const c_char, *mut f64) -> bool,
    pub force_feedback: unsafe extern "C" fn(This, *mut f64) -> bool,
    pub error: unsafe extern "C" fn(This, *const c_char),

    // V02
    pub set_physics_options: unsafe extern "C" fn(This, *mut PhysicsOptionsV01),

    // V03
    pub wants_to_view_vehicle: unsafe extern "C" fn(This, *mut CameraControlInfoV01) -> u8,
    pub update_graphics_v2: unsafe extern "C" fn(This, *const GraphicsInfoV02),
    pub wants_to_display_message: unsafe extern "C" fn(This, *mut MessageInfoV01) -> bool,

    // V04
    pub set_environment: unsafe extern "C" fn(This, *const EnvironmentInfoV01),

    // V05
    pub init_screen: unsafe extern "C" fn(This, *const ScreenInfoV01),
    pub uninit_screen: unsafe extern "C" fn(This, *const ScreenInfoV01),
    pub deactivate_screen: unsafe extern "C" fn(This, *const ScreenInfoV01),
    pub reactivate_screen: unsafe extern "C" fn(This, *const ScreenInfoV01),
    pub render_screen_before_overlays: unsafe extern "C" fn(This, *const ScreenInfoV01),
    pub render_screen_after_overlays: unsafe extern "C" fn(This, *const ScreenInfoV01),
    pub pre_reset: unsafe extern "C" fn(This, *const ScreenInfoV01),
    pub post_reset: unsafe extern "C" fn(This, *const ScreenInfoV01),
    pub init_custom_control: unsafe extern "C" fn(This, *mut CustomControlInfoV01) -> bool,

    // V06
    pub wants_weather_access: unsafe extern "C" fn(This) -> bool,
    pub access_weather: unsafe extern "C" fn(This, f64, *mut WeatherControlInfoV01) -> bool,
    pub thread_started: unsafe extern "C" fn(This, HostLong),
    pub thread_stopping: unsafe extern "C" fn(This, HostLong),

    // V07
    pub get_custom_variable: unsafe extern "C" fn(This, HostLong, *mut CustomVariableV01) -> bool,
    pub access_custom_variable: unsafe extern "C" fn(This, *mut CustomVariableV01),
    pub get_custom_variable_setting:
        unsafe extern "C" fn(This, *mut CustomVariableV01, HostLong, *mut CustomSettingV01),
    pub wants_multi_session_rules_access: unsafe extern "C" fn(This) -> bool,
    pub access_multi_session_rules: unsafe extern "C" fn(This, *mut MultiSessionRulesV01) -> bool,
    pub wants_track_rules_access: unsafe extern "C" fn(This) -> bool,
    pub access_track_rules: unsafe extern "C" fn(This, *mut TrackRulesV01) -> bool,
    pub wants_pit_menu_access: unsafe extern "C" fn(This) -> bool,
    pub access_pit_menu: unsafe extern "C" fn(This, *mut PitMenuV01) -> bool,
}

static VTABLE: InternalsPluginVTable = InternalsPluginVTable {
    deleting_destructor,
    destroy,
    get_info,
    get_property_count,
    get_property_by_name,
    get_property_by_index,
    startup,
    shutdown,
    load,
    unload,
    start_session,
    end_session,
    enter_realtime,
    exit_realtime,
    wants_scoring_updates,
    update_scoring,
    wants_telemetry_updates,
    update_telemetry,
    wants_graphics_updates,
    update_graphics,
    request_commentary,
    has_hardware_inputs,
    update_hardware,
    enable_hardware,
    disable_hardware,
    check_hw_control,
    force_feedback,
    error,
    set_physics_options,
    wants_to_view_vehicle,
    update_graphics_v2,
    wants_to_display_message,
    set_environment,
    init_screen,
    uninit_screen,
    deactivate_screen,
    reactivate_screen,
    render_screen_before_overlays,
    render_screen_after_overlays,
    pre_reset,
    post_reset,
    init_custom_control,
    wants_weather_access,
    access_weather,
    thread_started,
    thread_stopping,
    get_custom_variable,
    access_custom_variable,
    get_custom_variable_setting,
    wants_multi_session_rules_access,
    access_multi_session_rules,
    wants_track_rules_access,
    access_track_rules,
    wants_pit_menu_access,
    access_pit_menu,
};

/// Thunks for callbacks without data arguments.
macro_rules! simple_thunks {
    ($($name:ident -> $ret:ty = $neutral:expr;)*) => {
        $(
            unsafe extern "C" fn $name(this: This) -> $ret {
                unsafe { with_adapter(this, stringify!($name), $neutral, |a| a.$name()) }
            }
        )*
    };
}

/// Thunks for callbacks taking one host structure by reference.
macro_rules! ref_thunks {
    ($($name:ident($ty:ty) -> $ret:ty = $neutral:expr;)*) => {
        $(
            unsafe extern "C" fn $name(this: This, info: *const $ty) -> $ret {
                // SAFETY: the host passes a reference, valid for the call.
                let Some(info) = (unsafe { info.as_ref() }) else {
                    return $neutral;
                };
                unsafe { with_adapter(this, stringify!($name), $neutral, |a| a.$name(info)) }
            }
        )*
    };
}

/// Thunks for callbacks taking one host structure by mutable reference.
macro_rules! mut_thunks {
    ($($name:ident($ty:ty) -> $ret:ty = $neutral:expr;)*) => {
        $(
            unsafe extern "C" fn $name(this: This, info: *mut $ty) -> $ret {
                // SAFETY: the host passes a reference, valid for the call.
                let Some(info) = (unsafe { info.as_mut() }) else {
                    return $neutral;
                };
                unsafe { with_adapter(this, stringify!($name), $neutral, |a| a.$name(info)) }
            }
        )*
    };
}

simple_thunks! {
    shutdown -> () = ();
    load -> () = ();
    unload -> () = ();
    start_session -> () = ();
    end_session -> () = ();
    enter_realtime -> () = ();
    exit_realtime -> () = ();
    wants_scoring_updates -> bool = false;
    wants_graphics_updates -> bool = false;
    has_hardware_inputs -> bool = false;
    enable_hardware -> () = ();
    disable_hardware -> () = ();
    wants_weather_access -> bool = false;
    wants_multi_session_rules_access -> bool = false;
    wants_track_rules_access -> bool = false;
    wants_pit_menu_access -> bool = false;
}

ref_thunks! {
    update_scoring(ScoringInfoV01) -> () = ();
    update_telemetry(TelemInfoV01) -> () = ();
    update_graphics(GraphicsInfoV01) -> () = ();
    update_graphics_v2(GraphicsInfoV02) -> () = ();
    set_environment(EnvironmentInfoV01) -> () = ();
    init_screen(ScreenInfoV01) -> () = ();
    uninit_screen(ScreenInfoV01) -> () = ();
    deactivate_screen(ScreenInfoV01) -> () = ();
    reactivate_screen(ScreenInfoV01) -> () = ();
    render_screen_before_overlays(ScreenInfoV01) -> () = ();
    render_screen_after_overlays(ScreenInfoV01) -> () = ();
    pre_reset(ScreenInfoV01) -> () = ();
    post_reset(ScreenInfoV01) -> () = ();
}

mut_thunks! {
    request_commentary(CommentaryRequestInfoV01) -> bool = false;
    force_feedback(f64) -> bool = false;
    set_physics_options(PhysicsOptionsV01) -> () = ();
    wants_to_view_vehicle(CameraControlInfoV01) -> u8 = 0;
    wants_to_display_message(MessageInfoV01) -> bool = false;
    init_custom_control(CustomControlInfoV01) -> bool = false;
    access_custom_variable(CustomVariableV01) -> () = ();
    access_multi_session_rules(MultiSessionRulesV01) -> bool = false;
    access_track_rules(TrackRulesV01) -> bool = false;
    access_pit_menu(PitMenuV01) -> bool = false;
}

unsafe extern "C" fn deleting_destructor(this: This, flags: c_uint) -> *mut c_void {
    if this.is_null() {
        return ptr::null_mut();
    }
    if flags & 1 != 0 {
        // SAFETY: the host deletes an object it got from `CreatePluginObject`.
        unsafe { PluginObject::destroy(this) };
    } else {
        // SAFETY: destruction without release; the host owns the storage.
        unsafe { ptr::drop_in_place(this) };
    }
    this.cast()
}

unsafe extern "C" fn destroy(_this: This) {}

unsafe extern "C" fn get_info(_this: This) -> *mut c_void {
    ptr::null_mut()
}

unsafe extern "C" fn get_property_count(_this: This) -> c_uint {
    0
}

unsafe extern "C" fn get_property_by_name(_this: This, _name: *const c_char) -> *mut c_void {
    ptr::null_mut()
}

unsafe extern "C" fn get_property_by_index(_this: This, _index: c_uint) -> *mut c_void {
    ptr::null_mut()
}

unsafe extern "C" fn startup(this: This, version: HostLong) {
    unsafe { with_adapter(this, "startup", (), |a| a.startup(version)) }
}

unsafe extern "C" fn wants_telemetry_updates(this: This) -> HostLong {
    unsafe {
        with_adapter(this, "wants_telemetry_updates", 0, |a| {
            a.wants_telemetry_updates().code()
        })
    }
}

unsafe extern "C" fn update_hardware(this: This, delta_seconds: f64) {
    unsafe { with_adapter(this, "update_hardware", (), |a| a.update_hardware(delta_seconds)) }
}

unsafe extern "C" fn check_hw_control(this: This, control: *const c_char, value: *mut f64) -> bool {
    if control.is_null() {
        return false;
    }
    // SAFETY: the host passes a NUL-terminated name and a live double.
    let control = unsafe { CStr::from_ptr(control) }.to_string_lossy();
    let Some(value) = (unsafe { value.as_mut() }) else {
        return false;
    };
    unsafe { with_adapter(this, "check_hw_control", false, |a| a.check_hw_control(&control, value)) }
}

unsafe extern "C" fn error(this: This, message: *const c_char) {
    if message.is_null() {
        return;
    }
    // SAFETY: the host passes a NUL-terminated message.
    let message = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    unsafe { with_adapter(this, "error", (), |a| a.error(&message)) }
}

unsafe extern "C" fn access_weather(
    this: This,
    track_node_size: f64,
    info: *mut WeatherControlInfoV01,
) -> bool {
    // SAFETY: the host passes a reference, valid for the call.
    let Some(info) = (unsafe { info.as_mut() }) else {
        return false;
    };
    unsafe {
        with_adapter(this, "access_weather", false, |a| {
            a.access_weather(track_node_size, info)
        })
    }
}

unsafe extern "C" fn thread_started(this: This, code: HostLong) {
    unsafe { with_adapter(this, "thread_started", (), |a| a.thread_started(code)) }
}

unsafe extern "C" fn thread_stopping(this: This, code: HostLong) {
    unsafe { with_adapter(this, "thread_stopping", (), |a| a.thread_stopping(code)) }
}

unsafe extern "C" fn get_custom_variable(
    this: This,
    index: HostLong,
    var: *mut CustomVariableV01,
) -> bool {
    // SAFETY: the host passes a reference, valid for the call.
    let Some(var) = (unsafe { var.as_mut() }) else {
        return false;
    };
    unsafe {
        with_adapter(this, "get_custom_variable", false, |a| {
            a.get_custom_variable(index, var)
        })
    }
}

unsafe extern "C" fn get_custom_variable_setting(
    this: This,
    var: *mut CustomVariableV01,
    index: HostLong,
    setting: *mut CustomSettingV01,
) {
    // SAFETY: the host passes references, valid for the call.
    let (Some(var), Some(setting)) = (unsafe { var.as_mut() }, unsafe { setting.as_mut() }) else {
        return;
    };
    unsafe {
        with_adapter(this, "get_custom_variable_setting", (), |a| {
            a.get_custom_variable_setting(var, index, setting)
        })
    }
}
