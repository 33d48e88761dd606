//! Safe dispatch of host callbacks to the registered capability hooks.

use crate::abi::{
    CameraControlInfoV01, CommentaryRequestInfoV01, CustomControlInfoV01, CustomSettingV01,
    CustomVariableV01, EnvironmentInfoV01, GraphicsInfoV01, GraphicsInfoV02, HostLong,
    MessageInfoV01, MultiSessionRulesV01, PhysicsOptionsV01, PitMenuV01, ScoringInfoV01,
    ScreenInfoV01, TelemInfoV01, TrackRulesV01, WeatherControlInfoV01,
};
use crate::context::{Environment, PluginContext};
use crate::hooks::{
    CustomVariableHooks, GraphicsHooks, HardwareHooks, MessageHooks, RulesHooks, ScoringHooks,
    ScreenHooks, SessionHooks, SessionInfo, TelemetryHooks, TelemetryRequest, ThreadKind,
    WeatherHooks,
};
use crate::messages;
use crate::notify::Notification;
use crate::server;
use rf2_core::{init_logging, AdapterConfig, LoggingGuard, PluginDirs};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

#[derive(Default)]
struct Hooks {
    session: Option<Mutex<Box<dyn SessionHooks>>>,
    scoring: Option<Mutex<Box<dyn ScoringHooks>>>,
    telemetry: Option<Mutex<Box<dyn TelemetryHooks>>>,
    graphics: Option<Mutex<Box<dyn GraphicsHooks>>>,
    hardware: Option<Mutex<Box<dyn HardwareHooks>>>,
    messages: Option<Mutex<Box<dyn MessageHooks>>>,
    screen: Option<Mutex<Box<dyn ScreenHooks>>>,
    weather: Option<Mutex<Box<dyn WeatherHooks>>>,
    custom_variables: Option<Mutex<Box<dyn CustomVariableHooks>>>,
    rules: Option<Mutex<Box<dyn RulesHooks>>>,
}

/// Calls a hook of capability `$cap` under its lock, or yields `$default`
/// when the plugin did not register it.
macro_rules! dispatch {
    ($self:ident, $cap:ident, $default:expr, |$hook:ident, $ctx:ident| $call:expr) => {
        match &$self.hooks.$cap {
            Some(slot) => {
                let mut guard = lock(slot);
                let $hook = &mut **guard;
                let $ctx = &$self.ctx;
                $call
            }
            None => $default,
        }
    };
}

/// A hook that panicked mid-call leaves its own state as it was; the lock
/// itself stays usable.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builder for a [`PluginAdapter`].
pub struct PluginBuilder {
    name: String,
    root_dir: Option<PathBuf>,
    library_file: Option<String>,
    server: Option<bool>,
    install_logging: bool,
    hooks: Hooks,
}

impl PluginBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_dir: None,
            library_file: None,
            server: None,
            install_logging: true,
            hooks: Hooks::default(),
        }
    }

    /// Game root holding the `Plugins` directory; defaults to the working
    /// directory the host starts in.
    pub fn root_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(root.into());
        self
    }

    /// Library file name used to find this plugin's host options; defaults
    /// to `<name>.dll`.
    pub fn library_file(mut self, file: impl Into<String>) -> Self {
        self.library_file = Some(file.into());
        self
    }

    /// Forces server or client mode, overriding `adapter.toml` and executable detection.
    pub fn server(mut self, is_server: bool) -> Self {
        self.server = Some(is_server);
        self
    }

    /// Leaves the global tracing subscriber alone at startup.
    pub fn without_logging(mut self) -> Self {
        self.install_logging = false;
        self
    }

    pub fn session(mut self, hooks: impl SessionHooks + 'static) -> Self {
        self.hooks.session = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn scoring(mut self, hooks: impl ScoringHooks + 'static) -> Self {
        self.hooks.scoring = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn telemetry(mut self, hooks: impl TelemetryHooks + 'static) -> Self {
        self.hooks.telemetry = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn graphics(mut self, hooks: impl GraphicsHooks + 'static) -> Self {
        self.hooks.graphics = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn hardware(mut self, hooks: impl HardwareHooks + 'static) -> Self {
        self.hooks.hardware = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn messages(mut self, hooks: impl MessageHooks + 'static) -> Self {
        self.hooks.messages = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn screen(mut self, hooks: impl ScreenHooks + 'static) -> Self {
        self.hooks.screen = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn weather(mut self, hooks: impl WeatherHooks + 'static) -> Self {
        self.hooks.weather = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn custom_variables(mut self, hooks: impl CustomVariableHooks + 'static) -> Self {
        self.hooks.custom_variables = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn rules(mut self, hooks: impl RulesHooks + 'static) -> Self {
        self.hooks.rules = Some(Mutex::new(Box::new(hooks)));
        self
    }

    pub fn build(self) -> PluginAdapter {
        let dirs = match self.root_dir {
            Some(root) => PluginDirs::with_root(root, &self.name),
            None => PluginDirs::discover(&self.name).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "using relative plugin directory");
                PluginDirs::with_root(".", &self.name)
            }),
        };
        let library_file = self
            .library_file
            .unwrap_or_else(|| format!("{}.dll", self.name));

        PluginAdapter {
            ctx: PluginContext::new(self.name, library_file, dirs),
            hooks: self.hooks,
            server_override: self.server,
            install_logging: self.install_logging,
            config: RwLock::new(AdapterConfig::default()),
            track_loaded: Mutex::new(Notification::default()),
            session_started: Mutex::new(Notification::default()),
            logging_guard: Mutex::new(None),
        }
    }
}

/// One plugin instance: host callbacks in, hook calls out.
///
/// The host calls in from several threads (simulation, hardware input), so
/// every method takes `&self`. Each capability sits behind its own lock:
/// calls into one capability are serialized, calls into different
/// capabilities run in parallel.
pub struct PluginAdapter {
    ctx: PluginContext,
    hooks: Hooks,
    server_override: Option<bool>,
    install_logging: bool,
    config: RwLock<AdapterConfig>,
    track_loaded: Mutex<Notification>,
    session_started: Mutex<Notification>,
    logging_guard: Mutex<Option<LoggingGuard>>,
}

impl PluginAdapter {
    pub fn builder(name: impl Into<String>) -> PluginBuilder {
        PluginBuilder::new(name)
    }

    pub fn context(&self) -> &PluginContext {
        &self.ctx
    }

    /// The adapter configuration loaded at startup.
    pub fn config(&self) -> AdapterConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Loads `adapter.toml`, installs logging and resolves server mode
    /// before the plugin's own startup hook runs.
    pub fn startup(&self, version: HostLong) {
        let config_result = AdapterConfig::load_or_default(self.ctx.dirs());
        let config = match &config_result {
            Ok(config) => config.clone(),
            Err(_) => AdapterConfig::default(),
        };

        let wants_logging = self.install_logging && config.logging.level.is_enabled();
        let mut logging_guard = lock(&self.logging_guard);
        if wants_logging && logging_guard.is_none() {
            match init_logging(&config.logging, self.ctx.dirs()) {
                Ok(guard) => *logging_guard = Some(guard),
                Err(err) => eprintln!("[{}] logging disabled: {err}", self.ctx.name()),
            }
        }
        drop(logging_guard);
        if let Err(err) = config_result {
            tracing::warn!(error = %err, "invalid adapter config, using defaults");
        }

        let is_server = match self.server_override {
            Some(is_server) => is_server,
            None => server::resolve(config.server_mode, server::detect_current_exe),
        };
        self.ctx.set_server(is_server);
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;

        tracing::info!(
            plugin = %self.ctx.name(),
            version,
            is_server,
            "plugin started"
        );
        dispatch!(self, session, (), |h, ctx| h.startup(ctx, version))
    }

    pub fn shutdown(&self) {
        tracing::info!(plugin = %self.ctx.name(), "plugin shutting down");
        dispatch!(self, session, (), |h, ctx| h.shutdown(ctx))
    }

    pub fn load(&self) {
        lock(&self.track_loaded).arm();
        dispatch!(self, session, (), |h, ctx| h.load(ctx))
    }

    pub fn unload(&self) {
        dispatch!(self, session, (), |h, ctx| h.unload(ctx))
    }

    pub fn start_session(&self) {
        lock(&self.session_started).arm();
        dispatch!(self, session, (), |h, ctx| h.start_session(ctx))
    }

    pub fn end_session(&self) {
        dispatch!(self, session, (), |h, ctx| h.end_session(ctx))
    }

    pub fn enter_realtime(&self) {
        dispatch!(self, session, (), |h, ctx| h.enter_realtime(ctx))
    }

    pub fn exit_realtime(&self) {
        dispatch!(self, session, (), |h, ctx| h.exit_realtime(ctx))
    }

    pub fn wants_scoring_updates(&self) -> bool {
        dispatch!(self, scoring, false, |h, ctx| h.wants_scoring_updates(ctx))
    }

    /// Fires pending track/session notifications, then the scoring hook.
    pub fn update_scoring(&self, info: &ScoringInfoV01) {
        if lock(&self.track_loaded).take() {
            let track = info.track_name();
            let lap_distance = info.lap_dist;
            tracing::debug!(track = %track, lap_distance, "track loaded");
            dispatch!(self, session, (), |h, ctx| h.track_loaded(ctx, &track, lap_distance));
        }
        if lock(&self.session_started).take() {
            let session = SessionInfo::from_scoring(info);
            tracing::debug!(
                code = session.code,
                kind = ?session.kind,
                duration = session.duration,
                max_laps = session.max_laps,
                "session started"
            );
            dispatch!(self, session, (), |h, ctx| h.session_started(ctx, &session));
        }
        dispatch!(self, scoring, (), |h, ctx| h.update_scoring(ctx, info))
    }

    pub fn wants_telemetry_updates(&self) -> TelemetryRequest {
        dispatch!(self, telemetry, TelemetryRequest::Off, |h, ctx| h
            .wants_telemetry_updates(ctx))
    }

    pub fn update_telemetry(&self, info: &TelemInfoV01) {
        dispatch!(self, telemetry, (), |h, ctx| h.update_telemetry(ctx, info))
    }

    pub fn wants_graphics_updates(&self) -> bool {
        dispatch!(self, graphics, false, |h, ctx| h.wants_graphics_updates(ctx))
    }

    pub fn update_graphics(&self, info: &GraphicsInfoV01) {
        dispatch!(self, graphics, (), |h, ctx| h.update_graphics(ctx, info))
    }

    pub fn update_graphics_v2(&self, info: &GraphicsInfoV02) {
        dispatch!(self, graphics, (), |h, ctx| h.update_graphics_v2(ctx, info))
    }

    pub fn wants_to_view_vehicle(&self, camera: &mut CameraControlInfoV01) -> u8 {
        dispatch!(self, graphics, 0, |h, ctx| h.wants_to_view_vehicle(ctx, camera))
    }

    pub fn request_commentary(&self, info: &mut CommentaryRequestInfoV01) -> bool {
        dispatch!(self, messages, false, |h, ctx| h.request_commentary(ctx, info))
    }

    pub fn has_hardware_inputs(&self) -> bool {
        dispatch!(self, hardware, false, |h, ctx| h.has_hardware_inputs(ctx))
    }

    pub fn update_hardware(&self, delta_seconds: f64) {
        dispatch!(self, hardware, (), |h, ctx| h.update_hardware(ctx, delta_seconds))
    }

    pub fn enable_hardware(&self) {
        dispatch!(self, hardware, (), |h, ctx| h.enable_hardware(ctx))
    }

    pub fn disable_hardware(&self) {
        dispatch!(self, hardware, (), |h, ctx| h.disable_hardware(ctx))
    }

    pub fn check_hw_control(&self, control: &str, value: &mut f64) -> bool {
        dispatch!(self, hardware, false, |h, ctx| h.check_hw_control(ctx, control, value))
    }

    pub fn force_feedback(&self, force: &mut f64) -> bool {
        dispatch!(self, hardware, false, |h, ctx| h.force_feedback(ctx, force))
    }

    pub fn init_custom_control(&self, info: &mut CustomControlInfoV01) -> bool {
        dispatch!(self, hardware, false, |h, ctx| h.init_custom_control(ctx, info))
    }

    pub fn error(&self, message: &str) {
        tracing::warn!(host_message = message, "host reported an error");
        dispatch!(self, session, (), |h, ctx| h.error(ctx, message))
    }

    pub fn set_physics_options(&self, options: &mut PhysicsOptionsV01) {
        dispatch!(self, session, (), |h, ctx| h.set_physics_options(ctx, options))
    }

    /// Hands the oldest queued message to the host, or asks the message
    /// hook when the queue is empty.
    pub fn wants_to_display_message(&self, info: &mut MessageInfoV01) -> bool {
        if let Some(text) = self.ctx.next_message() {
            messages::deliver(info, &text, self.ctx.is_server());
            return true;
        }
        dispatch!(self, messages, false, |h, ctx| h.wants_to_display_message(ctx, info))
    }

    pub fn set_environment(&self, info: &EnvironmentInfoV01) {
        let environment = Environment::from_info(info);
        tracing::debug!(?environment, "environment updated");
        self.ctx.set_environment(environment);
        dispatch!(self, session, (), |h, ctx| h.set_environment(ctx, info))
    }

    pub fn init_screen(&self, info: &ScreenInfoV01) {
        dispatch!(self, screen, (), |h, ctx| h.init_screen(ctx, info))
    }

    pub fn uninit_screen(&self, info: &ScreenInfoV01) {
        dispatch!(self, screen, (), |h, ctx| h.uninit_screen(ctx, info))
    }

    pub fn deactivate_screen(&self, info: &ScreenInfoV01) {
        dispatch!(self, screen, (), |h, ctx| h.deactivate_screen(ctx, info))
    }

    pub fn reactivate_screen(&self, info: &ScreenInfoV01) {
        dispatch!(self, screen, (), |h, ctx| h.reactivate_screen(ctx, info))
    }

    pub fn render_screen_before_overlays(&self, info: &ScreenInfoV01) {
        dispatch!(self, screen, (), |h, ctx| h.render_before_overlays(ctx, info))
    }

    pub fn render_screen_after_overlays(&self, info: &ScreenInfoV01) {
        dispatch!(self, screen, (), |h, ctx| h.render_after_overlays(ctx, info))
    }

    pub fn pre_reset(&self, info: &ScreenInfoV01) {
        dispatch!(self, screen, (), |h, ctx| h.pre_reset(ctx, info))
    }

    pub fn post_reset(&self, info: &ScreenInfoV01) {
        dispatch!(self, screen, (), |h, ctx| h.post_reset(ctx, info))
    }

    pub fn wants_weather_access(&self) -> bool {
        dispatch!(self, weather, false, |h, ctx| h.wants_weather_access(ctx))
    }

    pub fn access_weather(&self, track_node_size: f64, info: &mut WeatherControlInfoV01) -> bool {
        dispatch!(self, weather, false, |h, ctx| h.access_weather(ctx, track_node_size, info))
    }

    pub fn thread_started(&self, code: HostLong) {
        let kind = ThreadKind::from_code(code);
        tracing::debug!(?kind, "host thread started");
        dispatch!(self, session, (), |h, ctx| h.thread_started(ctx, kind))
    }

    pub fn thread_stopping(&self, code: HostLong) {
        let kind = ThreadKind::from_code(code);
        tracing::debug!(?kind, "host thread stopping");
        dispatch!(self, session, (), |h, ctx| h.thread_stopping(ctx, kind))
    }

    pub fn get_custom_variable(&self, index: HostLong, var: &mut CustomVariableV01) -> bool {
        dispatch!(self, custom_variables, false, |h, ctx| h.get_custom_variable(ctx, index, var))
    }

    pub fn access_custom_variable(&self, var: &mut CustomVariableV01) {
        dispatch!(self, custom_variables, (), |h, ctx| h.access_custom_variable(ctx, var))
    }

    pub fn get_custom_variable_setting(
        &self,
        var: &mut CustomVariableV01,
        index: HostLong,
        setting: &mut CustomSettingV01,
    ) {
        dispatch!(self, custom_variables, (), |h, ctx| h
            .get_custom_variable_setting(ctx, var, index, setting))
    }

    pub fn wants_multi_session_rules_access(&self) -> bool {
        dispatch!(self, rules, false, |h, ctx| h.wants_multi_session_rules_access(ctx))
    }

    pub fn access_multi_session_rules(&self, info: &mut MultiSessionRulesV01) -> bool {
        dispatch!(self, rules, false, |h, ctx| h.access_multi_session_rules(ctx, info))
    }

    pub fn wants_track_rules_access(&self) -> bool {
        dispatch!(self, rules, false, |h, ctx| h.wants_track_rules_access(ctx))
    }

    pub fn access_track_rules(&self, info: &mut TrackRulesV01) -> bool {
        dispatch!(self, rules, false, |h, ctx| h.access_track_rules(ctx, info))
    }

    pub fn wants_pit_menu_access(&self) -> bool {
        dispatch!(self, rules, false, |h, ctx| h.wants_pit_menu_access(ctx))
    }

    pub fn access_pit_menu(&self, info: &mut PitMenuV01) -> bool {
        dispatch!(self, rules, false, |h, ctx| h.access_pit_menu(ctx, info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{DESTINATION_BROADCAST, DESTINATION_LOCAL};
    use rf2_core::SessionType;
    use std::fs;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Startup(HostLong),
        TrackLoaded(String, f64),
        SessionStarted(SessionInfo),
        Scoring,
        Message(String),
    }

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl Recorder {
        fn push(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }

        fn take(&self) -> Vec<Event> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }
    }

    impl SessionHooks for Recorder {
        fn startup(&mut self, ctx: &PluginContext, version: HostLong) {
            let foo = ctx.settings().read("section1", "foo", 100);
            self.push(Event::Startup(version + foo));
        }

        fn track_loaded(&mut self, _ctx: &PluginContext, track: &str, lap_distance: f64) {
            self.push(Event::TrackLoaded(track.to_string(), lap_distance));
        }

        fn session_started(&mut self, _ctx: &PluginContext, session: &SessionInfo) {
            self.push(Event::SessionStarted(*session));
        }
    }

    impl ScoringHooks for Recorder {
        fn update_scoring(&mut self, _ctx: &PluginContext, _info: &ScoringInfoV01) {
            self.push(Event::Scoring);
        }
    }

    impl MessageHooks for Recorder {
        fn wants_to_display_message(&mut self, _ctx: &PluginContext, info: &mut MessageInfoV01) -> bool {
            self.push(Event::Message(info.text()));
            false
        }
    }

    fn adapter(root: &std::path::Path, recorder: &Recorder) -> PluginAdapter {
        PluginAdapter::builder("Example")
            .root_dir(root)
            .server(false)
            .without_logging()
            .session(recorder.clone())
            .scoring(recorder.clone())
            .messages(recorder.clone())
            .build()
    }

    fn scoring(track: &str, lap_dist: f64, session: i32) -> ScoringInfoV01 {
        let mut info = ScoringInfoV01::default();
        info.set_track_name(track);
        info.lap_dist = lap_dist;
        info.session = session;
        info.end_et = 3600.0;
        info.max_laps = 30;
        info
    }

    #[test]
    fn unregistered_capabilities_answer_host_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let adapter = PluginAdapter::builder("Bare")
            .root_dir(tmp.path())
            .server(false)
            .without_logging()
            .build();

        adapter.startup(7);
        assert!(!adapter.wants_scoring_updates());
        assert_eq!(adapter.wants_telemetry_updates(), TelemetryRequest::Off);
        assert!(!adapter.wants_graphics_updates());
        assert!(!adapter.has_hardware_inputs());
        assert!(!adapter.wants_weather_access());
        assert!(!adapter.wants_pit_menu_access());
        let mut force = 0.25;
        assert!(!adapter.force_feedback(&mut force));
        assert_eq!(force, 0.25);
        adapter.update_scoring(&scoring("Spa", 7004.0, 1));
        let mut info = MessageInfoV01::default();
        assert!(!adapter.wants_to_display_message(&mut info));
    }

    #[test]
    fn startup_runs_hook_with_settings_available() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();
        let adapter = adapter(tmp.path(), &recorder);
        let ini = adapter.context().settings().file_path("Example");
        fs::create_dir_all(ini.parent().unwrap()).unwrap();
        fs::write(&ini, "[section1]\nfoo=5\n").unwrap();

        adapter.startup(7);

        assert_eq!(recorder.take(), vec![Event::Startup(12)]);
        assert!(!adapter.context().is_server());
    }

    #[test]
    fn track_loaded_fires_once_per_load() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();
        let adapter = adapter(tmp.path(), &recorder);
        let info = scoring("Monza", 5793.0, 10);

        adapter.update_scoring(&info);
        assert_eq!(recorder.take(), vec![Event::Scoring]);

        adapter.load();
        adapter.update_scoring(&info);
        adapter.update_scoring(&info);
        assert_eq!(
            recorder.take(),
            vec![
                Event::TrackLoaded("Monza".into(), 5793.0),
                Event::Scoring,
                Event::Scoring,
            ]
        );

        adapter.load();
        adapter.update_scoring(&info);
        assert_eq!(
            recorder.take(),
            vec![Event::TrackLoaded("Monza".into(), 5793.0), Event::Scoring]
        );
    }

    #[test]
    fn session_started_maps_code_and_fires_once() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();
        let adapter = adapter(tmp.path(), &recorder);

        adapter.load();
        adapter.start_session();
        adapter.update_scoring(&scoring("Sebring", 6019.0, 5));
        adapter.update_scoring(&scoring("Sebring", 6019.0, 5));

        assert_eq!(
            recorder.take(),
            vec![
                Event::TrackLoaded("Sebring".into(), 6019.0),
                Event::SessionStarted(SessionInfo {
                    kind: Some(SessionType::Q1),
                    code: 5,
                    duration: 3600.0,
                    max_laps: 30,
                }),
                Event::Scoring,
                Event::Scoring,
            ]
        );
    }

    #[test]
    fn queued_messages_are_delivered_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();
        let adapter = adapter(tmp.path(), &recorder);
        for idx in 0..3 {
            adapter.context().display_message(format!("msg {idx}"));
        }

        let mut seen = Vec::new();
        for _ in 0..3 {
            let mut info = MessageInfoV01::default();
            assert!(adapter.wants_to_display_message(&mut info));
            assert_eq!(info.destination, DESTINATION_LOCAL);
            seen.push(info.text());
        }
        assert_eq!(seen, vec!["msg 0", "msg 1", "msg 2"]);
        assert!(recorder.take().is_empty());

        let mut info = MessageInfoV01::default();
        assert!(!adapter.wants_to_display_message(&mut info));
        assert_eq!(recorder.take(), vec![Event::Message(String::new())]);
    }

    #[test]
    fn server_messages_are_broadcast() {
        let tmp = tempfile::tempdir().unwrap();
        let adapter = PluginAdapter::builder("Example")
            .root_dir(tmp.path())
            .server(true)
            .without_logging()
            .build();
        adapter.startup(7);
        adapter.context().display_message("race control");

        let mut info = MessageInfoV01::default();
        assert!(adapter.wants_to_display_message(&mut info));
        assert_eq!(info.destination, DESTINATION_BROADCAST);
    }

    #[test]
    fn server_mode_comes_from_config_without_override() {
        let tmp = tempfile::tempdir().unwrap();
        let adapter = PluginAdapter::builder("Example")
            .root_dir(tmp.path())
            .without_logging()
            .build();
        let config = rf2_core::AdapterConfig::config_path(adapter.context().dirs());
        fs::create_dir_all(config.parent().unwrap()).unwrap();
        fs::write(&config, "server_mode = \"server\"\n").unwrap();

        adapter.startup(7);

        assert!(adapter.context().is_server());
        assert_eq!(adapter.config().server_mode, rf2_core::ServerMode::Server);
    }

    #[test]
    fn invalid_config_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let adapter = PluginAdapter::builder("Example")
            .root_dir(tmp.path())
            .server(false)
            .without_logging()
            .build();
        let config = rf2_core::AdapterConfig::config_path(adapter.context().dirs());
        fs::create_dir_all(config.parent().unwrap()).unwrap();
        fs::write(&config, "config_version = 99\n").unwrap();

        adapter.startup(7);

        assert_eq!(adapter.config().config_version, 1);
    }

    #[test]
    fn environment_paths_are_captured() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();
        let adapter = adapter(tmp.path(), &recorder);
        let user_data = std::ffi::CString::new("UserData").unwrap();
        let results = std::ffi::CString::new("UserData/Log/Results/r.xml").unwrap();
        let mut env = EnvironmentInfoV01::default();
        unsafe {
            env.set_path(crate::abi::PATH_USER_DATA, user_data.as_ptr());
            env.set_path(crate::abi::PATH_LATEST_RESULTS, results.as_ptr());
        }

        adapter.set_environment(&env);

        let ctx = adapter.context();
        assert_eq!(ctx.user_data_dir(), Some(PathBuf::from("UserData")));
        assert_eq!(ctx.plugin_options_file(), None);
        assert_eq!(
            ctx.latest_results_file(),
            Some(PathBuf::from("UserData/Log/Results/r.xml"))
        );
    }
}
