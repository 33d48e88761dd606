use crate::abi::{EnvironmentInfoV01, PATH_LATEST_RESULTS, PATH_PLUGIN_OPTIONS, PATH_USER_DATA};
use crate::messages::MessageSender;
use rf2_core::{OptionsError, PluginDirs, PluginOptions, PluginSettings};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// Paths captured from the host's environment notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub user_data_dir: Option<PathBuf>,
    pub plugin_options_file: Option<PathBuf>,
    pub latest_results_file: Option<PathBuf>,
}

impl Environment {
    pub fn from_info(info: &EnvironmentInfoV01) -> Self {
        Self {
            user_data_dir: info.path(PATH_USER_DATA).map(PathBuf::from),
            plugin_options_file: info.path(PATH_PLUGIN_OPTIONS).map(PathBuf::from),
            latest_results_file: info.path(PATH_LATEST_RESULTS).map(PathBuf::from),
        }
    }
}

/// Adapter state that every hook can see.
///
/// Shared by all host threads; the server flag and the environment are
/// updated in place by the adapter.
#[derive(Debug)]
pub struct PluginContext {
    name: String,
    library_file: String,
    dirs: PluginDirs,
    settings: PluginSettings,
    messages: MessageSender,
    is_server: AtomicBool,
    environment: RwLock<Environment>,
}

impl PluginContext {
    pub(crate) fn new(name: String, library_file: String, dirs: PluginDirs) -> Self {
        Self {
            settings: PluginSettings::new(dirs.clone()),
            name,
            library_file,
            dirs,
            messages: MessageSender::new(),
            is_server: AtomicBool::new(false),
            environment: RwLock::new(Environment::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name of the plugin library, the key of its entry in the host's
    /// plugin options file.
    pub fn library_file(&self) -> &str {
        &self.library_file
    }

    /// `true` when running inside the dedicated server. Resolved at startup.
    pub fn is_server(&self) -> bool {
        self.is_server.load(Ordering::Relaxed)
    }

    pub(crate) fn set_server(&self, is_server: bool) {
        self.is_server.store(is_server, Ordering::Relaxed);
    }

    pub fn dirs(&self) -> &PluginDirs {
        &self.dirs
    }

    /// Typed access to `Plugins/<plugin>/*.ini`.
    pub fn settings(&self) -> &PluginSettings {
        &self.settings
    }

    /// Snapshot of the paths from the last environment notification.
    pub fn environment(&self) -> Environment {
        self.environment
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_environment(&self, environment: Environment) {
        *self
            .environment
            .write()
            .unwrap_or_else(PoisonError::into_inner) = environment;
    }

    pub fn user_data_dir(&self) -> Option<PathBuf> {
        self.environment().user_data_dir
    }

    pub fn plugin_options_file(&self) -> Option<PathBuf> {
        self.environment().plugin_options_file
    }

    pub fn latest_results_file(&self) -> Option<PathBuf> {
        self.environment().latest_results_file
    }

    /// This plugin's entry in the host's options file, once the host has
    /// announced where that file lives.
    pub fn plugin_options(&self) -> Result<Option<PluginOptions>, OptionsError> {
        match self.plugin_options_file() {
            Some(path) => PluginOptions::load(&path, &self.library_file),
            None => Ok(None),
        }
    }

    /// Queues a chat-style message; the host picks it up on its next poll.
    pub fn display_message(&self, text: impl Into<String>) {
        self.messages.send(text);
    }

    /// Handle for queueing messages from threads that do not own the context.
    pub fn message_sender(&self) -> MessageSender {
        self.messages.clone()
    }

    pub(crate) fn next_message(&self) -> Option<String> {
        self.messages.take_next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::fs;
    use std::path::Path;

    fn context(root: &Path) -> PluginContext {
        PluginContext::new(
            "Example".into(),
            "Example.dll".into(),
            PluginDirs::with_root(root, "Example"),
        )
    }

    #[test]
    fn environment_captures_three_paths() {
        let user_data = CString::new("UserData").unwrap();
        let options = CString::new("UserData/player/CustomPluginVariables.JSON").unwrap();
        let results = CString::new("UserData/Log/Results/latest.xml").unwrap();
        let mut info = EnvironmentInfoV01::default();
        unsafe {
            info.set_path(PATH_USER_DATA, user_data.as_ptr());
            info.set_path(PATH_PLUGIN_OPTIONS, options.as_ptr());
            info.set_path(PATH_LATEST_RESULTS, results.as_ptr());
        }

        let env = Environment::from_info(&info);
        assert_eq!(env.user_data_dir, Some(PathBuf::from("UserData")));
        assert_eq!(
            env.latest_results_file,
            Some(PathBuf::from("UserData/Log/Results/latest.xml"))
        );
        assert!(env.plugin_options_file.is_some());
    }

    #[test]
    fn plugin_options_need_an_environment() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        assert_eq!(ctx.plugin_options().unwrap(), None);

        let file = tmp.path().join("CustomPluginVariables.JSON");
        fs::write(&file, r#"{"Example.dll": {" Enabled": 1, "Volume": 3}}"#).unwrap();
        ctx.set_environment(Environment {
            plugin_options_file: Some(file),
            ..Environment::default()
        });

        let options = ctx.plugin_options().unwrap().unwrap();
        assert!(options.enabled());
        assert_eq!(options.get_i64("Volume"), Some(3));
    }

    #[test]
    fn display_message_shares_the_sender_queue() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path());
        let sender = ctx.message_sender();

        ctx.display_message("first");
        sender.send("second");
        crate::display_message!(ctx, "lap {}", 3);

        assert_eq!(ctx.next_message().as_deref(), Some("first"));
        assert_eq!(ctx.next_message().as_deref(), Some("second"));
        assert_eq!(ctx.next_message().as_deref(), Some("lap 3"));
        assert_eq!(ctx.next_message(), None);
    }
}
