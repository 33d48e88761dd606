/// Emits the five functions the host's plugin loader looks up by name.
///
/// The first argument is the display name shown by the host; the second
/// builds the [`PluginAdapter`](crate::PluginAdapter) for each new instance.
///
/// ```rust,ignore
/// rf2_plugin::declare_plugin!("ExamplePlugin", {
///     PluginAdapter::builder("Example")
///         .session(Example::default())
///         .build()
/// });
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($name:literal, $create:expr) => {
        #[no_mangle]
        #[allow(non_snake_case)]
        pub extern "C" fn GetPluginName() -> *const ::std::os::raw::c_char {
            ::std::concat!($name, "\0").as_ptr().cast()
        }

        #[no_mangle]
        #[allow(non_snake_case)]
        pub extern "C" fn GetPluginType() -> $crate::abi::PluginObjectType {
            $crate::abi::PluginObjectType::Internals
        }

        #[no_mangle]
        #[allow(non_snake_case)]
        pub extern "C" fn GetPluginVersion() -> i32 {
            $crate::abi::INTERFACE_VERSION
        }

        #[no_mangle]
        #[allow(non_snake_case)]
        pub extern "C" fn CreatePluginObject() -> *mut $crate::PluginObject {
            $crate::object::create_plugin_object(|| $create)
        }

        /// # Safety
        /// `object` must be null or a pointer returned by `CreatePluginObject`.
        #[no_mangle]
        #[allow(non_snake_case)]
        pub unsafe extern "C" fn DestroyPluginObject(object: *mut $crate::PluginObject) {
            unsafe { $crate::PluginObject::destroy(object) }
        }
    };
}
