//! Scoped platform configuration of the process environment.
//!
//! Native build steps for some platforms need environment variables set (or
//! checked) beforehand. [`configure`] returns a [`PlatformGuard`] that puts
//! every variable it touched back the way it was when it is dropped, whether
//! the build step succeeded or not.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::core::platform::{Platform, PlatformKind};
use crate::util::errors::DeployError;

/// The minimum Android API level supported.
pub const ANDROID_MINIMUM_API: u32 = 21;

/// Access to a set of environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
    fn set_var(&self, name: &str, value: &str);
    fn remove_var(&self, name: &str);
}

/// The environment of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set_var(&self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }

    fn remove_var(&self, name: &str) {
        std::env::remove_var(name);
    }
}

/// An in-memory environment.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RefCell<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        MapEnv::default()
    }

    pub fn with(self, name: &str, value: &str) -> Self {
        self.vars
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.borrow().get(name).cloned()
    }

    fn set_var(&self, name: &str, value: &str) {
        self.vars
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn remove_var(&self, name: &str) {
        self.vars.borrow_mut().remove(name);
    }
}

/// Restores the environment when dropped.
#[must_use = "the platform is deconfigured as soon as the guard is dropped"]
pub struct PlatformGuard<'e, E: Environment + ?Sized> {
    env: &'e E,
    platform: &'static Platform,
    /// Variables we changed with their original values.
    saved: Vec<(String, Option<String>)>,
}

impl<E: Environment + ?Sized> PlatformGuard<'_, E> {
    pub fn platform(&self) -> &'static Platform {
        self.platform
    }
}

impl<E: Environment + ?Sized> Drop for PlatformGuard<'_, E> {
    fn drop(&mut self) {
        for (name, original) in self.saved.drain(..).rev() {
            match original {
                Some(value) => self.env.set_var(&name, &value),
                None => self.env.remove_var(&name),
            }
        }
        debug!("deconfigured {}", self.platform.full_name);
    }
}

/// Configure the environment for building for a platform.
pub fn configure<'e, E: Environment + ?Sized>(
    platform: &'static Platform,
    env: &'e E,
) -> Result<PlatformGuard<'e, E>, DeployError> {
    for name in platform.required_env {
        if env.var(name).is_none() {
            return Err(DeployError::missing_with_help(
                format!("The {} environment variable must be set", name),
                format!("Set {} before building for {}", name, platform.full_name),
            ));
        }
    }

    if platform.kind == PlatformKind::Android {
        android_api(env)?;
    }

    let mut guard = PlatformGuard {
        env,
        platform,
        saved: Vec::new(),
    };

    if let Some(target) = platform.deployment_target {
        if env.var(target.var).is_none() {
            guard.saved.push((target.var.to_string(), None));
            env.set_var(target.var, target.default);
            debug!("set {}={}", target.var, target.default);
        }
    }

    debug!("configured {}", platform.full_name);

    Ok(guard)
}

/// The Android API level taken from `ANDROID_NDK_PLATFORM` (e.g. `android-24`).
pub fn android_api<E: Environment + ?Sized>(env: &E) -> Result<u32, DeployError> {
    let api = env
        .var("ANDROID_NDK_PLATFORM")
        .and_then(|value| {
            value
                .strip_prefix("android-")
                .and_then(|level| level.parse::<u32>().ok())
        })
        .filter(|api| *api >= ANDROID_MINIMUM_API);

    api.ok_or_else(|| {
        DeployError::missing(format!(
            "Use the ANDROID_NDK_PLATFORM environment variable to specify an API level >= {}",
            ANDROID_MINIMUM_API
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn android_env() -> MapEnv {
        MapEnv::new()
            .with("ANDROID_NDK_ROOT", "/opt/ndk")
            .with("ANDROID_NDK_PLATFORM", "android-24")
            .with("ANDROID_NDK_TOOLCHAIN_VERSION", "4.9")
    }

    #[test]
    fn test_macos_sets_and_restores_deployment_target() {
        let env = MapEnv::new();
        let macos = Platform::find("macos").unwrap();

        {
            let _guard = configure(macos, &env).unwrap();
            assert_eq!(env.var("MACOSX_DEPLOYMENT_TARGET").as_deref(), Some("10.10"));
        }

        assert_eq!(env.var("MACOSX_DEPLOYMENT_TARGET"), None);
    }

    #[test]
    fn test_user_deployment_target_is_kept() {
        let env = MapEnv::new().with("IPHONEOS_DEPLOYMENT_TARGET", "11.0");
        let ios = Platform::find("ios").unwrap();

        {
            let _guard = configure(ios, &env).unwrap();
            assert_eq!(env.var("IPHONEOS_DEPLOYMENT_TARGET").as_deref(), Some("11.0"));
        }

        assert_eq!(env.var("IPHONEOS_DEPLOYMENT_TARGET").as_deref(), Some("11.0"));
    }

    #[test]
    fn test_guard_restores_on_error_path() {
        fn failing_step(env: &MapEnv) -> Result<(), DeployError> {
            let _guard = configure(Platform::find("ios")?, env)?;
            Err(DeployError::config("step failed"))
        }

        let env = MapEnv::new();
        assert!(failing_step(&env).is_err());
        assert_eq!(env.var("IPHONEOS_DEPLOYMENT_TARGET"), None);
    }

    #[test]
    fn test_android_requires_ndk_vars() {
        let android = Platform::find("android").unwrap();

        let env = MapEnv::new().with("ANDROID_NDK_ROOT", "/opt/ndk");
        let err = configure(android, &env).err().unwrap();
        assert!(matches!(err, DeployError::MissingPrerequisite { .. }));
        assert!(err.to_string().contains("ANDROID_NDK_PLATFORM"));

        assert!(configure(android, &android_env()).is_ok());
    }

    #[test]
    fn test_android_api_level() {
        assert_eq!(android_api(&android_env()).unwrap(), 24);

        let old = MapEnv::new().with("ANDROID_NDK_PLATFORM", "android-19");
        assert!(android_api(&old).is_err());

        let junk = MapEnv::new().with("ANDROID_NDK_PLATFORM", "lollipop");
        assert!(android_api(&junk).is_err());
    }

    #[test]
    fn test_linux_changes_nothing() {
        let env = MapEnv::new();
        let guard = configure(Platform::find("linux").unwrap(), &env).unwrap();
        assert_eq!(guard.platform().name, "linux");
        assert!(env.vars.borrow().is_empty());
    }
}
