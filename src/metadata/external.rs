//! External C libraries used by standard library extension modules.
//!
//! Each library has built-in per-platform defaults. A project may override
//! them, or restrict the library to some targets with a scope. A library is
//! unavailable for a target when it ends up with no link flags.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::platform::{Architecture, PlatformKind};
use crate::core::scope::TargetExpression;

/// The compiler and linker values for an external library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryFlags {
    pub defines: String,
    pub includepath: String,
    pub libs: String,
}

impl LibraryFlags {
    fn libs(libs: &str) -> Self {
        LibraryFlags {
            libs: libs.to_string(),
            ..Default::default()
        }
    }
}

/// A project's settings for an external library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LibraryOverride {
    pub defines: String,
    pub includepath: String,
    pub libs: String,
    /// Where the library may be used.
    pub scope: TargetExpression,
}

/// A known external library.
#[derive(Debug, Clone, Copy)]
pub struct ExternalLibrary {
    pub id: &'static str,
    pub user_name: &'static str,
    default_libs: &'static str,
    /// Platforms where the default differs.
    platform_libs: &'static [(PlatformKind, &'static str)],
}

use PlatformKind::{Android, Ios, MacOs, Windows};

/// The known external libraries.
pub const EXTERNAL_LIBRARIES: &[ExternalLibrary] = &[
    ExternalLibrary {
        id: "crypt",
        user_name: "DES encryption library",
        default_libs: "-lcrypt",
        platform_libs: &[(Android, ""), (MacOs, ""), (Ios, ""), (Windows, "")],
    },
    ExternalLibrary {
        id: "ssl",
        user_name: "SSL encryption library",
        default_libs: "-lssl -lcrypto",
        platform_libs: &[(Windows, "-llibeay32 -lssleay32")],
    },
    ExternalLibrary {
        id: "bz2",
        user_name: "bz2 compression library",
        default_libs: "-lbz2",
        platform_libs: &[],
    },
    ExternalLibrary {
        id: "lzma",
        user_name: "LZMA compression library",
        default_libs: "-llzma",
        platform_libs: &[],
    },
    ExternalLibrary {
        id: "zlib",
        user_name: "zlib compression library",
        default_libs: "-lz",
        platform_libs: &[(Windows, "-lzlib")],
    },
    ExternalLibrary {
        id: "bsddb",
        user_name: "BSD db database library",
        default_libs: "-ldb",
        platform_libs: &[],
    },
    ExternalLibrary {
        id: "dbm",
        user_name: "dbm database library",
        default_libs: "-lndbm",
        platform_libs: &[(Windows, "")],
    },
    ExternalLibrary {
        id: "gdbm",
        user_name: "gdbm database library",
        default_libs: "-lgdbm",
        platform_libs: &[(Windows, "")],
    },
    ExternalLibrary {
        id: "readline",
        user_name: "readline library",
        default_libs: "-lreadline -ltermcap",
        platform_libs: &[(Windows, "")],
    },
    ExternalLibrary {
        id: "curses",
        user_name: "Curses library",
        default_libs: "-lcurses -ltermcap",
        platform_libs: &[(Windows, "")],
    },
    ExternalLibrary {
        id: "panel",
        user_name: "Curses panel library",
        default_libs: "-lpanel -lcurses",
        platform_libs: &[(Windows, "")],
    },
    ExternalLibrary {
        id: "intl",
        user_name: "i18n library",
        default_libs: "-lintl",
        platform_libs: &[(Android, ""), (Windows, "")],
    },
    ExternalLibrary {
        id: "math",
        user_name: "Math library",
        default_libs: "-lm",
        platform_libs: &[(Windows, "")],
    },
    ExternalLibrary {
        id: "nsl",
        user_name: "Network services library",
        default_libs: "-lnsl",
        platform_libs: &[(Android, ""), (MacOs, ""), (Ios, ""), (Windows, "")],
    },
    ExternalLibrary {
        id: "ffi",
        user_name: "Foreign function interface library",
        default_libs: "-lffi",
        platform_libs: &[(Windows, "")],
    },
];

/// Find a known external library.
pub fn find(id: &str) -> Option<&'static ExternalLibrary> {
    EXTERNAL_LIBRARIES.iter().find(|lib| lib.id == id)
}

/// The built-in defaults for a library on a platform.
pub fn defaults(id: &str, platform: PlatformKind) -> Option<LibraryFlags> {
    let lib = find(id)?;
    let libs = lib
        .platform_libs
        .iter()
        .find(|(kind, _)| *kind == platform)
        .map(|(_, libs)| *libs)
        .unwrap_or(lib.default_libs);

    Some(LibraryFlags::libs(libs))
}

/// The external library settings for one build target.
#[derive(Debug, Clone, Copy)]
pub struct ExternalLibraries<'a> {
    overrides: &'a BTreeMap<String, LibraryOverride>,
    arch: &'a Architecture,
}

impl<'a> ExternalLibraries<'a> {
    pub fn new(overrides: &'a BTreeMap<String, LibraryOverride>, arch: &'a Architecture) -> Self {
        ExternalLibraries { overrides, arch }
    }

    /// The flags to use for a library, or `None` if it is unavailable.
    ///
    /// Project values are used when they give any link flags, otherwise the
    /// built-in defaults for the platform are used.
    pub fn flags(&self, id: &str) -> Option<LibraryFlags> {
        let project = self.overrides.get(id);

        if let Some(project) = project {
            if !project.scope.covers(self.arch) {
                return None;
            }

            if !project.libs.trim().is_empty() {
                return Some(LibraryFlags {
                    defines: project.defines.clone(),
                    includepath: project.includepath.clone(),
                    libs: project.libs.clone(),
                });
            }
        }

        let mut flags = defaults(id, self.arch.platform_kind())?;
        if let Some(project) = project {
            flags.defines = project.defines.clone();
            flags.includepath = project.includepath.clone();
        }

        if flags.libs.trim().is_empty() {
            None
        } else {
            Some(flags)
        }
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.flags(id).is_some()
    }
}
