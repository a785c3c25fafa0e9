//! GUI toolkit binding module tables.
//!
//! Each binding has its own table. A module lists the `QT` and `CONFIG`
//! values it needs when built against Qt4 and against Qt5 so the descriptor
//! can emit the shared ones unconditionally.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::core::scope::TargetExpression;
use crate::util::errors::DeployError;

/// A toolkit binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Binding {
    PyQt4,
    PyQt5,
}

impl Binding {
    pub fn name(self) -> &'static str {
        match self {
            Binding::PyQt4 => "PyQt4",
            Binding::PyQt5 => "PyQt5",
        }
    }

    /// The fully qualified name of the sip module the binding uses.
    pub fn sip_module(self) -> &'static str {
        match self {
            Binding::PyQt4 => "sip",
            Binding::PyQt5 => "PyQt5.sip",
        }
    }

    /// The module table for the binding.
    pub fn table(self) -> Result<&'static ToolkitTable, DeployError> {
        let table = match self {
            Binding::PyQt4 => &*PYQT4,
            Binding::PyQt5 => &*PYQT5,
        };

        table
            .as_ref()
            .map_err(|e| DeployError::config_in(e.clone(), format!("{} metadata", self)))
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Binding {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PyQt4" => Ok(Binding::PyQt4),
            "PyQt5" => Ok(Binding::PyQt5),
            other => Err(DeployError::config(format!(
                "'{}' is not a supported toolkit binding (expected PyQt4 or PyQt5)",
                other
            ))),
        }
    }
}

/// The qmake values a module needs for one Qt major version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QtRequirements {
    pub qt: Vec<String>,
    pub config: Vec<String>,
}

/// A toolkit binding module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolkitModule {
    pub name: String,
    pub deps: Vec<String>,
    /// Whether the module needs QtGui.
    pub gui: bool,
    pub qt4: QtRequirements,
    pub qt5: QtRequirements,
    /// The static library has an `_s` suffix.
    pub needs_suffix: bool,
    /// False for pure Python packages.
    pub is_library: bool,
    /// Where the module is available.
    pub targets: TargetExpression,
}

impl ToolkitModule {
    /// The name of the static library to link against.
    pub fn lib_name(&self) -> String {
        if self.needs_suffix {
            format!("{}_s", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// A toolkit table entry as written in the source.
#[derive(Debug, Clone)]
pub struct ToolkitDef {
    name: &'static str,
    deps: &'static [&'static str],
    gui: bool,
    qt4: (&'static [&'static str], &'static [&'static str]),
    qt5: (&'static [&'static str], &'static [&'static str]),
    needs_suffix: bool,
    is_library: bool,
    targets: &'static str,
}

impl ToolkitDef {
    pub fn new(name: &'static str) -> Self {
        ToolkitDef {
            name,
            deps: &[],
            gui: true,
            qt4: (&[], &[]),
            qt5: (&[], &[]),
            needs_suffix: false,
            is_library: true,
            targets: "",
        }
    }

    pub fn deps(mut self, deps: &'static [&'static str]) -> Self {
        self.deps = deps;
        self
    }

    pub fn no_gui(mut self) -> Self {
        self.gui = false;
        self
    }

    /// `QT` values for both Qt versions.
    pub fn qt(mut self, qt: &'static [&'static str]) -> Self {
        self.qt4.0 = qt;
        self.qt5.0 = qt;
        self
    }

    /// `CONFIG` values for both Qt versions.
    pub fn config(mut self, config: &'static [&'static str]) -> Self {
        self.qt4.1 = config;
        self.qt5.1 = config;
        self
    }

    pub fn qt4(mut self, qt: &'static [&'static str], config: &'static [&'static str]) -> Self {
        self.qt4 = (qt, config);
        self
    }

    pub fn qt5(mut self, qt: &'static [&'static str], config: &'static [&'static str]) -> Self {
        self.qt5 = (qt, config);
        self
    }

    pub fn suffixed(mut self) -> Self {
        self.needs_suffix = true;
        self
    }

    pub fn package(mut self) -> Self {
        self.is_library = false;
        self
    }

    pub fn targets(mut self, targets: &'static str) -> Self {
        self.targets = targets;
        self
    }

    fn normalise(&self) -> Result<ToolkitModule, DeployError> {
        let strings = |values: &[&str]| values.iter().map(|v| v.to_string()).collect();

        Ok(ToolkitModule {
            name: self.name.to_string(),
            deps: strings(self.deps),
            gui: self.gui,
            qt4: QtRequirements {
                qt: strings(self.qt4.0),
                config: strings(self.qt4.1),
            },
            qt5: QtRequirements {
                qt: strings(self.qt5.0),
                config: strings(self.qt5.1),
            },
            needs_suffix: self.needs_suffix,
            is_library: self.is_library,
            targets: TargetExpression::parse(self.targets)
                .map_err(|e| DeployError::config_in(e.to_string(), format!("module `{}`", self.name)))?,
        })
    }
}

/// An immutable toolkit module table.
#[derive(Debug, Clone, Default)]
pub struct ToolkitTable {
    modules: BTreeMap<String, ToolkitModule>,
}

impl ToolkitTable {
    /// Build a table. Duplicate names and dependencies on unknown modules
    /// are errors.
    pub fn new(defs: impl IntoIterator<Item = ToolkitDef>) -> Result<Self, DeployError> {
        let mut modules = BTreeMap::new();

        for def in defs {
            let module = def.normalise()?;
            if modules.contains_key(&module.name) {
                return Err(DeployError::config(format!(
                    "toolkit module `{}` is defined more than once",
                    module.name
                )));
            }
            modules.insert(module.name.clone(), module);
        }

        for module in modules.values() {
            if let Some(dep) = module.deps.iter().find(|d| !modules.contains_key(*d)) {
                return Err(DeployError::config(format!(
                    "toolkit module `{}` depends on unknown module `{}`",
                    module.name, dep
                )));
            }
        }

        Ok(ToolkitTable { modules })
    }

    pub fn get(&self, name: &str) -> Option<&ToolkitModule> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ToolkitModule> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

type Def = ToolkitDef;

static PYQT4: LazyLock<Result<ToolkitTable, String>> =
    LazyLock::new(|| ToolkitTable::new(pyqt4_defs()).map_err(|e| e.to_string()));

static PYQT5: LazyLock<Result<ToolkitTable, String>> =
    LazyLock::new(|| ToolkitTable::new(pyqt5_defs()).map_err(|e| e.to_string()));

/// The PyQt4 modules.
///
/// Qt4's qmake assumes `-lQtCore` and friends refer to Qt itself, so the
/// PyQt4 static libraries carry a suffix. Add-ons do not.
pub fn pyqt4_defs() -> Vec<ToolkitDef> {
    vec![
        Def::new("QAxContainer")
            .suffixed()
            .deps(&["QtGui"])
            .qt4(&[], &["qaxcontainer"])
            .qt5(&["axcontainer", "widgets"], &[])
            .targets("win"),
        Def::new("Qt").suffixed().no_gui(),
        Def::new("QtCore").suffixed().no_gui(),
        Def::new("QtDBus")
            .suffixed()
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["dbus"])
            .targets("linux"),
        Def::new("QtDeclarative")
            .suffixed()
            .deps(&["QtGui", "QtNetwork"])
            .qt4(&["declarative", "network"], &[])
            .qt5(&["declarative", "network", "widgets"], &[]),
        Def::new("QtDesigner")
            .suffixed()
            .deps(&["QtGui"])
            .qt4(&[], &["designer"])
            .qt5(&["designer", "widgets"], &[]),
        Def::new("QtGui")
            .suffixed()
            .deps(&["QtCore"])
            .qt5(&["widgets"], &[]),
        Def::new("QtHelp")
            .suffixed()
            .deps(&["QtGui"])
            .qt4(&[], &["help"])
            .qt5(&["help", "widgets"], &[]),
        Def::new("QtMultimedia")
            .suffixed()
            .deps(&["QtGui"])
            .qt(&["multimedia"]),
        Def::new("QtNetwork")
            .suffixed()
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["network"]),
        Def::new("QtOpenGL")
            .suffixed()
            .deps(&["QtGui"])
            .qt4(&["opengl"], &[])
            .qt5(&["opengl", "widgets"], &[]),
        Def::new("QtScript")
            .suffixed()
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["script"]),
        Def::new("QtScriptTools")
            .suffixed()
            .deps(&["QtGui", "QtScript"])
            .qt4(&["script", "scripttools"], &[])
            .qt5(&["script", "scripttools", "widgets"], &[]),
        Def::new("QtSql")
            .suffixed()
            .deps(&["QtGui"])
            .qt4(&["sql"], &[])
            .qt5(&["sql", "widgets"], &[]),
        Def::new("QtSvg")
            .suffixed()
            .deps(&["QtGui"])
            .qt4(&["svg"], &[])
            .qt5(&["svg", "widgets"], &[]),
        Def::new("QtTest")
            .suffixed()
            .deps(&["QtGui"])
            .qt4(&["testlib"], &[])
            .qt5(&["testlib", "widgets"], &[]),
        Def::new("QtWebKit")
            .suffixed()
            .deps(&["QtGui", "QtNetwork"])
            .qt4(&["network", "webkit"], &[])
            .qt5(&["network", "webkit", "webkitwidgets"], &[]),
        Def::new("QtXml")
            .suffixed()
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["xml"]),
        Def::new("QtXmlPatterns")
            .suffixed()
            .no_gui()
            .deps(&["QtNetwork"])
            .qt(&["network", "xmlpatterns"]),
        Def::new("phonon")
            .suffixed()
            .deps(&["QtGui"])
            .qt4(&["phonon"], &[])
            .qt5(&["phonon4qt5", "widgets"], &[]),
        Def::new("uic").package().deps(&["QtGui"]),
        Def::new("QtChart")
            .deps(&["QtGui"])
            .config(&["qtcommercialchart"]),
        Def::new("Qsci").deps(&["QtGui"]).config(&["qscintilla2"]),
    ]
}

/// The PyQt5 modules.
pub fn pyqt5_defs() -> Vec<ToolkitDef> {
    vec![
        Def::new("QAxContainer")
            .deps(&["QtWidgets"])
            .qt(&["axcontainer"])
            .targets("win"),
        Def::new("QtAndroidExtras")
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["androidextras"])
            .targets("android"),
        Def::new("QtBluetooth")
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["bluetooth"]),
        Def::new("QtChart")
            .deps(&["QtWidgets"])
            .qt(&["charts"]),
        Def::new("QtCore").no_gui(),
        Def::new("QtDBus")
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["dbus"])
            .targets("linux"),
        Def::new("QtDesigner")
            .deps(&["QtWidgets"])
            .qt(&["designer"]),
        Def::new("QtGui").deps(&["QtCore"]),
        Def::new("QtHelp").deps(&["QtWidgets"]).qt(&["help"]),
        Def::new("QtLocation")
            .deps(&["QtPositioning"])
            .qt(&["location"]),
        Def::new("QtMacExtras")
            .deps(&["QtGui"])
            .qt(&["macextras"])
            .targets("macos"),
        Def::new("QtMultimedia")
            .deps(&["QtGui", "QtNetwork"])
            .qt(&["multimedia"]),
        Def::new("QtMultimediaWidgets")
            .deps(&["QtMultimedia", "QtWidgets"])
            .qt(&["multimediawidgets"]),
        Def::new("QtNetwork")
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["network"]),
        Def::new("QtNfc").no_gui().deps(&["QtCore"]).qt(&["nfc"]),
        Def::new("QtOpenGL")
            .deps(&["QtWidgets"])
            .qt(&["opengl"]),
        Def::new("QtPositioning")
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["positioning"]),
        Def::new("QtPrintSupport")
            .deps(&["QtWidgets"])
            .qt(&["printsupport"]),
        Def::new("QtQml")
            .no_gui()
            .deps(&["QtNetwork"])
            .qt(&["qml"]),
        Def::new("QtQuick")
            .deps(&["QtGui", "QtQml"])
            .qt(&["quick"]),
        Def::new("QtQuickWidgets")
            .deps(&["QtQuick", "QtWidgets"])
            .qt(&["quickwidgets"]),
        Def::new("QtSensors")
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["sensors"]),
        Def::new("QtSerialPort")
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["serialport"]),
        Def::new("QtSql").deps(&["QtWidgets"]).qt(&["sql"]),
        Def::new("QtSvg").deps(&["QtWidgets"]).qt(&["svg"]),
        Def::new("QtTest").deps(&["QtWidgets"]).qt(&["testlib"]),
        Def::new("QtWebChannel")
            .no_gui()
            .deps(&["QtCore"])
            .qt(&["webchannel"]),
        Def::new("QtWebKit")
            .deps(&["QtGui", "QtNetwork"])
            .qt(&["webkit"]),
        Def::new("QtWebKitWidgets")
            .deps(&["QtPrintSupport", "QtWebKit", "QtWidgets"])
            .qt(&["webkitwidgets"]),
        Def::new("QtWebSockets")
            .no_gui()
            .deps(&["QtNetwork"])
            .qt(&["websockets"]),
        Def::new("QtWidgets").deps(&["QtGui"]).qt(&["widgets"]),
        Def::new("QtWinExtras")
            .deps(&["QtWidgets"])
            .qt(&["winextras"])
            .targets("win"),
        Def::new("QtX11Extras")
            .deps(&["QtWidgets"])
            .qt(&["x11extras"])
            .targets("linux"),
        Def::new("QtXml").no_gui().deps(&["QtCore"]).qt(&["xml"]),
        Def::new("QtXmlPatterns")
            .no_gui()
            .deps(&["QtNetwork"])
            .qt(&["xmlpatterns"]),
        Def::new("uic").package().deps(&["QtWidgets"]),
        Def::new("Qsci")
            .deps(&["QtPrintSupport", "QtWidgets"])
            .config(&["qscintilla2"]),
    ]
}
