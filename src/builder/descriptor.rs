//! The qmake `.pro` file accumulator.
//!
//! Everything added is kept in sorted sets, so the text written depends
//! only on what was added and never on the order it was added in.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::path::Path;

use crate::builder::sources::SourceBucket;
use crate::metadata::toolkit::{QtRequirements, ToolkitModule};
use crate::util::fs::to_slash;

/// `QT` and `CONFIG` values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QtValues {
    pub qt: BTreeSet<String>,
    pub config: BTreeSet<String>,
}

impl QtValues {
    fn add(&mut self, requirements: &QtRequirements) {
        self.qt.extend(requirements.qt.iter().cloned());
        self.config.extend(requirements.config.iter().cloned());
    }

    fn without(&self, other: &QtValues) -> QtValues {
        QtValues {
            qt: self.qt.difference(&other.qt).cloned().collect(),
            config: self.config.difference(&other.config).cloned().collect(),
        }
    }

    fn common(&self, other: &QtValues) -> QtValues {
        QtValues {
            qt: self.qt.intersection(&other.qt).cloned().collect(),
            config: self.config.intersection(&other.config).cloned().collect(),
        }
    }

    fn is_empty(&self) -> bool {
        self.qt.is_empty() && self.config.is_empty()
    }
}

/// The contents of a `.pro` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildDescriptor {
    pub qt4: QtValues,
    pub qt5: QtValues,
    pub gui: bool,
    pub console: bool,
    pub resources: BTreeSet<String>,
    pub defines: BTreeSet<String>,
    pub include_paths: BTreeSet<String>,
    pub sources: BTreeMap<SourceBucket, BTreeSet<String>>,
    /// `-L` directories, written before any library.
    pub lib_dirs: BTreeSet<String>,
    /// Link flags, already quoted where needed. Each value is the flags of
    /// one library in their original order.
    pub libs: BTreeSet<String>,
    /// Fully qualified names of the extension modules linked in.
    pub inittab: BTreeSet<String>,
    /// DLLs copied next to the executable on Windows.
    pub post_link_dlls: BTreeSet<String>,
}

impl BuildDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_toolkit_module(&mut self, module: &ToolkitModule) {
        self.qt4.add(&module.qt4);
        self.qt5.add(&module.qt5);
        self.gui |= module.gui;
    }

    pub fn add_source(&mut self, path: &Path) {
        self.sources
            .entry(SourceBucket::classify(path))
            .or_default()
            .insert(to_slash(path));
    }

    pub fn add_define(&mut self, define: impl Into<String>) {
        self.defines.insert(define.into());
    }

    pub fn add_include_path(&mut self, path: &Path) {
        self.include_paths.insert(to_slash(path));
    }

    pub fn add_resource(&mut self, qrc: impl Into<String>) {
        self.resources.insert(qrc.into());
    }

    pub fn add_lib(&mut self, lib: impl Into<String>) {
        self.libs.insert(lib.into());
    }

    /// Add a `-L` directory.
    pub fn add_lib_dir(&mut self, dir: &Path) {
        self.lib_dirs.insert(format!("-L{}", quote(&to_slash(dir))));
    }

    /// Add the flags of a library.
    ///
    /// The `-L` directories are moved to the front. The rest stays one value
    /// so that dependent static libraries (`-lssl -lcrypto`) keep their
    /// order.
    pub fn add_lib_flags(&mut self, flags: &str) {
        let mut libs = Vec::new();
        for word in flags.split_whitespace() {
            if word.starts_with("-L") {
                self.lib_dirs.insert(word.to_string());
            } else {
                libs.push(word);
            }
        }

        if !libs.is_empty() {
            self.add_lib(libs.join(" "));
        }
    }

    pub fn add_inittab(&mut self, name: impl Into<String>) {
        self.inittab.insert(name.into());
    }

    pub fn add_post_link_dll(&mut self, dll: &Path) {
        self.post_link_dlls.insert(to_slash(dll));
    }

    /// The `QT` and `CONFIG` values needed for both Qt4 and Qt5.
    pub fn neutral(&self) -> QtValues {
        self.qt4.common(&self.qt5)
    }

    /// Write the `.pro` file.
    pub fn to_pro(&self) -> String {
        let mut pro = String::from("TEMPLATE = app\n\n");

        let neutral = self.neutral();

        let mut config: BTreeSet<&str> = ["release", "warn_on"].into_iter().collect();
        if self.console || !self.gui {
            config.insert("console");
        }
        config.extend(neutral.config.iter().map(String::as_str));
        line(&mut pro, "CONFIG +=", config);

        if !self.gui {
            pro.push_str("QT -= gui\n");
        }
        if !neutral.qt.is_empty() {
            line(&mut pro, "QT +=", &neutral.qt);
        }

        guarded(&mut pro, "lessThan(QT_MAJOR_VERSION, 5)", &self.qt4.without(&neutral));
        guarded(&mut pro, "greaterThan(QT_MAJOR_VERSION, 4)", &self.qt5.without(&neutral));

        if !self.resources.is_empty() {
            pro.push_str("\nRESOURCES =");
            for resource in &self.resources {
                let _ = write!(pro, " \\\n    {}", quote(resource));
            }
            pro.push('\n');
        }

        section(&mut pro, "DEFINES", &self.defines);
        section(&mut pro, "INCLUDEPATH", &self.include_paths);

        if !self.sources.is_empty() {
            pro.push('\n');
            for (bucket, files) in &self.sources {
                line(&mut pro, &format!("{} +=", bucket), files.iter().map(|f| quote(f)));
            }
        }

        if !self.lib_dirs.is_empty() || !self.libs.is_empty() {
            pro.push('\n');
            line(&mut pro, "LIBS +=", self.lib_dirs.iter().chain(&self.libs));
        }

        if !self.post_link_dlls.is_empty() {
            pro.push_str("\nwin32 {\n");
            for dll in &self.post_link_dlls {
                let _ = writeln!(
                    pro,
                    "    QMAKE_POST_LINK += $(COPY_FILE) $$shell_path({}) $$shell_path($$OUT_PWD) $$escape_expand(\\\\n\\\\t)",
                    quote(dll)
                );
            }
            pro.push_str("}\n");
        }

        pro
    }
}

/// Quote a value for qmake if it contains spaces.
pub fn quote(value: &str) -> String {
    if value.contains(' ') {
        format!("$$quote({})", value)
    } else {
        value.to_string()
    }
}

fn line<I>(pro: &mut String, prefix: &str, values: I)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    pro.push_str(prefix);
    for value in values {
        pro.push(' ');
        pro.push_str(value.as_ref());
    }
    pro.push('\n');
}

fn section(pro: &mut String, name: &str, values: &BTreeSet<String>) {
    if !values.is_empty() {
        pro.push('\n');
        line(pro, &format!("{} +=", name), values.iter().map(|v| quote(v)));
    }
}

fn guarded(pro: &mut String, condition: &str, values: &QtValues) {
    if values.is_empty() {
        return;
    }

    let _ = writeln!(pro, "\n{} {{", condition);
    if !values.config.is_empty() {
        line(pro, "    CONFIG +=", &values.config);
    }
    if !values.qt.is_empty() {
        line(pro, "    QT +=", &values.qt);
    }
    pro.push_str("}\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scope::TargetExpression;

    fn module(name: &str, qt4: &[&str], qt5: &[&str]) -> ToolkitModule {
        let requirements = |qt: &[&str]| QtRequirements {
            qt: qt.iter().map(|s| s.to_string()).collect(),
            config: Vec::new(),
        };

        ToolkitModule {
            name: name.to_string(),
            deps: Vec::new(),
            gui: true,
            qt4: requirements(qt4),
            qt5: requirements(qt5),
            needs_suffix: false,
            is_library: true,
            targets: TargetExpression::everywhere(),
        }
    }

    #[test]
    fn test_minimal() {
        let pro = BuildDescriptor::new().to_pro();
        assert_eq!(pro, "TEMPLATE = app\n\nCONFIG += console release warn_on\nQT -= gui\n");
    }

    #[test]
    fn test_shared_and_version_specific_flags() {
        let mut descriptor = BuildDescriptor::new();
        descriptor.add_toolkit_module(&module("QtWebKit", &["network", "webkit"], &["network", "webkitwidgets"]));
        descriptor.add_toolkit_module(&module("QtSvg", &["network", "svg"], &["network", "svg", "widgets"]));

        let pro = descriptor.to_pro();
        assert_eq!(
            pro,
            "TEMPLATE = app\n\
             \n\
             CONFIG += release warn_on\n\
             QT += network svg\n\
             \n\
             lessThan(QT_MAJOR_VERSION, 5) {\n    \
             QT += webkit\n\
             }\n\
             \n\
             greaterThan(QT_MAJOR_VERSION, 4) {\n    \
             QT += webkitwidgets widgets\n\
             }\n"
        );
        assert_eq!(pro.matches("network").count(), 1);
    }

    #[test]
    fn test_console_application_with_gui() {
        let mut descriptor = BuildDescriptor::new();
        descriptor.add_toolkit_module(&module("QtGui", &["gui"], &["gui"]));
        descriptor.console = true;

        let pro = descriptor.to_pro();
        assert!(pro.contains("CONFIG += console release warn_on\n"));
        assert!(!pro.contains("QT -= gui"));
    }

    #[test]
    fn test_sections_are_sorted_and_ordered() {
        let mut descriptor = BuildDescriptor::new();
        descriptor.add_source(Path::new("b.c"));
        descriptor.add_source(Path::new("a.c"));
        descriptor.add_source(Path::new("frozen_main.h"));
        descriptor.add_source(Path::new("grammar.y"));
        descriptor.add_define("HAVE_ZLIB");
        descriptor.add_define("A_FIRST");
        descriptor.add_include_path(Path::new("/py/include"));
        descriptor.add_lib_flags("-framework Security -lz");
        descriptor.add_lib_dir(Path::new("/py/lib"));
        descriptor.add_resource("resources/pydeploy1.qrc");
        descriptor.add_resource("resources/pydeploy0.qrc");

        let pro = descriptor.to_pro();
        let expected_tail = "\n\
             RESOURCES = \\\n    resources/pydeploy0.qrc \\\n    resources/pydeploy1.qrc\n\
             \n\
             DEFINES += A_FIRST HAVE_ZLIB\n\
             \n\
             INCLUDEPATH += /py/include\n\
             \n\
             SOURCES += a.c b.c\n\
             HEADERS += frozen_main.h\n\
             YACCSOURCES += grammar.y\n\
             \n\
             LIBS += -L/py/lib -framework Security -lz\n";
        assert!(pro.ends_with(expected_tail), "{}", pro);
    }

    #[test]
    fn test_quoting() {
        let mut descriptor = BuildDescriptor::new();
        descriptor.add_include_path(Path::new("/Program Files/Python/include"));
        descriptor.add_lib_dir(Path::new("/Program Files/Python/libs"));
        descriptor.add_post_link_dll(Path::new("C:/Program Files/Python/python36.dll"));

        let pro = descriptor.to_pro();
        assert!(pro.contains("INCLUDEPATH += $$quote(/Program Files/Python/include)\n"));
        assert!(pro.contains("LIBS += -L$$quote(/Program Files/Python/libs)\n"));
        assert!(pro.contains(
            "win32 {\n    QMAKE_POST_LINK += $(COPY_FILE) $$shell_path($$quote(C:/Program Files/Python/python36.dll))"
        ));
    }

    #[test]
    fn test_library_flags_keep_their_order() {
        let mut descriptor = BuildDescriptor::new();
        descriptor.add_lib_flags("-lssl -lcrypto");
        descriptor.add_lib_flags("-L/opt/curses/lib -lpanel -lcurses");
        descriptor.add_lib_flags("-lssl -lcrypto");

        let pro = descriptor.to_pro();
        assert!(
            pro.ends_with("LIBS += -L/opt/curses/lib -lpanel -lcurses -lssl -lcrypto\n"),
            "{}",
            pro
        );
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let mut one = BuildDescriptor::new();
        one.add_lib("-lz");
        one.add_lib("-lm");
        one.add_define("B");
        one.add_define("A");

        let mut two = BuildDescriptor::new();
        two.add_define("A");
        two.add_lib("-lm");
        two.add_define("B");
        two.add_lib("-lz");

        assert_eq!(one.to_pro(), two.to_pro());
    }
}
