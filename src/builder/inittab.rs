//! The generated C sources that start the interpreter.

use std::fmt::Write;

use crate::builder::importer::{bootstrap_c_literal, IMPORTER_MODULE};
use crate::core::version::PythonVersion;

pub const INITTAB_SOURCE: &str = "pydeploy_inittab.c";
pub const MAIN_SOURCE: &str = "pydeploy_main.c";

/// The name of the init function of an extension module.
pub fn init_function(name: &str, version: PythonVersion) -> String {
    let leaf = name.rsplit('.').next().unwrap_or(name);
    if version.is_python3() {
        format!("PyInit_{}", leaf)
    } else {
        format!("init{}", leaf)
    }
}

/// Write `pydeploy_inittab.c`.
///
/// `modules` are the fully qualified names of the extension modules linked
/// into the executable.
pub fn inittab_source<'a>(
    modules: impl IntoIterator<Item = &'a str>,
    version: PythonVersion,
) -> String {
    let modules: Vec<&str> = modules.into_iter().collect();
    let mut c = String::from("/* Generated by pydeploy. */\n\n#include <Python.h>\n\n");

    let init_type = if version.is_python3() { "PyObject *" } else { "void " };
    for name in &modules {
        let _ = writeln!(c, "extern {}{}(void);", init_type, init_function(name, version));
    }
    if !modules.is_empty() {
        c.push('\n');
    }

    c.push_str("struct _inittab pydeploy_inittab[] = {\n");
    for name in &modules {
        let _ = writeln!(c, "    {{\"{}\", {}}},", name, init_function(name, version));
    }
    c.push_str("    {NULL, NULL}\n};\n");

    c
}

/// Write `pydeploy_main.c`.
///
/// The interpreter's own frozen modules are kept and `__main__` is added to
/// them. The resource importer is installed, then `sys_path` is prepended to
/// `sys.path` before `__main__` is run.
pub fn main_source(version: PythonVersion, sys_path: &[String]) -> String {
    let importer_init = init_function(IMPORTER_MODULE, version);
    let init_type = if version.is_python3() { "PyObject *" } else { "void " };

    let mut c = String::from(
        "/* Generated by pydeploy. */\n\
         \n\
         #include <stdlib.h>\n\
         #include <string.h>\n\
         \n\
         #include <Python.h>\n\
         \n\
         #include \"frozen_main.h\"\n\
         \n\
         extern struct _inittab pydeploy_inittab[];\n",
    );
    let _ = writeln!(c, "extern {}{}(void);", init_type, importer_init);

    c.push_str(
        "\n\
         static const char importer_bootstrap[] =\n",
    );
    c.push_str(&bootstrap_c_literal("    "));
    c.push_str(
        ";\n\
         \n\
         /* Copy the interpreter's frozen modules and add __main__. */\n\
         static int extend_frozen_modules(void)\n\
         {\n    \
         static const struct _frozen main_module = {\"__main__\", frozen_main, sizeof (frozen_main)};\n    \
         const struct _frozen *p;\n    \
         struct _frozen *table;\n    \
         size_t n = 0;\n\
         \n    \
         for (p = PyImport_FrozenModules; p != NULL && p->name != NULL; ++p)\n        \
         ++n;\n\
         \n    \
         table = malloc(sizeof (struct _frozen) * (n + 2));\n    \
         if (table == NULL)\n        \
         return -1;\n\
         \n    \
         if (n > 0)\n        \
         memcpy(table, PyImport_FrozenModules, sizeof (struct _frozen) * n);\n\
         \n    \
         memcpy(&table[n], &main_module, sizeof (struct _frozen));\n    \
         memset(&table[n + 1], 0, sizeof (struct _frozen));\n\
         \n    \
         PyImport_FrozenModules = table;\n\
         \n    \
         return 0;\n\
         }\n\
         \n",
    );

    if version.is_python3() {
        let decode = if version.minor >= 5 { "Py_DecodeLocale" } else { "_Py_char2wchar" };
        let _ = write!(
            c,
            "int main(int argc, char **argv)\n\
             {{\n    \
             wchar_t **w_argv;\n    \
             int i, rc;\n\
             \n    \
             w_argv = PyMem_RawMalloc(sizeof (wchar_t *) * (argc + 1));\n    \
             if (w_argv == NULL)\n        \
             return 1;\n\
             \n    \
             for (i = 0; i < argc; ++i)\n    \
             {{\n        \
             w_argv[i] = {decode}(argv[i], NULL);\n        \
             if (w_argv[i] == NULL)\n            \
             return 1;\n    \
             }}\n\
             \n    \
             w_argv[argc] = NULL;\n\
             \n    \
             Py_SetProgramName(w_argv[0]);\n",
        );
    } else {
        c.push_str(
            "int main(int argc, char **argv)\n\
             {\n    \
             int rc;\n\
             \n    \
             Py_SetProgramName(argv[0]);\n",
        );
    }

    c.push_str(
        "    Py_FrozenFlag = 1;\n    \
         Py_NoSiteFlag = 1;\n\
         \n    \
         if (PyImport_ExtendInittab(pydeploy_inittab) < 0)\n        \
         return 1;\n\
         \n",
    );
    let _ = writeln!(
        c,
        "    if (PyImport_AppendInittab(\"{}\", {}) < 0)\n        return 1;\n",
        IMPORTER_MODULE, importer_init
    );
    c.push_str(
        "    if (extend_frozen_modules() < 0)\n        \
         return 1;\n\
         \n    \
         Py_Initialize();\n",
    );

    let argv = if version.is_python3() { "w_argv" } else { "argv" };
    let _ = writeln!(c, "    PySys_SetArgvEx(argc, {}, 0);", argv);

    c.push_str(
        "\n    \
         if (PyRun_SimpleString(importer_bootstrap) < 0)\n    \
         {\n        \
         Py_Finalize();\n        \
         return 1;\n    \
         }\n",
    );

    if !sys_path.is_empty() {
        let entries: Vec<String> = sys_path.iter().map(|p| format!("'{}'", c_escape(p))).collect();
        let _ = writeln!(
            c,
            "\n    PyRun_SimpleString(\"import sys; sys.path[0:0] = [{}]\");",
            entries.join(", ")
        );
    }

    c.push_str(
        "\n    rc = PyImport_ImportFrozenModule(\"__main__\");\n    \
         if (rc < 0)\n        \
         PyErr_Print();\n\
         \n    \
         Py_Finalize();\n\
         \n    \
         return rc < 0 ? 1 : 0;\n\
         }\n",
    );

    c
}

/// Escape a value for use inside a Python string inside a C string.
fn c_escape(s: &str) -> String {
    s.replace('\\', "\\\\\\\\")
        .replace('\'', "\\\\'")
        .replace('"', "\\\"")
}
