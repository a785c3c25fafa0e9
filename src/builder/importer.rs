//! The importer that loads frozen modules from the Qt resources.
//!
//! `pydeploy_importer.cpp` builds a builtin module that reads a file from the
//! resource system. Once the interpreter is up, the bootstrap code puts a
//! finder on `sys.meta_path` that looks up `:/stdlib` then `:/app` through it.

use std::fmt::Write;

use crate::builder::inittab::init_function;
use crate::core::version::PythonVersion;

pub const IMPORTER_SOURCE: &str = "pydeploy_importer.cpp";

/// The name of the builtin module defined in [`IMPORTER_SOURCE`].
pub const IMPORTER_MODULE: &str = "pydeploy_qrc";

/// Resource directories searched for `.pyo` files, in order.
pub const RESOURCE_ROOTS: &[&str] = &[":/stdlib", ":/app"];

const BOOTSTRAP: &str = "\
import marshal, sys
import pydeploy_qrc

class QrcImporter(object):
    def __init__(self, roots):
        self.roots = roots
        self.found = {}

    def find_module(self, fullname, path=None):
        relative = fullname.replace('.', '/')
        for root in self.roots:
            for suffix, package in (('/__init__.pyo', True), ('.pyo', False)):
                filename = root + '/' + relative + suffix
                data = pydeploy_qrc.read(filename)
                if data is not None:
                    self.found[fullname] = (filename, package, data)
                    return self
        return None

    def load_module(self, fullname):
        if fullname in sys.modules:
            return sys.modules[fullname]
        if fullname not in self.found and self.find_module(fullname) is None:
            raise ImportError(fullname)
        filename, package, data = self.found.pop(fullname)
        module = type(sys)(fullname)
        module.__file__ = filename
        module.__loader__ = self
        if package:
            module.__path__ = [filename.rsplit('/', 1)[0]]
            module.__package__ = fullname
        else:
            module.__package__ = fullname.rpartition('.')[0]
        sys.modules[fullname] = module
        try:
            exec(marshal.loads(data), module.__dict__)
        except:
            del sys.modules[fullname]
            raise
        return module

sys.meta_path.append(QrcImporter(ROOTS))
";

/// The Python run after `Py_Initialize()` to install the finder.
pub fn bootstrap_code() -> String {
    let roots: Vec<String> = RESOURCE_ROOTS.iter().map(|r| format!("'{}'", r)).collect();
    BOOTSTRAP.replace("ROOTS", &format!("({},)", roots.join(", ")))
}

/// [`bootstrap_code`] as a C string literal, one source line per literal.
pub fn bootstrap_c_literal(indent: &str) -> String {
    let mut c = String::new();
    for line in bootstrap_code().lines() {
        let escaped = line.replace('\\', "\\\\").replace('"', "\\\"");
        let _ = writeln!(c, "{}\"{}\\n\"", indent, escaped);
    }
    c.truncate(c.trim_end().len());
    c
}

/// Write `pydeploy_importer.cpp`.
pub fn importer_source(version: PythonVersion) -> String {
    let mut c = String::from(
        "/* Generated by pydeploy. */\n\
         \n\
         #include <Python.h>\n\
         \n\
         #include <QByteArray>\n\
         #include <QFile>\n\
         #include <QString>\n\
         \n\
         static PyObject *pydeploy_qrc_read(PyObject *self, PyObject *args)\n\
         {\n    \
         const char *name;\n\
         \n    \
         (void)self;\n\
         \n    \
         if (!PyArg_ParseTuple(args, \"s\", &name))\n        \
         return NULL;\n\
         \n    \
         QFile file(QString::fromUtf8(name));\n\
         \n    \
         if (!file.open(QIODevice::ReadOnly))\n    \
         {\n        \
         Py_INCREF(Py_None);\n        \
         return Py_None;\n    \
         }\n\
         \n    \
         QByteArray data = file.readAll();\n\
         \n    \
         return PyBytes_FromStringAndSize(data.constData(), data.size());\n\
         }\n\
         \n\
         static PyMethodDef pydeploy_qrc_methods[] = {\n    \
         {\"read\", pydeploy_qrc_read, METH_VARARGS, NULL},\n    \
         {NULL, NULL, 0, NULL}\n\
         };\n\
         \n",
    );

    let init = init_function(IMPORTER_MODULE, version);
    if version.is_python3() {
        let _ = write!(
            c,
            "static struct PyModuleDef pydeploy_qrc_module = {{\n    \
             PyModuleDef_HEAD_INIT,\n    \
             \"{module}\",\n    \
             NULL,\n    \
             -1,\n    \
             pydeploy_qrc_methods,\n    \
             NULL,\n    \
             NULL,\n    \
             NULL,\n    \
             NULL\n\
             }};\n\
             \n\
             extern \"C\" PyObject *{init}(void)\n\
             {{\n    \
             return PyModule_Create(&pydeploy_qrc_module);\n\
             }}\n",
            module = IMPORTER_MODULE,
        );
    } else {
        let _ = write!(
            c,
            "extern \"C\" void {init}(void)\n\
             {{\n    \
             Py_InitModule(\"{module}\", pydeploy_qrc_methods);\n\
             }}\n",
            module = IMPORTER_MODULE,
        );
    }

    c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_searches_resource_roots() {
        let code = bootstrap_code();
        assert!(code.contains("import pydeploy_qrc\n"));
        assert!(code.contains("sys.meta_path.append(QrcImporter((':/stdlib', ':/app',)))"));
        assert!(code.contains("('/__init__.pyo', True), ('.pyo', False)"));
        assert!(!code.contains("ROOTS"));
    }

    #[test]
    fn test_bootstrap_c_literal() {
        let literal = bootstrap_c_literal("    ");
        assert!(literal.starts_with("    \"import marshal, sys\\n\"\n"));
        assert!(literal.ends_with("\"sys.meta_path.append(QrcImporter((':/stdlib', ':/app',)))\\n\""));
        assert_eq!(literal.lines().count(), bootstrap_code().lines().count());
    }

    #[test]
    fn test_importer_python3() {
        let c = importer_source(PythonVersion::new(3, 6));
        assert!(c.contains("#include <QFile>\n"));
        assert!(c.contains("QFile file(QString::fromUtf8(name));"));
        assert!(c.contains("extern \"C\" PyObject *PyInit_pydeploy_qrc(void)"));
        assert!(c.contains("PyModule_Create(&pydeploy_qrc_module)"));
        assert!(!c.contains("Py_InitModule"));
    }

    #[test]
    fn test_importer_python2() {
        let c = importer_source(PythonVersion::new(2, 7));
        assert!(c.contains("extern \"C\" void initpydeploy_qrc(void)"));
        assert!(c.contains("Py_InitModule(\"pydeploy_qrc\", pydeploy_qrc_methods);"));
        assert!(!c.contains("PyModuleDef"));
    }
}
