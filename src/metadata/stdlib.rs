//! The standard library module table.
//!
//! A module whose definition changes between Python versions has one entry
//! per version range.

use std::sync::LazyLock;

use crate::metadata::module::{ModuleDef, ModuleKind, ModuleTable};
use crate::util::errors::DeployError;

fn py(name: &'static str) -> ModuleDef {
    ModuleDef::new(name, ModuleKind::PythonSource)
}

fn core_py(name: &'static str) -> ModuleDef {
    ModuleDef::new(name, ModuleKind::CorePythonSource)
}

fn ext(name: &'static str) -> ModuleDef {
    ModuleDef::new(name, ModuleKind::NativeExtension)
}

fn core_ext(name: &'static str) -> ModuleDef {
    ModuleDef::new(name, ModuleKind::CoreNativeExtension)
}

static STDLIB: LazyLock<Result<ModuleTable, String>> =
    LazyLock::new(|| ModuleTable::new(stdlib_defs()).map_err(|e| e.to_string()));

/// The standard library table, built on first use.
pub fn table() -> Result<&'static ModuleTable, DeployError> {
    STDLIB
        .as_ref()
        .map_err(|e| DeployError::config_in(e.clone(), "standard library metadata"))
}

/// The standard library definitions.
pub fn stdlib_defs() -> Vec<ModuleDef> {
    vec![
        py("__future__"),
        core_ext("__builtin__").py2(),
        py("_abcoll").py2().internal().deps(&["abc", "sys"]),
        ext("_bisect").internal().sources(&["_bisectmodule.c"]),
        ext("_bz2")
            .py3()
            .internal()
            .external("bz2")
            .sources(&["_bz2module.c"]),
        core_ext("_codecs").internal(),
        py("_collections_abc")
            .versions((3, 4), (3, 99))
            .internal()
            .deps(&["abc", "sys"]),
        ext("_collections").py2().internal().sources(&["_collectionsmodule.c"]),
        core_ext("_collections").py3().internal(),
        py("_compat_pickle").py3().internal(),
        ext("_crypt")
            .py3()
            .internal()
            .non_windows()
            .external("crypt")
            .sources(&["_cryptmodule.c"]),
        ext("_ctypes")
            .internal()
            .external("ffi")
            .sources(&[
                "_ctypes/_ctypes.c",
                "_ctypes/callbacks.c",
                "_ctypes/callproc.c",
                "_ctypes/cfield.c",
                "_ctypes/stgdict.c",
            ])
            .includes(&["_ctypes"]),
        ext("_curses")
            .internal()
            .non_windows()
            .external("curses")
            .sources(&["_cursesmodule.c"]),
        ext("_curses_panel")
            .internal()
            .non_windows()
            .external("panel")
            .deps(&["_curses"])
            .sources(&["_curses_panel.c"]),
        ext("_datetime")
            .py3()
            .internal()
            .sources(&["_datetimemodule.c"])
            .libs(&["!win#-lm"]),
        ext("_functools").py2().internal().sources(&["_functoolsmodule.c"]),
        core_ext("_functools").py3().internal(),
        ext("_hashlib")
            .internal()
            .with_ssl()
            .external("ssl")
            .sources(&["_hashopenssl.c"]),
        ext("_heapq").internal().sources(&["_heapqmodule.c"]),
        core_ext("_imp").py3().internal(),
        ext("_io")
            .py2()
            .internal()
            .sources(&[
                "_io/_iomodule.c",
                "_io/bufferedio.c",
                "_io/bytesio.c",
                "_io/fileio.c",
                "_io/iobase.c",
                "_io/stringio.c",
                "_io/textio.c",
                "_io/_iomodule.h",
            ])
            .includes(&["_io"]),
        core_ext("_io").py3().internal(),
        ext("_json").internal().sources(&["_json.c"]),
        ext("_locale").py2().internal().sources(&["_localemodule.c"]),
        core_ext("_locale").py3().internal(),
        ext("_lzma")
            .py3()
            .internal()
            .external("lzma")
            .sources(&["_lzmamodule.c"]),
        ext("_md5")
            .py2()
            .internal()
            .without_ssl()
            .sources(&["md5module.c", "md5.c"]),
        ext("_md5")
            .py3()
            .internal()
            .without_ssl()
            .sources(&["md5module.c"]),
        core_ext("_operator").versions((3, 4), (3, 99)).internal(),
        ext("_pickle").py3().internal().sources(&["_pickle.c"]),
        ext("_posixsubprocess")
            .py3()
            .internal()
            .non_windows()
            .sources(&["_posixsubprocess.c"]),
        ext("_random").internal().sources(&["_randommodule.c"]),
        ext("_scproxy")
            .internal()
            .sources(&["_scproxy.c"])
            .libs(&[
                "-framework SystemConfiguration",
                "-framework CoreFoundation",
            ]),
        ext("_sha").py2().internal().without_ssl().sources(&["shamodule.c"]),
        ext("_sha1").py3().internal().without_ssl().sources(&["sha1module.c"]),
        ext("_sha256").internal().without_ssl().sources(&["sha256module.c"]),
        ext("_sha3")
            .versions((3, 6), (3, 99))
            .internal()
            .sources(&["_sha3/sha3module.c"])
            .includes(&["_sha3"]),
        ext("_sha512").internal().without_ssl().sources(&["sha512module.c"]),
        core_ext("_signal").versions((3, 5), (3, 99)).internal(),
        ext("_blake2")
            .versions((3, 6), (3, 99))
            .internal()
            .sources(&[
                "_blake2/blake2module.c",
                "_blake2/blake2b_impl.c",
                "_blake2/blake2s_impl.c",
            ])
            .includes(&["_blake2"]),
        ext("_socket")
            .internal()
            .sources(&["socketmodule.c"])
            .libs(&["win#-lws2_32"]),
        core_ext("_sre").internal(),
        ext("_ssl")
            .internal()
            .with_ssl()
            .external("ssl")
            .deps(&["_socket"])
            .sources(&["_ssl.c"]),
        core_ext("_stat").versions((3, 4), (3, 99)).internal(),
        core_ext("_string").py3().internal(),
        ext("_struct").internal().sources(&["_struct.c"]),
        core_ext("_subprocess").py2().internal().windows_only(),
        core_ext("_symtable").internal(),
        py("_sysconfigdata")
            .versions((2, 0), (3, 5))
            .internal()
            .non_windows(),
        py("_sysconfigdata*")
            .versions((3, 6), (3, 99))
            .internal()
            .non_windows(),
        core_ext("_thread").py3(),
        core_ext("_tracemalloc").versions((3, 4), (3, 99)).internal(),
        core_ext("_warnings").internal(),
        core_ext("_weakref").internal(),
        core_py("_weakrefset").internal().deps(&["_weakref"]),
        core_ext("_winapi").py3().internal().windows_only(),
        core_ext("_winreg").py2().windows_only(),
        core_py("abc").deps(&["_weakrefset"]),
        ext("array"),
        core_py("atexit").py2(),
        core_ext("atexit").py3(),
        py("base64").deps(&["binascii", "re", "struct"]),
        ext("binascii").sources(&["binascii.c"]),
        py("bisect").deps(&["_bisect"]),
        ext("bz2").py2().external("bz2").sources(&["bz2module.c"]),
        py("bz2").py3().deps(&["_bz2", "io", "os"]),
        core_ext("builtins").py3(),
        ext("cPickle").py2().deps(&["copy_reg"]),
        ext("cStringIO").py2(),
        py("calendar").deps(&["datetime"]),
        ext("cmath")
            .sources(&["cmathmodule.c", "_math.c"])
            .libs(&["!win#-lm"]),
        core_py("codecs").deps(&["_codecs"]),
        py("collections")
            .py2()
            .deps(&["_abcoll", "_collections", "heapq", "itertools", "keyword", "operator"]),
        py("collections")
            .versions((3, 0), (3, 3))
            .deps(&["_collections", "heapq", "itertools", "keyword", "operator", "reprlib"])
            .submodules(&["collections.abc"]),
        py("collections")
            .versions((3, 4), (3, 99))
            .deps(&[
                "_collections",
                "_collections_abc",
                "heapq",
                "itertools",
                "keyword",
                "operator",
                "reprlib",
            ])
            .submodules(&["collections.abc"]),
        py("collections.abc")
            .versions((3, 0), (3, 3))
            .deps(&["abc", "sys"]),
        py("collections.abc")
            .versions((3, 4), (3, 99))
            .deps(&["_collections_abc"]),
        py("contextlib").deps(&["functools", "sys"]),
        py("cookielib")
            .py2()
            .deps(&["calendar", "copy", "httplib", "re", "time", "urllib", "urlparse"]),
        py("copy").py2().deps(&["copy_reg", "types", "weakref"]),
        py("copy").py3().deps(&["copyreg", "types", "weakref"]),
        py("copy_reg").py2().deps(&["types"]),
        py("copyreg").py3(),
        ext("crypt")
            .py2()
            .non_windows()
            .external("crypt")
            .sources(&["cryptmodule.c"]),
        py("crypt").py3().non_windows().deps(&["_crypt"]),
        py("ctypes")
            .deps(&["_ctypes", "os", "struct", "sys"])
            .submodules(&["ctypes.util", "ctypes.wintypes"]),
        py("ctypes.util").deps(&["os", "re", "shutil", "tempfile"]),
        py("ctypes.wintypes").windows_only().deps(&["ctypes"]),
        py("curses")
            .non_windows()
            .deps(&["_curses", "os"])
            .submodules(&["curses.ascii", "curses.panel"]),
        py("curses.ascii").non_windows(),
        py("curses.panel").non_windows().deps(&["_curses_panel"]),
        ext("datetime")
            .py2()
            .deps(&["time"])
            .sources(&["datetimemodule.c"])
            .libs(&["!win#-lm"]),
        py("datetime").py3().deps(&["_datetime", "math", "time"]),
        core_py("encodings")
            .deps(&["codecs", "encodings.aliases"])
            .submodules(&[
                "encodings.aliases",
                "encodings.ascii",
                "encodings.cp437",
                "encodings.idna",
                "encodings.latin_1",
                "encodings.mbcs",
                "encodings.utf_8",
            ]),
        core_py("encodings.aliases"),
        core_py("encodings.ascii").deps(&["codecs"]),
        core_py("encodings.cp437").deps(&["codecs"]),
        py("encodings.idna").deps(&["codecs", "re", "stringprep"]),
        core_py("encodings.latin_1").deps(&["codecs"]),
        core_py("encodings.mbcs").windows_only().deps(&["codecs"]),
        core_py("encodings.utf_8").deps(&["codecs"]),
        py("enum").versions((3, 4), (3, 99)).deps(&["collections", "types"]),
        core_ext("errno"),
        core_ext("exceptions").py2(),
        core_ext("faulthandler").py3(),
        ext("fcntl").non_windows(),
        py("fnmatch").deps(&["os", "posixpath", "re"]),
        py("functools").py2().deps(&["_functools"]),
        py("functools").py3().deps(&[
            "_functools",
            "_thread",
            "abc",
            "collections",
            "reprlib",
            "types",
            "weakref",
        ]),
        core_ext("gc"),
        py("genericpath").deps(&["os", "stat"]),
        py("getopt").deps(&["os"]),
        py("glob").deps(&["fnmatch", "os", "re"]),
        ext("grp").non_windows(),
        py("gzip").deps(&["io", "os", "struct", "time", "zlib"]),
        py("hashlib").py2().deps(&[
            "ssl#_hashlib",
            "!ssl#_md5",
            "!ssl#_sha",
            "!ssl#_sha256",
            "!ssl#_sha512",
        ]),
        py("hashlib").versions((3, 0), (3, 5)).deps(&[
            "ssl#_hashlib",
            "!ssl#_md5",
            "!ssl#_sha1",
            "!ssl#_sha256",
            "!ssl#_sha512",
        ]),
        py("hashlib").versions((3, 6), (3, 99)).deps(&[
            "_blake2",
            "_sha3",
            "ssl#_hashlib",
            "!ssl#_md5",
            "!ssl#_sha1",
            "!ssl#_sha256",
            "!ssl#_sha512",
        ]),
        py("heapq").deps(&["_heapq", "itertools"]),
        py("hmac").deps(&["hashlib", "warnings"]),
        py("http").py3().submodules(&["http.client", "http.cookiejar"]),
        py("http.client").py3().deps(&[
            "collections",
            "io",
            "os",
            "re",
            "socket",
            "ssl#ssl",
            "urllib.parse",
        ]),
        py("http.cookiejar").py3().deps(&[
            "calendar",
            "copy",
            "datetime",
            "http.client",
            "re",
            "time",
            "urllib.parse",
            "urllib.request",
        ]),
        py("httplib").py2().deps(&[
            "StringIO",
            "array",
            "mimetools",
            "os",
            "re",
            "socket",
            "ssl#ssl",
            "urlparse",
        ]),
        core_ext("imp").py2(),
        core_py("importlib")
            .py3()
            .deps(&["_imp", "types", "warnings"])
            .submodules(&["importlib.machinery", "importlib.util"]),
        py("importlib.machinery").py3().deps(&["importlib"]),
        py("importlib.util").py3().deps(&["importlib", "importlib.machinery"]),
        py("io").py2().deps(&["_io", "abc"]),
        core_py("io").py3().deps(&["_io", "abc"]),
        ext("itertools").py2().sources(&["itertoolsmodule.c"]),
        core_ext("itertools").py3(),
        py("json")
            .deps(&["json.decoder", "json.encoder"])
            .submodules(&["json.decoder", "json.encoder", "json.scanner", "json.tool"]),
        py("json.decoder").deps(&["_json", "json.scanner", "re"]),
        py("json.encoder").deps(&["_json", "re"]),
        py("json.scanner").deps(&["_json", "re"]),
        py("json.tool").deps(&["json", "sys"]),
        py("keyword"),
        py("linecache").deps(&["os", "sys"]),
        py("locale").deps(&["_locale", "encodings", "functools", "re"]),
        py("logging")
            .deps(&["os", "sys", "threading", "time", "traceback", "warnings", "weakref"])
            .submodules(&["logging.config", "logging.handlers"]),
        py("logging.config").deps(&[
            "logging",
            "logging.handlers",
            "re",
            "struct",
            "threading",
            "traceback",
        ]),
        py("logging.handlers").deps(&["logging", "os", "pickle", "re", "socket", "struct", "time"]),
        py("lzma").py3().deps(&["_lzma", "io", "os"]),
        core_ext("marshal"),
        ext("math")
            .sources(&["mathmodule.c", "_math.c"])
            .libs(&["!win#-lm"]),
        py("mimetools").py2().deps(&["os", "rfc822", "tempfile", "time"]),
        core_ext("msvcrt").windows_only(),
        core_ext("nt").windows_only(),
        py("ntpath").deps(&["genericpath", "os", "stat"]),
        py("nturl2path").py2().deps(&["string", "urllib"]),
        py("nturl2path").py3().deps(&["string", "urllib.parse"]),
        py("numbers").deps(&["abc"]),
        ext("operator").versions((2, 0), (3, 3)).sources(&["operator.c"]),
        py("operator").versions((3, 4), (3, 99)).deps(&["_operator"]),
        py("os").py2().deps(&[
            "UserDict",
            "errno",
            "!win#posix",
            "!win#posixpath",
            "stat",
            "sys",
            "win#nt",
            "win#ntpath",
        ]),
        py("os").py3().deps(&[
            "abc",
            "errno",
            "!win#posix",
            "!win#posixpath",
            "stat",
            "sys",
            "win#nt",
            "win#ntpath",
        ]),
        py("pickle").py2().deps(&["copy_reg", "marshal", "re", "struct", "types"]),
        py("pickle").py3().deps(&[
            "_compat_pickle",
            "_pickle",
            "codecs",
            "copyreg",
            "io",
            "marshal",
            "re",
            "struct",
            "types",
        ]),
        py("platform").deps(&["os", "re", "subprocess"]),
        core_ext("posix").non_windows(),
        py("posixpath").deps(&["genericpath", "os", "!win#pwd", "re", "stat"]),
        core_ext("pwd").non_windows(),
        ext("pyexpat")
            .sources(&[
                "expat/xmlparse.c",
                "expat/xmlrole.c",
                "expat/xmltok.c",
                "pyexpat.c",
            ])
            .defines(&["XML_STATIC", "HAVE_EXPAT_CONFIG_H", "USE_PYEXPAT_CAPI"])
            .includes(&["expat"]),
        py("Queue").py2().deps(&["collections", "heapq", "threading", "time"]),
        py("queue").py3().deps(&["collections", "heapq", "threading", "time"]),
        py("random").deps(&["_random", "bisect", "hashlib", "math", "os"]),
        py("re").deps(&["sre_compile", "sre_constants", "sre_parse"]),
        ext("readline")
            .non_windows()
            .external("readline")
            .sources(&["readline.c"]),
        py("reprlib").py3().deps(&["_thread", "itertools"]),
        py("rfc822").py2().deps(&["time"]),
        ext("select").sources(&["selectmodule.c"]).libs(&["win#-lws2_32"]),
        py("selectors")
            .versions((3, 4), (3, 99))
            .deps(&["abc", "collections", "math", "select"]),
        py("shutil").deps(&["fnmatch", "os", "stat"]),
        core_ext("signal").versions((2, 0), (3, 4)),
        py("signal").versions((3, 5), (3, 99)).deps(&["_signal", "enum"]),
        py("socket").deps(&["_socket", "errno", "os", "sys"]),
        py("sre_compile").deps(&["_sre", "sre_constants", "sre_parse"]),
        py("sre_constants").deps(&["_sre"]),
        py("sre_parse").deps(&["sre_constants"]),
        py("ssl")
            .with_ssl()
            .deps(&["_ssl", "base64", "errno", "re", "socket"]),
        py("stat").versions((2, 0), (3, 3)),
        py("stat").versions((3, 4), (3, 99)).deps(&["_stat"]),
        py("string").py2().deps(&["re"]),
        py("string").py3().deps(&["_string", "re"]),
        py("StringIO").py2().deps(&["errno"]),
        py("stringprep").deps(&["unicodedata"]),
        py("struct").deps(&["_struct"]),
        py("subprocess").py2().deps(&[
            "errno",
            "!win#fcntl",
            "gc",
            "os",
            "select",
            "signal",
            "time",
            "types",
            "win#_subprocess",
            "win#msvcrt",
        ]),
        py("subprocess").py3().deps(&[
            "errno",
            "io",
            "os",
            "!win#_posixsubprocess",
            "select",
            "signal",
            "time",
            "warnings",
            "win#_winapi",
            "win#msvcrt",
        ]),
        core_ext("sys"),
        py("sysconfig")
            .versions((2, 0), (3, 5))
            .deps(&["os", "re", "!win#_sysconfigdata"]),
        py("sysconfig")
            .versions((3, 6), (3, 99))
            .deps(&["os", "re", "!win#_sysconfigdata*"]),
        py("tempfile").deps(&["errno", "os", "random", "shutil"]),
        ext("termios").non_windows(),
        core_ext("thread").py2(),
        py("threading").py2().deps(&["collections", "thread", "time", "warnings"]),
        py("threading").py3().deps(&[
            "_thread",
            "_weakrefset",
            "collections",
            "itertools",
            "time",
        ]),
        ext("time")
            .py2()
            .sources(&["timemodule.c"])
            .libs(&["!win#-lm"]),
        core_ext("time").py3(),
        py("traceback").deps(&["linecache", "sys"]),
        core_py("types"),
        py("typing").versions((3, 5), (3, 99)).deps(&[
            "abc",
            "collections",
            "contextlib",
            "functools",
            "re",
            "types",
        ]),
        ext("unicodedata").sources(&["unicodedata.c"]),
        py("urllib").py2().deps(&[
            "base64",
            "macos#_scproxy",
            "mimetools",
            "os",
            "re",
            "socket",
            "ssl#ssl",
            "string",
            "time",
            "urlparse",
            "win#_winreg",
            "win#nturl2path",
        ]),
        py("urllib").py3().submodules(&[
            "urllib.error",
            "urllib.parse",
            "urllib.request",
            "urllib.response",
            "urllib.robotparser",
        ]),
        py("urllib.error").py3().deps(&["urllib.response"]),
        py("urllib.parse").py3().deps(&["collections", "re"]),
        py("urllib.request").py3().deps(&[
            "base64",
            "bisect",
            "hashlib",
            "http.client",
            "io",
            "macos#_scproxy",
            "os",
            "posixpath",
            "re",
            "socket",
            "ssl#ssl",
            "string",
            "tempfile",
            "time",
            "urllib.error",
            "urllib.parse",
            "urllib.response",
            "win#nturl2path",
            "win#winreg",
        ]),
        py("urllib.response").py3().deps(&["tempfile"]),
        py("urllib.robotparser")
            .py3()
            .deps(&["urllib.parse", "urllib.request"]),
        py("urllib2").py2().deps(&[
            "StringIO",
            "base64",
            "bisect",
            "cookielib",
            "hashlib",
            "httplib",
            "mimetools",
            "os",
            "posixpath",
            "random",
            "re",
            "socket",
            "ssl#ssl",
            "time",
            "urllib",
            "urlparse",
        ]),
        py("urlparse").py2().deps(&["collections"]),
        py("UserDict").py2().deps(&["_abcoll"]),
        core_py("warnings").deps(&["_warnings"]),
        py("weakref").py2().deps(&["UserDict", "_weakref", "_weakrefset"]),
        py("weakref")
            .py3()
            .deps(&["_weakref", "_weakrefset", "collections"]),
        core_ext("winreg").py3().windows_only(),
        py("xml").submodules(&["xml.etree", "xml.parsers"]),
        py("xml.etree").submodules(&["xml.etree.ElementTree"]),
        py("xml.etree.ElementTree").deps(&["re", "warnings", "xml.parsers.expat"]),
        py("xml.parsers").submodules(&["xml.parsers.expat"]),
        py("xml.parsers.expat").deps(&["pyexpat"]),
        py("zipfile").deps(&[
            "binascii",
            "io",
            "os",
            "re",
            "shutil",
            "stat",
            "struct",
            "time",
            "zlib",
        ]),
        core_ext("zipimport"),
        ext("zlib").external("zlib").sources(&["zlibmodule.c"]),
    ]
}
