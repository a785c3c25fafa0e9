//! Assigning source files to qmake variables.

use std::fmt;
use std::path::Path;

/// The qmake variable a source file is listed in.
///
/// The declaration order is the order the variables are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceBucket {
    Sources,
    Headers,
    MasmSources,
    JavaSources,
    LexSources,
    CythonSources,
    YaccSources,
}

/// Extensions checked in order. Anything else is a C or C++ source.
const BUCKETS: &[(&[&str], SourceBucket)] = &[
    (&["asm"], SourceBucket::MasmSources),
    (&["h", "hpp"], SourceBucket::Headers),
    (&["java"], SourceBucket::JavaSources),
    (&["l"], SourceBucket::LexSources),
    (&["pyx"], SourceBucket::CythonSources),
    (&["y"], SourceBucket::YaccSources),
];

impl SourceBucket {
    /// Classify a file by its extension.
    pub fn classify(path: &Path) -> SourceBucket {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return SourceBucket::Sources;
        };

        BUCKETS
            .iter()
            .find(|(exts, _)| exts.contains(&ext))
            .map(|(_, bucket)| *bucket)
            .unwrap_or(SourceBucket::Sources)
    }

    pub fn variable(self) -> &'static str {
        match self {
            SourceBucket::Sources => "SOURCES",
            SourceBucket::Headers => "HEADERS",
            SourceBucket::MasmSources => "MASMSOURCES",
            SourceBucket::JavaSources => "JAVASOURCES",
            SourceBucket::LexSources => "LEXSOURCES",
            SourceBucket::CythonSources => "CYTHONSOURCES",
            SourceBucket::YaccSources => "YACCSOURCES",
        }
    }
}

impl fmt::Display for SourceBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.variable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let cases = [
            ("Modules/_json.c", SourceBucket::Sources),
            ("Modules/_io/_iomodule.h", SourceBucket::Headers),
            ("qt/helper.hpp", SourceBucket::Headers),
            ("win/thunk.asm", SourceBucket::MasmSources),
            ("android/Activity.java", SourceBucket::JavaSources),
            ("parse/lexer.l", SourceBucket::LexSources),
            ("fast.pyx", SourceBucket::CythonSources),
            ("parse/grammar.y", SourceBucket::YaccSources),
            ("main.cpp", SourceBucket::Sources),
            ("Makefile", SourceBucket::Sources),
        ];

        for (path, expected) in cases {
            assert_eq!(SourceBucket::classify(Path::new(path)), expected, "{}", path);
        }
    }

    #[test]
    fn test_emission_order() {
        let mut buckets = vec![
            SourceBucket::YaccSources,
            SourceBucket::Headers,
            SourceBucket::MasmSources,
            SourceBucket::Sources,
        ];
        buckets.sort();
        assert_eq!(
            buckets.iter().map(|b| b.variable()).collect::<Vec<_>>(),
            ["SOURCES", "HEADERS", "MASMSOURCES", "YACCSOURCES"]
        );
    }
}
