//! Consistency checks for the module tables.
//!
//! Overlapping version ranges are rejected when a table is built. These
//! checks find the remaining authoring mistakes, which only show up when a
//! particular version or target is resolved.

use std::fmt;

use crate::core::version::{PythonVersion, VersionRange};
use crate::metadata::external;
use crate::metadata::module::{parent_packages, ModuleDef, ModuleTable, ModuleVariant, PlatformRestriction, Scoped, SslRelevance};

/// One problem found in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub module: String,
    pub range: VersionRange,
    pub message: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.module, self.range, self.message)
    }
}

/// Report every pair of overlapping variants in a set of definitions.
///
/// Building a table stops at the first overlap, this finds them all.
pub fn check_overlaps(defs: &[ModuleDef]) -> Vec<Problem> {
    let mut problems = Vec::new();

    for (i, a) in defs.iter().enumerate() {
        for b in &defs[i + 1..] {
            if a.name == b.name && a.range.overlaps(&b.range) {
                problems.push(Problem {
                    module: a.name.to_string(),
                    range: a.range,
                    message: format!("overlaps the variant for {}", b.range),
                });
            }
        }
    }

    problems
}

/// Check the references made by every variant in a table.
pub fn check_table(table: &ModuleTable) -> Vec<Problem> {
    let mut problems = Vec::new();

    for variant in table.all_variants() {
        let mut report = |message: String| {
            problems.push(Problem {
                module: variant.name.clone(),
                range: variant.version_range,
                message,
            })
        };

        if let Some(id) = &variant.external_lib_id {
            if external::find(id).is_none() {
                report(format!("unknown external library `{}`", id));
            }
        }

        for version in variant.version_range.supported_versions() {
            for dep in &variant.deps {
                match table.get(&dep.value, version) {
                    None => report(format!("dependency `{}` does not exist for v{}", dep.value, version)),
                    Some(target) => {
                        if let Some(message) = unguarded(variant, dep, target) {
                            report(format!("{} for v{}", message, version));
                        }
                    }
                }
            }

            for sub in &variant.submodules {
                if table.get(sub, version).is_none() {
                    report(format!("submodule `{}` does not exist for v{}", sub, version));
                }
            }

            for parent in parent_packages(&variant.name) {
                if table.get(parent, version).is_none() {
                    report(format!("parent package `{}` does not exist for v{}", parent, version));
                }
            }
        }
    }

    problems.sort_by(|a, b| a.module.cmp(&b.module).then(a.message.cmp(&b.message)));
    problems.dedup();
    problems
}

/// Check that a dependency on a restricted module carries a matching
/// condition, unless the dependent has the same restriction.
fn unguarded(from: &ModuleVariant, dep: &Scoped, to: &ModuleVariant) -> Option<String> {
    if let Some(restriction) = to.platform_restriction {
        if from.platform_restriction != Some(restriction) {
            let expected = match restriction {
                PlatformRestriction::WindowsOnly => "win",
                PlatformRestriction::NonWindows => "!win",
            };
            if dep.scope.as_str() != expected {
                return Some(format!(
                    "dependency `{}` is platform specific and needs a `{}#` scope",
                    dep.value, expected
                ));
            }
        }
    }

    if let Some(relevance) = to.ssl_relevance {
        if from.ssl_relevance != Some(relevance) {
            let wanted = relevance == SslRelevance::WithSsl;
            if dep.ssl != Some(wanted) {
                return Some(format!(
                    "dependency `{}` depends on SSL support and needs a `{}ssl#` condition",
                    dep.value,
                    if wanted { "" } else { "!" }
                ));
            }
        }
    }

    None
}

/// The supported versions a module does not exist for.
pub fn missing_versions(table: &ModuleTable, name: &str) -> Vec<PythonVersion> {
    crate::core::version::SUPPORTED_VERSIONS
        .iter()
        .copied()
        .filter(|v| table.get(name, *v).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::module::ModuleKind::*;
    use crate::metadata::stdlib;

    #[test]
    fn test_builtin_tables_are_clean() {
        assert_eq!(check_overlaps(&stdlib::stdlib_defs()), vec![]);
        assert_eq!(check_table(stdlib::table().unwrap()), vec![]);
    }

    #[test]
    fn test_reports_all_overlaps() {
        let defs = vec![
            ModuleDef::new("a", PythonSource).versions((3, 0), (3, 5)),
            ModuleDef::new("a", PythonSource).versions((3, 4), (3, 99)),
            ModuleDef::new("b", PythonSource),
            ModuleDef::new("b", PythonSource).py2(),
        ];

        let problems = check_overlaps(&defs);
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].module, "a");
        assert_eq!(problems[1].module, "b");
    }

    #[test]
    fn test_missing_dependency_for_part_of_range() {
        let table = ModuleTable::new([
            ModuleDef::new("enum", PythonSource).versions((3, 4), (3, 99)),
            ModuleDef::new("signal", PythonSource).py3().deps(&["enum"]),
        ])
        .unwrap();

        let problems = check_table(&table);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].message.contains("`enum` does not exist for v3.3"));
    }

    #[test]
    fn test_unknown_external_library() {
        let table = ModuleTable::new([
            ModuleDef::new("_sqlite3", NativeExtension).external("sqlite3")
        ])
        .unwrap();

        let problems = check_table(&table);
        assert!(problems[0].message.contains("unknown external library `sqlite3`"));
    }

    #[test]
    fn test_unguarded_restricted_dependency() {
        let table = ModuleTable::new([
            ModuleDef::new("_winreg", CoreNativeExtension).windows_only(),
            ModuleDef::new("_md5", NativeExtension).without_ssl(),
            ModuleDef::new("urllib", PythonSource).deps(&["_winreg", "!ssl#_md5"]),
            ModuleDef::new("nturl2path", PythonSource).deps(&["win#_winreg", "_md5"]),
        ])
        .unwrap();

        let problems = check_table(&table);
        let messages: Vec<_> = problems.iter().map(|p| p.to_string()).collect();
        assert!(messages.iter().any(|m| m.starts_with("urllib") && m.contains("`win#` scope")));
        assert!(messages.iter().any(|m| m.starts_with("nturl2path") && m.contains("`!ssl#`")));
        assert_eq!(problems.len(), 2 * crate::core::version::SUPPORTED_VERSIONS.len());
    }

    #[test]
    fn test_missing_versions() {
        let table = stdlib::table().unwrap();
        assert_eq!(missing_versions(table, "urllib2").len(), 5);
        assert!(missing_versions(table, "json").is_empty());
    }
}
