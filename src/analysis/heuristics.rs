//! Stateless classification heuristics.
//!
//! Two opt-in filters recur across every search and usage operation: skipping
//! compiler-generated machinery (closures, iterators, state machines) and
//! skipping runtime/framework binaries. Both are pure predicates over explicit
//! inputs - no configuration state.

use crate::metadata::types::CustomAttribute;

const COMPILER_GENERATED_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.CompilerGeneratedAttribute";

/// Returns `true` when a type or member is compiler generated: it carries the
/// well-known marker attribute, or its simple name contains both `<` and `>`
/// (the mangling used for closures, iterators and async state machines).
#[must_use]
pub fn is_compiler_generated(name: &str, attributes: &[CustomAttribute]) -> bool {
    if attributes
        .iter()
        .any(|attr| attr.attribute_type.full_name() == COMPILER_GENERATED_ATTRIBUTE)
    {
        return true;
    }
    name.contains('<') && name.contains('>')
}

const FRAMEWORK_NAMES: &[&str] = &[
    "mscorlib",
    "netstandard",
    "System",
    "WindowsBase",
    "PresentationCore",
    "PresentationFramework",
];

const FRAMEWORK_PATH_MARKERS: &[&str] = &[
    "/dotnet/shared/",
    "\\dotnet\\shared\\",
    "/Microsoft.NET/",
    "\\Microsoft.NET\\",
    "/gac_",
    "\\gac_",
];

/// Returns `true` when filename/assembly-name heuristics identify a
/// runtime or framework binary.
///
/// Matches the exact well-known names, the `System.*` / `Microsoft.*` name
/// prefixes, and installation-path markers of framework load locations.
#[must_use]
pub fn is_framework_assembly(path: &str, assembly_name: &str) -> bool {
    if FRAMEWORK_NAMES.iter().any(|n| assembly_name == *n)
        || assembly_name.starts_with("System.")
        || assembly_name.starts_with("Microsoft.")
    {
        return true;
    }
    let stem = std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    if FRAMEWORK_NAMES.iter().any(|n| stem == *n)
        || stem.starts_with("System.")
        || stem.starts_with("Microsoft.")
    {
        return true;
    }
    FRAMEWORK_PATH_MARKERS.iter().any(|m| path.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::types::CilTypeRef;

    #[test]
    fn test_compiler_generated_by_name_mangling() {
        assert!(is_compiler_generated("<Run>d__3", &[]));
        assert!(is_compiler_generated("<>c__DisplayClass0_0", &[]));
        assert!(!is_compiler_generated("Run", &[]));
        // One bracket alone is not enough.
        assert!(!is_compiler_generated("<incomplete", &[]));
    }

    #[test]
    fn test_compiler_generated_by_attribute() {
        let attrs = vec![CustomAttribute::new(CilTypeRef::named(
            "System.Runtime.CompilerServices.CompilerGeneratedAttribute",
        ))];
        assert!(is_compiler_generated("Plain", &attrs));
    }

    #[test]
    fn test_framework_assembly_names() {
        assert!(is_framework_assembly("", "mscorlib"));
        assert!(is_framework_assembly("", "System.Core"));
        assert!(is_framework_assembly("", "Microsoft.CSharp"));
        assert!(!is_framework_assembly("", "Game.Core"));
    }

    #[test]
    fn test_framework_assembly_paths() {
        assert!(is_framework_assembly(
            "/usr/share/dotnet/shared/Microsoft.NETCore.App/8.0.0/System.Text.Json.dll",
            ""
        ));
        assert!(is_framework_assembly("C:\\Windows\\Microsoft.NET\\Framework64\\v4.0\\mscorlib.dll", ""));
        assert!(!is_framework_assembly("/home/user/project/bin/Game.dll", ""));
    }
}
