//! Corpus extraction.
//!
//! Units are collected independently (in parallel when enabled). Only after
//! every unit has finished is the [`TypeUniverse`] built and are interface
//! and struct records emitted, so cross-package lookups never observe a
//! partially collected corpus.

use crate::analyzers::method_set::MethodSetBuilder;
use crate::core::cancellation::CancellationToken;
use crate::core::errors::{Error, Result};
use crate::core::model::{AnalysisResult, InterfaceInfo, MethodInfo, StructInfo};
use crate::core::typed::{TypedCorpus, TypedInterface, TypedMethod, TypedStruct};
use crate::core::types::{GoType, StructField};
use crate::extraction::declarations::{collect_unit, PackageDecls, SourceUnit, TypeDecl};
use crate::extraction::universe::TypeUniverse;
use crate::observability::{
    increment_processed, set_current_unit, set_phase, set_phase_persistent, set_progress,
    AnalysisPhase,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, warn};

#[derive(Clone, Debug)]
pub struct ExtractionOptions {
    /// Path components kept in reported positions.
    pub position_segments: usize,
    pub parallel: bool,
    pub cancellation: CancellationToken,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            position_segments: 3,
            parallel: true,
            cancellation: CancellationToken::default(),
        }
    }
}

/// A package that was skipped because it failed declaration checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub unit: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.unit, self.message)
    }
}

/// Unresolved records plus the typed side table that parallels them.
#[derive(Clone, Debug, Default)]
pub struct ExtractedCorpus {
    pub result: AnalysisResult,
    pub typed: TypedCorpus,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn extract_corpus(units: &[SourceUnit], options: &ExtractionOptions) -> Result<ExtractedCorpus> {
    let _span = info_span!("extract_units", units = units.len()).entered();
    set_phase_persistent(AnalysisPhase::Parsing);
    set_progress(0, units.len());

    let outcomes: Vec<Result<PackageDecls>> = if options.parallel {
        units.par_iter().map(|unit| collect_one(unit, options)).collect()
    } else {
        units.iter().map(|unit| collect_one(unit, options)).collect()
    };
    if options.cancellation.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut packages = Vec::with_capacity(outcomes.len());
    let mut diagnostics = Vec::new();
    for (unit, outcome) in units.iter().zip(outcomes) {
        match outcome {
            Ok(decls) => packages.push(decls),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(err) => {
                warn!(unit = %unit.import_path, error = %err, "skipping package that failed declaration checks");
                diagnostics.push(Diagnostic::new(
                    &unit.import_path,
                    format!("failed declaration checks: {}", err),
                ));
            }
        }
    }

    if !units.is_empty() && packages.is_empty() {
        return Err(Error::NoUnitsExtracted {
            attempted: units.len(),
        });
    }
    packages.sort_by(|a, b| a.import_path.cmp(&b.import_path));

    set_phase_persistent(AnalysisPhase::Collection);
    let universe = TypeUniverse::new(&packages);
    let (result, typed) = build_records(&universe, &packages);
    debug!(
        packages = packages.len(),
        interfaces = result.interfaces.len(),
        structs = result.structs.len(),
        skipped = diagnostics.len(),
        "extraction finished"
    );

    Ok(ExtractedCorpus {
        result,
        typed,
        diagnostics,
    })
}

fn collect_one(unit: &SourceUnit, options: &ExtractionOptions) -> Result<PackageDecls> {
    if options.cancellation.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let _phase = set_phase(AnalysisPhase::Parsing);
    let _unit = set_current_unit(&unit.import_path, &unit.dir);
    let outcome = collect_unit(unit, options.position_segments);
    increment_processed();
    outcome
}

fn build_records(
    universe: &TypeUniverse<'_>,
    packages: &[PackageDecls],
) -> (AnalysisResult, TypedCorpus) {
    let builder = MethodSetBuilder::new(universe);
    let mut result = AnalysisResult::default();
    let mut typed = TypedCorpus::default();

    for package in packages {
        for decl in package.types.iter().filter(|decl| !decl.alias) {
            let named = GoType::named(&package.import_path, &decl.name);
            let Some(underlying) = universe.underlying(&named) else {
                continue;
            };
            match &underlying.ty {
                GoType::Struct(fields) => {
                    let (info, side) = struct_record(&builder, package, decl, fields);
                    result.structs.push(info);
                    typed.structs.push(side);
                }
                GoType::Interface(_) | GoType::Basic(_) => {
                    if let Some((info, side)) = interface_record(universe, package, decl, &named) {
                        result.interfaces.push(info);
                        typed.interfaces.push(side);
                    }
                }
                _ => {}
            }
        }
    }
    (result, typed)
}

fn interface_record(
    universe: &TypeUniverse<'_>,
    package: &PackageDecls,
    decl: &TypeDecl,
    named: &GoType,
) -> Option<(InterfaceInfo, TypedInterface)> {
    let Some(methods) = universe.interface_methods(named) else {
        debug!(
            package = %package.import_path,
            interface = %decl.name,
            "skipping constraint or incomplete interface"
        );
        return None;
    };
    if methods.is_empty() {
        return None;
    }

    let infos = methods
        .iter()
        .map(|m| {
            let position = m.position.clone().unwrap_or_else(|| decl.position.clone());
            MethodInfo::from_signature(m.name.clone(), position, &m.signature)
        })
        .collect();
    let typed_methods = methods
        .into_iter()
        .map(|m| TypedMethod {
            signature: m.signature,
            package: m.package.unwrap_or_else(|| package.import_path.clone()),
        })
        .collect();

    Some((
        InterfaceInfo {
            name: decl.name.clone(),
            position: decl.position.clone(),
            methods: infos,
        },
        TypedInterface {
            package: package.import_path.clone(),
            type_params: decl.type_params.clone(),
            methods: typed_methods,
        },
    ))
}

fn struct_record(
    builder: &MethodSetBuilder<'_, '_>,
    package: &PackageDecls,
    decl: &TypeDecl,
    fields: &[StructField],
) -> (StructInfo, TypedStruct) {
    let canonical = builder.build(&package.import_path, &decl.name).canonical();
    let info = StructInfo {
        name: decl.name.clone(),
        position: decl.position.clone(),
        methods: canonical.iter().map(|entry| entry.to_method_info()).collect(),
        embedded_types: fields
            .iter()
            .filter(|field| field.embedded)
            .map(|field| field.ty.render())
            .collect(),
        implemented_interfaces: Vec::new(),
    };
    let side = TypedStruct {
        package: package.import_path.clone(),
        methods: canonical
            .into_iter()
            .map(|entry| TypedMethod {
                signature: entry.signature,
                package: entry.package,
            })
            .collect(),
    };
    (info, side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn write_unit(root: &TempDir, rel: &str, import_path: &str, files: &[(&str, &str)]) -> SourceUnit {
        let dir = root.path().join(rel);
        fs::create_dir_all(&dir).unwrap();
        let mut paths = Vec::new();
        for (name, content) in files {
            let path = dir.join(name);
            fs::write(&path, content).unwrap();
            paths.push(path);
        }
        SourceUnit {
            import_path: import_path.to_string(),
            dir,
            files: paths,
        }
    }

    fn sequential() -> ExtractionOptions {
        ExtractionOptions {
            parallel: false,
            ..ExtractionOptions::default()
        }
    }

    const SHAPES: &str = indoc! {r#"
        package shapes

        type Shape interface {
            Area() float64
            Perimeter() float64
        }

        type Named interface {
            Name() string
            SetName(n string)
        }

        type Circle struct {
            Radius float64
        }

        func (c Circle) Area() float64 { return 0 }
        func (c Circle) Perimeter() float64 { return 0 }

        type Tag struct {
            name string
        }

        func (t Tag) Name() string { return t.name }
        func (t *Tag) SetName(n string) { t.name = n }
    "#};

    #[test]
    fn test_extracts_interfaces_and_structs() {
        let root = TempDir::new().unwrap();
        let unit = write_unit(&root, "shapes", "example.com/shapes", &[("shapes.go", SHAPES)]);

        let corpus = extract_corpus(&[unit], &sequential()).unwrap();
        let result = &corpus.result;

        let interfaces: Vec<&str> = result.interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(interfaces, vec!["Named", "Shape"]);
        let structs: Vec<&str> = result.structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(structs, vec!["Circle", "Tag"]);

        let tag = result.find_struct("Tag").unwrap();
        let methods: Vec<&str> = tag.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["Name", "SetName"]);
        assert_eq!(tag.methods[1].parameters[0].type_name, "string");

        assert_eq!(corpus.typed.structs.len(), result.structs.len());
        assert_eq!(corpus.typed.interfaces[1].methods.len(), 2);
        assert!(corpus.diagnostics.is_empty());
    }

    #[test]
    fn test_failing_unit_becomes_diagnostic() {
        let root = TempDir::new().unwrap();
        let good = write_unit(&root, "shapes", "example.com/shapes", &[("shapes.go", SHAPES)]);
        let broken = write_unit(
            &root,
            "broken",
            "example.com/broken",
            &[("broken.go", "package broken\n\nfunc (x Missing) Do() {}\n")],
        );

        let corpus = extract_corpus(&[broken, good], &sequential()).unwrap();
        assert_eq!(corpus.diagnostics.len(), 1);
        assert_eq!(corpus.diagnostics[0].unit, "example.com/broken");
        assert!(corpus.diagnostics[0]
            .message
            .starts_with("failed declaration checks: "));
        assert!(corpus.diagnostics[0].message.contains("Missing"));
        assert_eq!(corpus.result.structs.len(), 2);
    }

    #[test]
    fn test_all_units_failing_is_an_error() {
        let root = TempDir::new().unwrap();
        let broken = write_unit(
            &root,
            "broken",
            "example.com/broken",
            &[("broken.go", "package broken\n\ntype T struct {\n")],
        );
        let err = extract_corpus(&[broken], &sequential()).unwrap_err();
        assert!(matches!(err, Error::NoUnitsExtracted { attempted: 1 }));
    }

    #[test]
    fn test_no_units_is_empty_result() {
        let corpus = extract_corpus(&[], &ExtractionOptions::default()).unwrap();
        assert!(corpus.result.is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let root = TempDir::new().unwrap();
        let unit = write_unit(&root, "shapes", "example.com/shapes", &[("shapes.go", SHAPES)]);
        let options = ExtractionOptions::default();
        options.cancellation.cancel();
        assert!(matches!(
            extract_corpus(&[unit], &options),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn test_cross_package_embedding_and_constraints() {
        let root = TempDir::new().unwrap();
        let base = write_unit(
            &root,
            "base",
            "example.com/base",
            &[(
                "base.go",
                indoc! {r#"
                    package base

                    type Number interface {
                        ~int | ~float64
                    }

                    type Entity struct {
                        ID int
                    }

                    func (e *Entity) Identify() int { return e.ID }
                "#},
            )],
        );
        let users = write_unit(
            &root,
            "users",
            "example.com/users",
            &[(
                "users.go",
                indoc! {r#"
                    package users

                    import "example.com/base"

                    type User struct {
                        *base.Entity
                        Name string
                    }
                "#},
            )],
        );

        // units arrive out of order; the barrier makes that irrelevant
        let corpus = extract_corpus(&[users, base], &ExtractionOptions::default()).unwrap();
        assert!(corpus.result.interfaces.is_empty());

        let user = corpus.result.find_struct("User").unwrap();
        assert_eq!(user.embedded_types, vec!["*example.com/base.Entity"]);
        assert_eq!(user.methods.len(), 1);
        assert_eq!(user.methods[0].name, "Identify");
        assert_eq!(corpus.result.structs[0].name, "Entity");
    }
}
