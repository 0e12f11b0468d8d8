use crate::core::errors::{Error, Result};
use crate::extraction::declarations::SourceUnit;
use ignore::{DirEntry, WalkBuilder};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Directory names the Go tool never treats as packages of `./...`.
const SKIPPED_DIRS: &[&str] = &["vendor", "testdata"];

pub struct GoFileWalker {
    root: PathBuf,
    include_tests: bool,
    ignore_patterns: Vec<glob::Pattern>,
}

impl GoFileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            include_tests: false,
            ignore_patterns: vec![],
        }
    }

    pub fn with_tests(mut self, include_tests: bool) -> Self {
        self.include_tests = include_tests;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Result<Self> {
        self.ignore_patterns = patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<_, _>>()?;
        Ok(self)
    }

    /// Every Go source file under the root, sorted.
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(Error::file_system(
                "corpus root is not a directory",
                self.root.clone(),
            ));
        }

        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .filter_entry(|entry| !is_skipped_dir(entry))
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Files grouped into one extraction unit per directory, sorted by
    /// import path.
    pub fn units(&self) -> Result<Vec<SourceUnit>> {
        let mut by_dir: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for file in self.walk()? {
            if let Some(dir) = file.parent() {
                by_dir.entry(dir.to_path_buf()).or_default().push(file);
            }
        }

        let mut modules = ModuleResolver::default();
        let mut units: Vec<SourceUnit> = by_dir
            .into_iter()
            .map(|(dir, files)| SourceUnit {
                import_path: modules.import_path(&self.root, &dir),
                dir,
                files,
            })
            .collect();
        units.sort_by(|a, b| a.import_path.cmp(&b.import_path));
        debug!(root = %self.root.display(), units = units.len(), "discovered Go packages");
        Ok(units)
    }

    fn should_process(&self, path: &Path) -> bool {
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            return false;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with("_test.go"));
        if is_test && !self.include_tests {
            return false;
        }

        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let path_str = path.to_string_lossy();
        !self
            .ignore_patterns
            .iter()
            .any(|p| p.matches_path(relative) || p.matches(&path_str))
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name.starts_with('_') || SKIPPED_DIRS.contains(&name.as_ref())
}

pub fn find_go_units(root: &Path, include_tests: bool) -> Result<Vec<SourceUnit>> {
    GoFileWalker::new(root.to_path_buf())
        .with_tests(include_tests)
        .units()
}

/// Maps directories to import paths using the nearest `go.mod`.
#[derive(Default)]
struct ModuleResolver {
    cache: HashMap<PathBuf, Option<(PathBuf, String)>>,
}

impl ModuleResolver {
    fn import_path(&mut self, root: &Path, dir: &Path) -> String {
        match self.module_for(dir) {
            Some((module_root, module)) => match relative_slash_path(&module_root, dir) {
                Some(rel) if !rel.is_empty() => format!("{}/{}", module, rel),
                _ => module,
            },
            None => match relative_slash_path(root, dir) {
                Some(rel) if !rel.is_empty() => rel,
                _ => root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| ".".to_string()),
            },
        }
    }

    fn module_for(&mut self, dir: &Path) -> Option<(PathBuf, String)> {
        for ancestor in dir.ancestors() {
            if let Some(cached) = self.cache.get(ancestor) {
                return cached.clone();
            }
            let go_mod = ancestor.join("go.mod");
            if let Ok(content) = fs::read_to_string(&go_mod) {
                let found = parse_module_path(&content).map(|m| (ancestor.to_path_buf(), m));
                self.cache.insert(ancestor.to_path_buf(), found.clone());
                return found;
            }
        }
        None
    }
}

/// The `module` directive of a go.mod file.
pub fn parse_module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) && !rest.starts_with('"') {
            return None;
        }
        let module = rest.trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    })
}

fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module_path() {
        assert_eq!(
            parse_module_path("module example.com/app\n\ngo 1.22\n"),
            Some("example.com/app".to_string())
        );
        assert_eq!(
            parse_module_path("// comment\nmodule \"example.com/quoted\" // trailing\n"),
            Some("example.com/quoted".to_string())
        );
        assert_eq!(parse_module_path("modules x\n"), None);
        assert_eq!(parse_module_path("go 1.22\n"), None);
    }

    #[test]
    fn test_relative_slash_path() {
        let base = Path::new("/src/app");
        assert_eq!(
            relative_slash_path(base, Path::new("/src/app/internal/repo")),
            Some("internal/repo".to_string())
        );
        assert_eq!(relative_slash_path(base, base), Some(String::new()));
        assert_eq!(relative_slash_path(base, Path::new("/other")), None);
    }
}
