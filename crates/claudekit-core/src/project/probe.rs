//! Package-manager and tool detection
//!
//! Pure detection: lockfiles, config files, and `package.json` contents
//! decide what the project has. Resolution produces an invocation recipe
//! (`node_modules/.bin` first, else the package manager's exec command)
//! without ever running anything.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::Path;
use std::time::SystemTime;

/// Detected package manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Bun,
    /// No `package.json` at the root
    None,
}

impl PackageManager {
    /// The exec command used to run a tool that has no local binary:
    /// `npx` / `yarn dlx` / `pnpm dlx` / `bunx`.
    pub fn exec_recipe(&self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            PackageManager::Npm => Some(("npx", &[])),
            PackageManager::Yarn => Some(("yarn", &["dlx"])),
            PackageManager::Pnpm => Some(("pnpm", &["dlx"])),
            PackageManager::Bun => Some(("bunx", &[])),
            PackageManager::None => None,
        }
    }

    /// Argv for running the project's `test` script.
    pub fn test_script_argv(&self) -> Option<Vec<String>> {
        let argv: &[&str] = match self {
            PackageManager::Npm => &["npm", "test", "--"],
            PackageManager::Yarn => &["yarn", "test"],
            PackageManager::Pnpm => &["pnpm", "test"],
            PackageManager::Bun => &["bun", "run", "test"],
            PackageManager::None => return None,
        };
        Some(argv.iter().map(|s| s.to_string()).collect())
    }
}

impl Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
            PackageManager::None => "none",
        };
        write!(f, "{s}")
    }
}

/// A concrete tool invocation recipe: binary plus leading argv elements.
///
/// `program` is either an absolute `node_modules/.bin` path or a package
/// manager's exec command; callers append their own arguments as further
/// discrete argv elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Full argv with `extra` appended after the recipe's own arguments.
    pub fn argv<I, S>(&self, extra: I) -> (String, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = self.args.clone();
        args.extend(extra.into_iter().map(Into::into));
        (self.program.clone(), args)
    }
}

/// Detected test runner kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestRunnerKind {
    Jest,
    Vitest,
    Mocha,
}

impl TestRunnerKind {
    pub const fn bin_name(&self) -> &'static str {
        match self {
            TestRunnerKind::Jest => "jest",
            TestRunnerKind::Vitest => "vitest",
            TestRunnerKind::Mocha => "mocha",
        }
    }

    /// Subcommand arguments that precede the file list.
    pub fn run_args(&self) -> &'static [&'static str] {
        match self {
            // `vitest` without `run` starts watch mode
            TestRunnerKind::Vitest => &["run"],
            TestRunnerKind::Jest | TestRunnerKind::Mocha => &[],
        }
    }
}

/// A resolved test runner
#[derive(Debug, Clone)]
pub struct TestRunner {
    pub kind: TestRunnerKind,
    pub command: ToolCommand,
}

/// The tools a project actually has, each resolved to a recipe
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
    pub type_checker: Option<ToolCommand>,
    pub linter: Option<ToolCommand>,
    pub test_runner: Option<TestRunner>,
    pub git: bool,
    pub prettier: bool,
}

/// Everything the engine knows about a project, derived once per root
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub root: std::path::PathBuf,
    pub package_manager: PackageManager,
    pub tools: Toolchain,
    pub scripts: HashMap<String, String>,
}

impl ProjectContext {
    /// Probe a root directory. Never fails: a directory with nothing in
    /// it yields a context with everything absent.
    pub fn discover(root: &Path) -> Self {
        let package_json = read_package_json(root);
        let package_manager = detect_package_manager(root, package_json.as_ref());
        let scripts = parse_scripts(package_json.as_ref());
        let tools = Toolchain {
            type_checker: detect_type_checker(root, package_json.as_ref(), package_manager),
            linter: detect_linter(root, package_json.as_ref(), package_manager),
            test_runner: detect_test_runner(root, package_json.as_ref(), &scripts, package_manager),
            git: root.join(".git").exists(),
            prettier: detect_prettier(root, package_json.as_ref()),
        };
        Self {
            root: root.to_path_buf(),
            package_manager,
            tools,
            scripts,
        }
    }

    /// True when the root carries a `package.json`
    pub fn is_package(&self) -> bool {
        self.package_manager != PackageManager::None
    }
}

fn read_package_json(root: &Path) -> Option<Value> {
    let text = std::fs::read_to_string(root.join("package.json")).ok()?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!("malformed package.json at {}: {err}", root.display());
            None
        }
    }
}

/// Lockfile precedence: `bun.lockb > pnpm-lock.yaml > yarn.lock >
/// package-lock.json`. When several lockfiles exist the most recently
/// modified wins, with the precedence order breaking mtime ties.
fn detect_package_manager(root: &Path, package_json: Option<&Value>) -> PackageManager {
    const LOCKFILES: &[(&str, PackageManager)] = &[
        ("bun.lockb", PackageManager::Bun),
        ("pnpm-lock.yaml", PackageManager::Pnpm),
        ("yarn.lock", PackageManager::Yarn),
        ("package-lock.json", PackageManager::Npm),
    ];

    let mut best: Option<(SystemTime, usize, PackageManager)> = None;
    for (precedence, (name, pm)) in LOCKFILES.iter().enumerate() {
        let Ok(meta) = root.join(name).metadata() else {
            continue;
        };
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let candidate = (mtime, precedence, *pm);
        best = match best {
            None => Some(candidate),
            Some(current) => {
                // Newer mtime wins; equal mtimes fall back to precedence
                // (lower index is stronger)
                if mtime > current.0 || (mtime == current.0 && precedence < current.1) {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    if let Some((_, _, pm)) = best {
        return pm;
    }

    let Some(pkg) = package_json else {
        return PackageManager::None;
    };
    if let Some(field) = pkg.get("packageManager").and_then(Value::as_str) {
        let name = field.split('@').next().unwrap_or(field);
        match name {
            "yarn" => return PackageManager::Yarn,
            "pnpm" => return PackageManager::Pnpm,
            "bun" => return PackageManager::Bun,
            "npm" => return PackageManager::Npm,
            _ => {}
        }
    }
    PackageManager::Npm
}

fn parse_scripts(package_json: Option<&Value>) -> HashMap<String, String> {
    let mut scripts = HashMap::new();
    if let Some(map) = package_json
        .and_then(|pkg| pkg.get("scripts"))
        .and_then(Value::as_object)
    {
        for (name, value) in map {
            if let Some(command) = value.as_str() {
                scripts.insert(name.clone(), command.to_string());
            }
        }
    }
    scripts
}

fn has_dependency(package_json: Option<&Value>, name: &str) -> bool {
    let Some(pkg) = package_json else {
        return false;
    };
    ["dependencies", "devDependencies"].iter().any(|section| {
        pkg.get(section)
            .and_then(Value::as_object)
            .is_some_and(|deps| deps.contains_key(name))
    })
}

/// Resolve a tool to its invocation recipe: the local
/// `node_modules/.bin/<bin>` when present, else `<pm> exec`.
fn resolve_tool(root: &Path, pm: PackageManager, bin: &str) -> Option<ToolCommand> {
    let local = root.join("node_modules").join(".bin").join(bin);
    if local.is_file() {
        return Some(ToolCommand {
            program: local.display().to_string(),
            args: Vec::new(),
        });
    }
    let (program, leading) = pm.exec_recipe()?;
    let mut args: Vec<String> = leading.iter().map(|s| s.to_string()).collect();
    args.push(bin.to_string());
    Some(ToolCommand {
        program: program.to_string(),
        args,
    })
}

fn detect_type_checker(
    root: &Path,
    package_json: Option<&Value>,
    pm: PackageManager,
) -> Option<ToolCommand> {
    let present = has_dependency(package_json, "typescript") || root.join("tsconfig.json").is_file();
    if !present {
        return None;
    }
    resolve_tool(root, pm, "tsc")
}

fn detect_linter(
    root: &Path,
    package_json: Option<&Value>,
    pm: PackageManager,
) -> Option<ToolCommand> {
    const CONFIG_FILES: &[&str] = &[
        ".eslintrc",
        ".eslintrc.js",
        ".eslintrc.cjs",
        ".eslintrc.json",
        ".eslintrc.yml",
        ".eslintrc.yaml",
        "eslint.config.js",
        "eslint.config.mjs",
        "eslint.config.cjs",
        "eslint.config.ts",
    ];
    let present = CONFIG_FILES.iter().any(|name| root.join(name).is_file())
        || package_json.is_some_and(|pkg| pkg.get("eslintConfig").is_some());
    if !present {
        return None;
    }
    resolve_tool(root, pm, "eslint")
}

fn detect_test_runner(
    root: &Path,
    package_json: Option<&Value>,
    scripts: &HashMap<String, String>,
    pm: PackageManager,
) -> Option<TestRunner> {
    let test_script = scripts.get("test").map(String::as_str).unwrap_or("");
    for kind in [TestRunnerKind::Jest, TestRunnerKind::Vitest, TestRunnerKind::Mocha] {
        let name = kind.bin_name();
        if has_dependency(package_json, name) || test_script.contains(name) {
            let command = resolve_tool(root, pm, name)?;
            return Some(TestRunner { kind, command });
        }
    }
    None
}

fn detect_prettier(root: &Path, package_json: Option<&Value>) -> bool {
    const CONFIG_FILES: &[&str] = &[
        ".prettierrc",
        ".prettierrc.js",
        ".prettierrc.json",
        ".prettierrc.yml",
        ".prettierrc.yaml",
        "prettier.config.js",
    ];
    has_dependency(package_json, "prettier")
        || CONFIG_FILES.iter().any(|name| root.join(name).is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_project(package_json: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), package_json).unwrap();
        dir
    }

    #[test]
    fn empty_dir_has_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let context = ProjectContext::discover(dir.path());
        assert_eq!(context.package_manager, PackageManager::None);
        assert!(context.tools.type_checker.is_none());
        assert!(context.tools.linter.is_none());
        assert!(context.tools.test_runner.is_none());
        assert!(!context.tools.git);
        assert!(!context.is_package());
    }

    #[test]
    fn lockfile_beats_package_manager_field() {
        let dir = scratch_project(r#"{"packageManager": "yarn@4.0.0"}"#);
        fs::write(dir.path().join("pnpm-lock.yaml"), "").unwrap();
        let context = ProjectContext::discover(dir.path());
        assert_eq!(context.package_manager, PackageManager::Pnpm);
    }

    #[test]
    fn package_manager_field_when_no_lockfile() {
        let dir = scratch_project(r#"{"packageManager": "bun@1.1.0"}"#);
        let context = ProjectContext::discover(dir.path());
        assert_eq!(context.package_manager, PackageManager::Bun);
    }

    #[test]
    fn bare_package_json_defaults_to_npm() {
        let dir = scratch_project("{}");
        let context = ProjectContext::discover(dir.path());
        assert_eq!(context.package_manager, PackageManager::Npm);
    }

    #[test]
    fn tsconfig_implies_type_checker_via_exec() {
        let dir = scratch_project("{}");
        fs::write(dir.path().join("tsconfig.json"), "{}").unwrap();
        let context = ProjectContext::discover(dir.path());
        let tsc = context.tools.type_checker.unwrap();
        assert_eq!(tsc.program, "npx");
        assert_eq!(tsc.args, vec!["tsc"]);
    }

    #[test]
    fn local_bin_preferred_over_exec() {
        let dir = scratch_project(r#"{"devDependencies": {"typescript": "^5"}}"#);
        let bin_dir = dir.path().join("node_modules/.bin");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::write(bin_dir.join("tsc"), "#!/bin/sh\n").unwrap();
        let context = ProjectContext::discover(dir.path());
        let tsc = context.tools.type_checker.unwrap();
        assert!(tsc.program.ends_with("node_modules/.bin/tsc"));
        assert!(tsc.args.is_empty());
    }

    #[test]
    fn eslint_detected_by_flat_config() {
        let dir = scratch_project("{}");
        fs::write(dir.path().join("eslint.config.js"), "export default []").unwrap();
        let context = ProjectContext::discover(dir.path());
        assert!(context.tools.linter.is_some());
    }

    #[test]
    fn test_runner_from_script() {
        let dir = scratch_project(r#"{"scripts": {"test": "vitest run"}}"#);
        let context = ProjectContext::discover(dir.path());
        let runner = context.tools.test_runner.unwrap();
        assert_eq!(runner.kind, TestRunnerKind::Vitest);
        assert_eq!(runner.kind.run_args(), &["run"]);
    }

    #[test]
    fn test_runner_from_dependencies() {
        let dir = scratch_project(r#"{"devDependencies": {"jest": "^29"}}"#);
        let context = ProjectContext::discover(dir.path());
        assert_eq!(context.tools.test_runner.unwrap().kind, TestRunnerKind::Jest);
    }

    #[test]
    fn scripts_are_parsed() {
        let dir = scratch_project(r#"{"scripts": {"test": "jest", "build": "tsc -p ."}}"#);
        let context = ProjectContext::discover(dir.path());
        assert_eq!(context.scripts["build"], "tsc -p .");
    }

    #[test]
    fn yarn_exec_recipe_uses_dlx() {
        let dir = scratch_project("{}");
        fs::write(dir.path().join("yarn.lock"), "").unwrap();
        fs::write(dir.path().join("tsconfig.json"), "{}").unwrap();
        let context = ProjectContext::discover(dir.path());
        let tsc = context.tools.type_checker.unwrap();
        assert_eq!(tsc.program, "yarn");
        assert_eq!(tsc.args, vec!["dlx", "tsc"]);
    }

    #[test]
    fn argv_appends_extra_elements() {
        let cmd = ToolCommand {
            program: "npx".into(),
            args: vec!["eslint".into()],
        };
        let (program, args) = cmd.argv(["--fix", "src/a.ts"]);
        assert_eq!(program, "npx");
        assert_eq!(args, vec!["eslint", "--fix", "src/a.ts"]);
    }
}
