// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level buildfile as read from TOML.
///
/// ```toml
/// [config]
/// cache_file = "_build/cache/taskforge.filecache.json"
///
/// [task.gen]
/// cmd = "python3 gen.py > gen.c"
///
/// [task.compile]
/// cmd = ["cc", "-o", "app", "gen.c"]
/// deps = [{ task = "gen" }, "gen.c"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// Cache file location relative to the build root. Defaults to
    /// [`DEFAULT_CACHE_FILE`](crate::cache::DEFAULT_CACHE_FILE).
    #[serde(default)]
    pub cache_file: Option<String>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub cmd: CommandSpec,

    /// A string is a file dependency, `{ task = "<name>" }` a task dependency.
    /// Anything else is kept and rejected when the task runs.
    #[serde(default)]
    pub deps: Vec<toml::Value>,

    /// Fail the task when the command exits non-zero.
    #[serde(default = "default_check")]
    pub check: bool,

    /// Run the command even when every file dependency is unchanged.
    #[serde(default)]
    pub force: bool,
}

fn default_check() -> bool {
    true
}

/// How a task's command is written in the buildfile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    /// Run through the platform shell.
    Shell(String),
    /// Run directly, no shell involved.
    Argv(Vec<String>),
}

impl CommandSpec {
    pub fn to_argv(&self) -> Vec<String> {
        match self {
            CommandSpec::Shell(line) if cfg!(windows) => {
                vec!["cmd".to_string(), "/C".to_string(), line.clone()]
            }
            CommandSpec::Shell(line) => vec!["sh".to_string(), "-c".to_string(), line.clone()],
            CommandSpec::Argv(argv) => argv.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CommandSpec::Shell(line) => line.trim().is_empty(),
            CommandSpec::Argv(argv) => argv.is_empty(),
        }
    }
}

/// A classified `deps` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepSpec {
    File(String),
    Task(String),
    Unsupported(String),
}

impl DepSpec {
    pub fn from_value(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(path) => DepSpec::File(path.clone()),
            toml::Value::Table(table) if table.len() == 1 => match table.get("task") {
                Some(toml::Value::String(name)) => DepSpec::Task(name.clone()),
                _ => DepSpec::Unsupported(describe(value)),
            },
            other => DepSpec::Unsupported(describe(other)),
        }
    }
}

fn describe(value: &toml::Value) -> String {
    format!("{} `{}`", value.type_str(), value)
}

impl TaskConfig {
    pub fn dep_specs(&self) -> Vec<DepSpec> {
        self.deps.iter().map(DepSpec::from_value).collect()
    }
}

/// A validated buildfile.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<String, TaskConfig>,
    /// Task names, every task after all of its task dependencies.
    order: Vec<String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        task: BTreeMap<String, TaskConfig>,
        order: Vec<String>,
    ) -> Self {
        Self { config, task, order }
    }

    pub fn registration_order(&self) -> &[String] {
        &self.order
    }
}
