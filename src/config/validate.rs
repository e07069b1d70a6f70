// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, DepSpec, RawConfigFile};
use crate::errors::{BuildError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        validate_commands(&raw)?;
        validate_task_dependencies(&raw)?;
        let order = registration_order(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.task, order))
    }
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(BuildError::Config(
            "buildfile must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.is_empty() {
            return Err(BuildError::Config(format!("task '{}' has an empty `cmd`", name)));
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.dep_specs() {
            let DepSpec::Task(dep) = dep else { continue };
            if !cfg.task.contains_key(&dep) {
                return Err(BuildError::Config(format!(
                    "task '{}' has unknown dependency '{}' in `deps`",
                    name, dep
                )));
            }
            if &dep == name {
                return Err(BuildError::Config(format!(
                    "task '{}' cannot depend on itself in `deps`",
                    name
                )));
            }
        }
    }
    Ok(())
}

/// Order tasks so every task comes after its task dependencies.
///
/// Task handles must exist before a dependent is registered, so a cyclic
/// buildfile cannot be turned into a registry at all.
fn registration_order(cfg: &RawConfigFile) -> Result<Vec<String>> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.deps.iter() {
            if let DepSpec::Task(_) = DepSpec::from_value(dep) {
                if let Some(toml::Value::String(dep)) = dep.get("task") {
                    graph.add_edge(dep.as_str(), name.as_str(), ());
                }
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(BuildError::Config(format!(
            "cycle detected in task dependencies involving task '{}'",
            cycle.node_id()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(src)?;
        ConfigFile::try_from(raw)
    }

    #[test]
    fn orders_dependencies_first() {
        let cfg = parse(
            r#"
[task.a_link]
cmd = "true"
deps = [{ task = "z_compile" }]

[task.z_compile]
cmd = "true"
deps = [{ task = "m_gen" }, "main.c"]

[task.m_gen]
cmd = "true"
"#,
        )
        .unwrap();

        let order = cfg.registration_order();
        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert_eq!(order.len(), 3);
        assert!(pos("m_gen") < pos("z_compile"));
        assert!(pos("z_compile") < pos("a_link"));
    }

    #[test]
    fn unknown_dependency_is_config_error() {
        match parse(
            r#"
[task.A]
cmd = "echo A"
deps = [{ task = "NonExistent" }]
"#,
        ) {
            Err(BuildError::Config(msg)) => {
                assert!(msg.contains("unknown dependency"));
                assert!(msg.contains("NonExistent"));
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn self_dependency_is_config_error() {
        match parse(
            r#"
[task.A]
cmd = "echo A"
deps = [{ task = "A" }]
"#,
        ) {
            Err(BuildError::Config(msg)) => assert!(msg.contains("itself")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn cycle_is_config_error() {
        match parse(
            r#"
[task.A]
cmd = "echo A"
deps = [{ task = "B" }]

[task.B]
cmd = "echo B"
deps = [{ task = "A" }]
"#,
        ) {
            Err(BuildError::Config(msg)) => {
                assert!(msg.contains("cycle detected"));
                assert!(msg.contains('A') || msg.contains('B'));
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn empty_buildfile_and_empty_command_are_rejected() {
        assert!(matches!(parse(""), Err(BuildError::Config(_))));
        assert!(matches!(
            parse("[task.a]\ncmd = []\n"),
            Err(BuildError::Config(msg)) if msg.contains("empty")
        ));
    }
}
