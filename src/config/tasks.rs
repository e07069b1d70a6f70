// src/config/tasks.rs

use std::collections::HashMap;

use tracing::debug;

use crate::config::model::{ConfigFile, DepSpec};
use crate::dag::{Dependency, Registry, TaskHandle};
use crate::errors::{BuildError, Result};
use crate::exec::TaskContext;

/// Register one command task per `[task.<name>]` section.
///
/// Each body runs the task's `cmd` through the command runner, in strict
/// mode unless `check = false`.
pub fn build_registry(cfg: &ConfigFile) -> Result<Registry> {
    let mut registry = Registry::new();
    let mut handles: HashMap<&str, TaskHandle> = HashMap::new();

    for name in cfg.registration_order() {
        let task = cfg
            .task
            .get(name)
            .ok_or_else(|| BuildError::Config(format!("task '{}' vanished from buildfile", name)))?;

        let deps = task
            .dep_specs()
            .into_iter()
            .map(|spec| match spec {
                DepSpec::File(path) => Ok(Dependency::File(path)),
                DepSpec::Task(dep) => handles
                    .get(dep.as_str())
                    .map(Dependency::from)
                    .ok_or_else(|| {
                        BuildError::Config(format!("task '{}' depends on unregistered task '{}'", name, dep))
                    }),
                DepSpec::Unsupported(found) => Ok(Dependency::Unsupported(found)),
            })
            .collect::<Result<Vec<_>>>()?;

        let argv = task.cmd.to_argv();
        let check = task.check;
        let handle = registry.task(name.clone(), deps, move |ctx: TaskContext| {
            let argv = argv.clone();
            async move {
                if check {
                    ctx.run(&argv).await?;
                } else {
                    ctx.run_unchecked(&argv).await?;
                }
                anyhow::Ok(())
            }
        });
        if task.force {
            handle.mark_force();
        }

        debug!(task = %name, deps = handle.dependencies().len(), "registered task from buildfile");
        handles.insert(name.as_str(), handle);
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::RawConfigFile;

    #[test]
    fn registers_tasks_with_resolved_dependencies() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[task.link]
cmd = ["cc", "-o", "app", "main.o"]
deps = [{ task = "compile" }, "main.o", 7]
force = true

[task.compile]
cmd = "cc -c main.c"
deps = ["main.c"]
"#,
        )
        .unwrap();
        let cfg = ConfigFile::try_from(raw).unwrap();
        let registry = build_registry(&cfg).unwrap();

        let names: Vec<&str> = registry.tasks().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["compile", "link"]);

        let link = registry.get("link").unwrap();
        assert!(link.is_forced());
        let deps = link.dependencies();
        assert_eq!(deps[0].as_task().map(|t| t.name()), Some("compile"));
        assert_eq!(deps[1].as_file(), Some("main.o"));
        assert!(matches!(&deps[2], Dependency::Unsupported(found) if found.contains("integer")));
    }
}
