//! Loads one `AgentConfig` (or a directory of them) from YAML. Filesystem
//! discovery of *which* files to load — and watching them for changes — is
//! an external collaborator's job; this module only parses a given path.

use std::path::Path;

use super::AgentConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Parses a single agent config YAML file.
pub fn load_agent_config(path: impl AsRef<Path>) -> Result<AgentConfig, LoaderError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| LoaderError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_yaml::from_str(&text).map_err(|e| LoaderError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Parses every `*.yaml`/`*.yml` file directly under `dir` as an agent
/// config. A file that fails to parse is skipped with a warning, mirroring
/// the MCP registry's "invalid individual entries are skipped" contract
/// rather than aborting discovery of the rest.
pub fn load_agent_configs_dir(dir: impl AsRef<Path>) -> std::io::Result<Vec<AgentConfig>> {
    let mut configs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false);
        if !is_yaml {
            continue;
        }
        match load_agent_config(&path) {
            Ok(cfg) => configs.push(cfg),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping invalid agent config"),
        }
    }
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_valid_agent_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translator.yaml");
        std::fs::write(
            &path,
            r#"
name: translator
provider: mock
model: mock-model
engine: native
instruction_template: "Translate the user's text."
"#,
        )
        .unwrap();
        let cfg = load_agent_config(&path).unwrap();
        assert_eq!(cfg.name, "translator");
        assert_eq!(cfg.temperature, 0.2);
        assert_eq!(cfg.max_tool_rounds, 10);
    }

    #[test]
    fn directory_load_skips_invalid_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("good.yaml"),
            "name: good\nprovider: mock\nmodel: mock-model\nengine: native\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "not: [valid, agent, config").unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "irrelevant").unwrap();
        let configs = load_agent_configs_dir(dir.path()).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].name, "good");
    }
}
