//! Ambient configuration: the editor-resolution collaborator. Yields a
//! default editor name and resolves a name to an executable command line.
//! Grounded on `code-common`'s `cli` config-file layering (`serde` +
//! `toml`, env-var override path), scaled down to the one setting this
//! tool needs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// `~/.agency/config.toml`, or the path named by `AGENCY_CONFIG`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_editor: Option<String>,
    /// Named editor -> argv template. `{path}` is substituted with the
    /// worktree path; if the template has no `{path}` token the path is
    /// appended as the final argument.
    #[serde(default)]
    pub editors: BTreeMap<String, Vec<String>>,
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AGENCY_CONFIG") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::home_dir().map(|home| home.join(".agency").join("config.toml"))
}

/// Load the config file, tolerating its absence: an unreadable or
/// missing file is not an error, it just yields defaults. A present but
/// unparseable file IS an error, since that is very likely user typo we
/// want surfaced rather than silently ignored.
pub fn load() -> anyhow::Result<Config> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(anyhow::anyhow!("reading {}: {e}", path.display())),
    };
    toml::from_str(&contents).map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))
}

/// Resolve the editor command line to spawn for `path`, honoring
/// precedence: explicit `--editor` name > config `default_editor` >
/// `$EDITOR` > `"vi"`.
pub fn resolve_editor_command(config: &Config, explicit: Option<&str>, path: &Path) -> Vec<String> {
    let name = explicit
        .map(str::to_string)
        .or_else(|| config.default_editor.clone())
        .or_else(|| std::env::var("EDITOR").ok())
        .unwrap_or_else(|| "vi".to_string());

    if let Some(template) = config.editors.get(&name) {
        return substitute_path(template, path);
    }

    vec![name, path.display().to_string()]
}

fn substitute_path(template: &[String], path: &Path) -> Vec<String> {
    let rendered = path.display().to_string();
    let mut has_token = false;
    let mut argv: Vec<String> = template
        .iter()
        .map(|arg| {
            if arg.contains("{path}") {
                has_token = true;
                arg.replace("{path}", &rendered)
            } else {
                arg.clone()
            }
        })
        .collect();
    if !has_token {
        argv.push(rendered);
    }
    argv
}
