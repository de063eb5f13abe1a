use anyhow::{bail, Context, Result};
use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::paths::resolve_dir;

pub const LOCAL_CONFIG_FILE: &str = "watchtest.toml";

const DEFAULT_WATCH: &str = "*.go";
const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// `*` stops at `/`, so `*.go` only sees top-level files and `**/*.go`
/// recurses.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_watch")]
    pub watch: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    pub name: String,
    pub run: String,
    #[serde(default)]
    pub kind: CommandKind,
    #[serde(default)]
    pub watch: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Runs at startup, from `test`, and on matching changes.
    #[default]
    Test,
    /// Runs only on matching changes.
    Analysis,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_watch() -> String {
    DEFAULT_WATCH.to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: default_root(),
            watch: default_watch(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            commands: vec![
                CommandConfig {
                    name: "test".to_string(),
                    run: "go test".to_string(),
                    kind: CommandKind::Test,
                    watch: None,
                },
                CommandConfig {
                    name: "vet".to_string(),
                    run: "go vet".to_string(),
                    kind: CommandKind::Analysis,
                    watch: None,
                },
            ],
        }
    }
}

/// One fixed command and the files whose change re-runs it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub name: String,
    pub command: String,
    pub pattern: Pattern,
    pub kind: CommandKind,
    pub dir: PathBuf,
}

impl CommandSpec {
    /// `relative` is a path relative to the watched root.
    pub fn matches(&self, relative: &Path) -> bool {
        self.pattern.matches_path_with(relative, MATCH_OPTIONS)
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub root: PathBuf,
    pub debounce: Duration,
    pub commands: Vec<CommandSpec>,
    /// File the config came from; `None` for built-in defaults.
    pub source: Option<PathBuf>,
}

impl ResolvedConfig {
    pub fn test_commands(&self) -> Vec<CommandSpec> {
        self.commands
            .iter()
            .filter(|c| c.kind == CommandKind::Test)
            .cloned()
            .collect()
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", "watchtest")
        .context("could not determine config directory")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Picks the config: explicit path, then `./watchtest.toml`, then the user
/// config file, then built-in defaults rooted at `cwd`.
pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<ResolvedConfig> {
    if let Some(path) = explicit {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        return load_config(&path);
    }

    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.exists() {
        return load_config(&local);
    }

    match default_config_path() {
        Ok(user) if user.exists() => return load_config(&user),
        Ok(user) => debug!(path = %user.display(), "no user config"),
        Err(e) => debug!(error = %e, "skipping user config"),
    }

    debug!("using built-in defaults");
    resolve(Config::default(), cwd)
}

pub fn load_config(path: &Path) -> Result<ResolvedConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    let base = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut config = parse_config(&contents, base)
        .with_context(|| format!("invalid config {}", path.display()))?;
    config.source = Some(path.to_path_buf());
    Ok(config)
}

pub fn parse_config(contents: &str, base: &Path) -> Result<ResolvedConfig> {
    let raw: Config = toml::from_str(contents).context("failed to parse config TOML")?;
    resolve(raw, base)
}

fn resolve(raw: Config, base: &Path) -> Result<ResolvedConfig> {
    if raw.commands.is_empty() {
        bail!("no commands configured\nAdd at least one [[commands]] entry.");
    }

    let root = resolve_dir(&raw.root, base);

    let mut commands = Vec::new();
    let mut names = HashSet::new();

    for cmd in &raw.commands {
        let name = cmd.name.trim();
        if name.is_empty() {
            bail!("command has empty name (run: {:?})", cmd.run);
        }
        if !names.insert(name.to_string()) {
            bail!("duplicate command name: {}", name);
        }
        if cmd.run.trim().is_empty() {
            bail!("command {} has an empty `run`", name);
        }

        let glob = cmd.watch.as_deref().unwrap_or(&raw.watch);
        let pattern = Pattern::new(glob)
            .with_context(|| format!("invalid watch glob {:?} for command {}", glob, name))?;

        commands.push(CommandSpec {
            name: name.to_string(),
            command: cmd.run.clone(),
            pattern,
            kind: cmd.kind,
            dir: root.clone(),
        });
    }

    let result = ResolvedConfig {
        root,
        debounce: Duration::from_millis(raw.debounce_ms),
        commands,
        source: None,
    };

    debug_assert!(
        result.commands.iter().all(|c| !c.command.trim().is_empty()),
        "command strings must be non-empty"
    );

    Ok(result)
}
