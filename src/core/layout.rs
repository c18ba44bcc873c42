//! Directory layout and precedence tiers.
//!
//! ```text
//! <root>/base/shared.yml
//! <root>/base/<app>.yml
//! <root>/<env>/shared.yml
//! <root>/<env>/<app>.yml
//! <root>/target-overrides/<target>/<env-or-base>/shared.yml
//! <root>/target-overrides/<target>/<env-or-base>/<app>.yml
//! ```

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::core::constants::{BASE_DIR, BASE_SEGMENT, EXT, SHARED_STEM, TARGET_DIR};
use crate::core::types::{AppName, EnvName, TargetName};

/// Precedence tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    GlobalShared,
    BaseApp,
    EnvShared,
    EnvApp,
    TargetShared,
    TargetApp,
}

impl Tier {
    pub fn name(&self) -> &'static str {
        match self {
            Tier::GlobalShared => "global-shared",
            Tier::BaseApp => "base-app",
            Tier::EnvShared => "env-shared",
            Tier::EnvApp => "env-app",
            Tier::TargetShared => "target-shared",
            Tier::TargetApp => "target-app",
        }
    }
}

/// A candidate document path at one tier. May not exist on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub tier: Tier,
    pub path: PathBuf,
}

/// Which documents a query reads, and where a write lands.
///
/// Empty strings are treated as absent so CLI flags can be passed through
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    root: PathBuf,
    app: Option<AppName>,
    env: Option<EnvName>,
    target: Option<TargetName>,
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|v| !v.is_empty()).map(str::to_string)
}

impl QueryContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn with_app(mut self, app: Option<&str>) -> Self {
        self.app = non_empty(app);
        self
    }

    pub fn with_env(mut self, env: Option<&str>) -> Self {
        self.env = non_empty(env);
        self
    }

    pub fn with_target(mut self, target: Option<&str>) -> Self {
        self.target = non_empty(target);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }

    pub fn env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Environment segment for target lookups: the env, or `base` without one.
    pub fn target_env(&self) -> &str {
        self.env.as_deref().unwrap_or(BASE_SEGMENT)
    }

    /// Candidate documents in precedence order, lowest first.
    pub fn locations(&self) -> Vec<Location> {
        let mut out = Vec::with_capacity(6);
        let base = self.root.join(BASE_DIR);

        out.push(Location {
            tier: Tier::GlobalShared,
            path: document(&base, SHARED_STEM),
        });
        if let Some(app) = self.app() {
            out.push(Location {
                tier: Tier::BaseApp,
                path: document(&base, app),
            });
        }

        if let Some(env) = self.env() {
            let dir = self.root.join(env);
            out.push(Location {
                tier: Tier::EnvShared,
                path: document(&dir, SHARED_STEM),
            });
            if let Some(app) = self.app() {
                out.push(Location {
                    tier: Tier::EnvApp,
                    path: document(&dir, app),
                });
            }
        }

        if let Some(target) = self.target() {
            let dir = self.root.join(TARGET_DIR).join(target).join(self.target_env());
            out.push(Location {
                tier: Tier::TargetShared,
                path: document(&dir, SHARED_STEM),
            });
            if let Some(app) = self.app() {
                out.push(Location {
                    tier: Tier::TargetApp,
                    path: document(&dir, app),
                });
            }
        }

        out
    }

    /// The single document a `set` writes to: the most specific tier the
    /// context names.
    pub fn write_location(&self) -> Location {
        let (dir, specific) = if let Some(target) = self.target() {
            (
                self.root.join(TARGET_DIR).join(target).join(self.target_env()),
                (Tier::TargetShared, Tier::TargetApp),
            )
        } else if let Some(env) = self.env() {
            (self.root.join(env), (Tier::EnvShared, Tier::EnvApp))
        } else {
            (self.root.join(BASE_DIR), (Tier::GlobalShared, Tier::BaseApp))
        };

        match self.app() {
            Some(app) => Location {
                tier: specific.1,
                path: document(&dir, app),
            },
            None => Location {
                tier: specific.0,
                path: document(&dir, SHARED_STEM),
            },
        }
    }
}

fn document(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{}.{}", stem, EXT))
}

/// Where a document lives in the tree, for recipient reporting and filters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    Global,
    Env(EnvName),
    Target { target: TargetName, env: EnvName },
    Other(String),
}

impl Scope {
    /// Classify `path` relative to `root`.
    pub fn classify(root: &Path, path: &Path) -> Scope {
        let rel = path.strip_prefix(root).unwrap_or(path);
        let dirs: Vec<String> = rel
            .parent()
            .map(|p| {
                p.components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        match dirs.as_slice() {
            [] => Scope::Global,
            [d] if d == BASE_DIR => Scope::Global,
            [t, target, env] if t == TARGET_DIR => Scope::Target {
                target: target.clone(),
                env: env.clone(),
            },
            [d] if d != TARGET_DIR => Scope::Env(d.clone()),
            other => Scope::Other(other.join("/")),
        }
    }

    /// Whether this scope belongs to environment `filter`.
    ///
    /// `base` selects global documents; any other name selects that
    /// environment's directory and every target override for it.
    pub fn matches_env(&self, filter: &str) -> bool {
        match self {
            Scope::Global => filter == BASE_SEGMENT,
            Scope::Env(env) => env == filter,
            Scope::Target { env, .. } => env == filter,
            Scope::Other(_) => false,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str(BASE_SEGMENT),
            Scope::Env(env) => f.write_str(env),
            Scope::Target { target, env } => write!(f, "target:{}/{}", target, env),
            Scope::Other(dir) => f.write_str(dir),
        }
    }
}
