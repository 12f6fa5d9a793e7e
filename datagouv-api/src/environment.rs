use std::fmt;

/// Environment variable selecting the upstream deployment (`demo` or `prod`).
pub const ENVIRONMENT_VAR: &str = "DATAGOUV_ENV";

/// Named data.gouv.fr deployment targets
///
/// Exactly one environment is chosen at startup and never changes for the
/// lifetime of the process. Every client derives its base URLs from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    /// Pre-production platform at `demo.data.gouv.fr`
    Demo,
    /// Public platform at `www.data.gouv.fr`
    #[default]
    Production,
}

struct Targets {
    catalog_api: &'static str,
    site: &'static str,
    tabular_api: &'static str,
    metrics_api: &'static str,
}

const DEMO: Targets = Targets {
    catalog_api: "https://demo.data.gouv.fr/api",
    site: "https://demo.data.gouv.fr",
    tabular_api: "https://tabular-api.preprod.data.gouv.fr/api",
    // The metrics API has no demo deployment.
    metrics_api: "https://metric-api.data.gouv.fr/api",
};

const PRODUCTION: Targets = Targets {
    catalog_api: "https://www.data.gouv.fr/api",
    site: "https://www.data.gouv.fr",
    tabular_api: "https://tabular-api.data.gouv.fr/api",
    metrics_api: "https://metric-api.data.gouv.fr/api",
};

impl Environment {
    /// Every supported environment.
    pub const ALL: [Environment; 2] = [Environment::Demo, Environment::Production];

    /// Resolve a configured environment name
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// `demo` selects [`Environment::Demo`]; `prod` and `production` select
    /// [`Environment::Production`]. Absent, empty or unrecognized values fall
    /// back to production instead of failing.
    ///
    /// ```rust
    /// use datagouv_api::Environment;
    ///
    /// assert_eq!(Environment::resolve(Some(" DEMO ")), Environment::Demo);
    /// assert_eq!(Environment::resolve(Some("staging")), Environment::Production);
    /// assert_eq!(Environment::resolve(None), Environment::Production);
    /// ```
    pub fn resolve(configured: Option<&str>) -> Self {
        let Some(raw) = configured else {
            return Self::default();
        };

        match raw.trim().to_ascii_lowercase().as_str() {
            "demo" => Environment::Demo,
            "prod" | "production" => Environment::Production,
            "" => Self::default(),
            other => {
                tracing::warn!(
                    value = other,
                    fallback = Self::default().name(),
                    "unrecognized {ENVIRONMENT_VAR} value, using default environment"
                );
                Self::default()
            }
        }
    }

    /// Resolve the environment from the `DATAGOUV_ENV` process variable.
    pub fn from_env() -> Self {
        Self::resolve(std::env::var(ENVIRONMENT_VAR).ok().as_deref())
    }

    /// Short symbolic name, as accepted by [`Environment::resolve`].
    pub fn name(&self) -> &'static str {
        match self {
            Environment::Demo => "demo",
            Environment::Production => "prod",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Base URLs for this environment.
    pub fn endpoints(&self) -> Endpoints {
        let targets = match self {
            Environment::Demo => &DEMO,
            Environment::Production => &PRODUCTION,
        };
        Endpoints {
            catalog_api: targets.catalog_api.to_string(),
            site: targets.site.to_string(),
            tabular_api: targets.tabular_api.to_string(),
            metrics_api: targets.metrics_api.to_string(),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base URLs of every upstream service, without trailing slashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Dataset catalog API root; versioned namespaces `1/` and `2/` live below it
    pub catalog_api: String,
    /// Public website root, used to build human-facing dataset links
    pub site: String,
    /// Tabular query API root
    pub tabular_api: String,
    /// Usage metrics API root
    pub metrics_api: String,
}

impl Endpoints {
    pub(crate) fn catalog(&self, path: &str) -> String {
        join(&self.catalog_api, path)
    }

    pub(crate) fn tabular(&self, path: &str) -> String {
        join(&self.tabular_api, path)
    }

    pub(crate) fn metrics(&self, path: &str) -> String {
        join(&self.metrics_api, path)
    }

    /// Public page of a dataset, addressed by slug or id.
    pub fn dataset_page(&self, slug_or_id: &str) -> String {
        join(&self.site, &format!("datasets/{slug_or_id}/"))
    }
}

fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
