//! Global constants used throughout the hostship codebase.
//!
//! This module contains well-known paths, remote endpoints, timeouts and
//! other values that are shared between the self-update engine, the
//! hot-reload listener and the CLI commands. Defining them centrally keeps
//! the wire contract with the release server and the service unit in one
//! place.

use std::time::Duration;

/// Name of the binary as published in release archives.
pub const BINARY_NAME: &str = "hostship";

/// Base URL of the release server. Metadata and archives live under
/// `{RELEASE_BASE_URL}/{channel}/`.
pub const RELEASE_BASE_URL: &str = "https://cli.hostship.com";

/// Configuration key that overrides [`RELEASE_BASE_URL`].
pub const RELEASE_URL_KEY: &str = "HOSTSHIP_RELEASE_URL";

/// Name of the release metadata document inside a channel.
pub const RELEASE_METADATA_FILE: &str = "metadata.json";

/// Suffix appended to the running executable's path to form the backup path.
pub const BACKUP_SUFFIX: &str = ".old";

/// File name of the staged executable inside the staging directory.
pub const STAGED_BINARY_NAME: &str = "hostship.new";

/// Flag passed to a freshly installed binary to prove that it starts.
pub const VERSION_QUERY_FLAG: &str = "-v";

/// Timeout for running the version query against a new binary.
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the stack definition, relative to the working directory.
pub const STACK_DEFINITION_PATH: &str = "compose.json";

/// Local environment file holding the deploy capability URL.
pub const ENV_FILE_PATH: &str = ".env";

/// Key under which the capability callback URL is stored.
pub const DEPLOY_URL_KEY: &str = "DEPLOY_URL";

/// Host used in generated deploy URLs (the default docker bridge gateway,
/// reachable from inside containers on the same host).
pub const DEPLOY_URL_HOST: &str = "172.17.0.1";

/// Compose project name used for every stack operation.
pub const PROJECT_NAME: &str = "hostship";

/// Top-level key of the stack definition that lists services.
pub const SERVICES_KEY: &str = "services";

/// Dotted path to the URL the stack definition is refreshed from.
pub const METADATA_URL_KEY: &str = "x-metadata.url";

/// Default location of the stack definition fetched by `hostship setup`.
pub const DEFAULT_COMPOSE_URL: &str = "https://cli.plark.com/compose.json";

/// Port the hot-reload listener binds to.
pub const LISTENER_PORT: u16 = 8080;

/// First path segment of the update trigger endpoint.
pub const UPDATE_ROUTE: &str = "update";

/// Deadline for draining in-flight requests once shutdown is requested.
pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for outbound HTTP requests (metadata, archives, stack definitions).
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for `docker compose pull`. Image pulls can be slow on small hosts.
pub const DOCKER_PULL_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for `docker compose up -d`.
pub const DOCKER_UP_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for short docker probes such as `docker compose version`.
pub const DOCKER_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the systemd unit managed by `hostship systemd`.
pub const SERVICE_NAME: &str = "hostship";

/// Location the systemd unit file is installed to.
pub const UNIT_FILE_PATH: &str = "/etc/systemd/system/hostship.service";

/// Script used to install Docker when it is missing.
pub const DOCKER_INSTALL_SCRIPT: &str = "curl -sSL https://get.docker.com | sh";
