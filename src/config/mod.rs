//! Configuration for hostship.
//!
//! hostship has two kinds of configuration:
//!
//! - **Build identity** ([`Channel`], [`current_version`]): baked in at compile
//!   time and used to pick the release stream and to answer `hostship -v`.
//! - **Runtime settings** ([`ConfigSource`]): looked up by key from the
//!   process environment and the local `.env` file through a
//!   [`LayeredConfig`]. Components receive a source as a dependency instead
//!   of reading the environment themselves.
//!
//! | Key                    | Used by            | Purpose                            |
//! |------------------------|--------------------|------------------------------------|
//! | `DEPLOY_URL`           | hot-reload listener| capability callback URL            |
//! | `HOSTSHIP_RELEASE_URL` | self-update        | override of the release server URL |

mod channel;
pub mod source;

pub use channel::{Channel, current_version, version_line};
pub use source::{ConfigSource, EnvFile, LayeredConfig, ProcessEnv, StaticConfig, parse_env};
