// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup into an
//! immutable [`GatewayConfig`]. Any error here is fatal: the gateway never
//! binds its listener with a half-valid configuration.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | HMAC secret used to verify bearer tokens | Required |
//! | `PUBLIC_PATH_PREFIXES` | Comma-separated prefixes that never need a token | `/auth` |
//! | `SECURED_PATH_PREFIXES` | Comma-separated prefixes that always need a token | `/users,/orders,/notifications` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance for `exp`/`nbf` | `0` |
//! | `STRIP_IDENTITY_HEADERS` | Drop client `X-Username`/`X-Role` on unauthenticated paths | `false` |
//! | `GATEWAY_ROUTES` | Comma-separated `prefix=url` upstream table | local services on 8081-8084 |
//! | `UPSTREAM_TIMEOUT_SECS` | Upstream request timeout | `30` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | Unset (plain HTTP) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `smart_delivery_gateway=info,tower_http=info` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use url::Url;

use crate::auth::{PathPolicy, SigningKey};
use crate::gateway::{Route, RouteTable};

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const PUBLIC_PATH_PREFIXES_ENV: &str = "PUBLIC_PATH_PREFIXES";
pub const SECURED_PATH_PREFIXES_ENV: &str = "SECURED_PATH_PREFIXES";
pub const JWT_LEEWAY_SECS_ENV: &str = "JWT_LEEWAY_SECS";
pub const STRIP_IDENTITY_HEADERS_ENV: &str = "STRIP_IDENTITY_HEADERS";
pub const GATEWAY_ROUTES_ENV: &str = "GATEWAY_ROUTES";
pub const UPSTREAM_TIMEOUT_SECS_ENV: &str = "UPSTREAM_TIMEOUT_SECS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_PUBLIC_PREFIXES: &str = "/auth";
const DEFAULT_SECURED_PREFIXES: &str = "/users,/orders,/notifications";
const DEFAULT_ROUTES: &str = "/auth=http://localhost:8081,\
/users=http://localhost:8082,\
/orders=http://localhost:8083,\
/notifications=http://localhost:8084";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Fatal startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set and non-blank")]
    MissingSigningKey,
    #[error("JWT_SECRET is {len} bytes; at least {min} are required")]
    WeakSigningKey { len: usize, min: usize },
    #[error("SECURED_PATH_PREFIXES is empty; every request would bypass authentication")]
    NoSecuredPrefixes,
    #[error("path prefix {0:?} must start with '/'")]
    InvalidPrefix(String),
    #[error("invalid route {0:?} (expected prefix=url)")]
    InvalidRoute(String),
    #[error("invalid upstream url {url:?}: {source}")]
    InvalidUpstream {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{var} has invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// PEM files for TLS termination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Complete gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub signing_key: SigningKey,
    pub path_policy: PathPolicy,
    pub leeway_secs: u64,
    pub strip_identity_headers: bool,
    pub routes: RouteTable,
    pub upstream_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl GatewayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(JWT_SECRET_ENV).ok_or(ConfigError::MissingSigningKey)?;
        let signing_key = SigningKey::from_secret(&secret)?;

        let public = parse_prefixes(
            &lookup(PUBLIC_PATH_PREFIXES_ENV).unwrap_or_else(|| DEFAULT_PUBLIC_PREFIXES.into()),
        )?;
        let secured = parse_prefixes(
            &lookup(SECURED_PATH_PREFIXES_ENV).unwrap_or_else(|| DEFAULT_SECURED_PREFIXES.into()),
        )?;
        if secured.is_empty() {
            return Err(ConfigError::NoSecuredPrefixes);
        }

        let routes = parse_routes(
            &lookup(GATEWAY_ROUTES_ENV).unwrap_or_else(|| DEFAULT_ROUTES.into()),
        )?;

        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.into());
        let ip: IpAddr = host.parse().map_err(|_| ConfigError::InvalidValue {
            var: HOST_ENV,
            value: host.clone(),
        })?;
        let port = parse_number(&lookup, PORT_ENV, DEFAULT_PORT)?;

        let tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: LOG_FORMAT_ENV,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            signing_key,
            path_policy: PathPolicy::new(public, secured),
            leeway_secs: parse_number(&lookup, JWT_LEEWAY_SECS_ENV, 0)?,
            strip_identity_headers: parse_bool(&lookup, STRIP_IDENTITY_HEADERS_ENV)?,
            routes,
            upstream_timeout_secs: parse_number(
                &lookup,
                UPSTREAM_TIMEOUT_SECS_ENV,
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?,
            bind_addr: SocketAddr::new(ip, port),
            tls,
            log_format,
        })
    }
}

fn parse_prefixes(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            if p.starts_with('/') {
                Ok(p.to_string())
            } else {
                Err(ConfigError::InvalidPrefix(p.to_string()))
            }
        })
        .collect()
}

fn parse_routes(raw: &str) -> Result<RouteTable, ConfigError> {
    let routes = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (prefix, url) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidRoute(entry.to_string()))?;
            let prefix = prefix.trim();
            if !prefix.starts_with('/') {
                return Err(ConfigError::InvalidPrefix(prefix.to_string()));
            }
            let url = url.trim();
            let upstream = Url::parse(url).map_err(|source| ConfigError::InvalidUpstream {
                url: url.to_string(),
                source,
            })?;
            if !matches!(upstream.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidRoute(entry.to_string()));
            }
            Ok(Route::new(prefix, upstream))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RouteTable::new(routes))
}

fn parse_number<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).as_deref().map(str::trim) {
        None | Some("") | Some("false") | Some("0") => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some(other) => Err(ConfigError::InvalidValue {
            var,
            value: other.to_string(),
        }),
    }
}
