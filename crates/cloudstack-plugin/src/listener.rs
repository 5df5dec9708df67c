//! Listener the host connects to after the handshake
//!
//! Unix platforms use a socket inside a private temp directory; everything
//! else listens on a loopback TCP port.

use crate::error::{PluginError, Result};
use crate::handshake::Network;
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;

pub const ENV_MIN_PORT: &str = "PLUGIN_MIN_PORT";
pub const ENV_MAX_PORT: &str = "PLUGIN_MAX_PORT";
pub const ENV_UNIX_SOCKET_DIR: &str = "PLUGIN_UNIX_SOCKET_DIR";

const DEFAULT_MIN_PORT: u16 = 10000;
const DEFAULT_MAX_PORT: u16 = 25000;

/// Bidirectional stream accepted from the host
pub trait PluginStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> PluginStream for T {}

pub enum PluginListener {
    #[cfg(unix)]
    Unix {
        listener: tokio::net::UnixListener,
        path: PathBuf,
        // Removed together with the socket when the listener is dropped
        _dir: tempfile::TempDir,
    },
    Tcp(TcpListener),
}

impl PluginListener {
    /// Bind the platform default listener
    pub async fn bind() -> Result<Self> {
        #[cfg(unix)]
        {
            let dir = std::env::var(ENV_UNIX_SOCKET_DIR).ok().map(PathBuf::from);
            Self::bind_unix(dir)
        }

        #[cfg(not(unix))]
        {
            let (min, max) = port_range_from_env()?;
            Self::bind_tcp(min, max).await
        }
    }

    /// Bind a unix socket in a fresh temp directory (under `parent` when given)
    #[cfg(unix)]
    pub fn bind_unix(parent: Option<PathBuf>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("plugin");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };

        let path = dir.path().join("plugin.sock");
        let listener = tokio::net::UnixListener::bind(&path)?;
        tracing::debug!("Listening on unix socket {}", path.display());

        Ok(PluginListener::Unix {
            listener,
            path,
            _dir: dir,
        })
    }

    /// Bind the first free loopback port in `min..=max`
    pub async fn bind_tcp(min: u16, max: u16) -> Result<Self> {
        if min > max {
            return Err(PluginError::InvalidConfig(format!(
                "{ENV_MIN_PORT} ({min}) is greater than {ENV_MAX_PORT} ({max})"
            )));
        }

        for port in min..=max {
            match TcpListener::bind(("127.0.0.1", port)).await {
                Ok(listener) => {
                    tracing::debug!("Listening on 127.0.0.1:{}", port);
                    return Ok(PluginListener::Tcp(listener));
                }
                Err(e) => tracing::trace!("Port {} unavailable: {}", port, e),
            }
        }

        Err(PluginError::NoFreePort { min, max })
    }

    pub fn network(&self) -> Network {
        match self {
            #[cfg(unix)]
            PluginListener::Unix { .. } => Network::Unix,
            PluginListener::Tcp(_) => Network::Tcp,
        }
    }

    /// Address as announced in the handshake
    pub fn address(&self) -> Result<String> {
        match self {
            #[cfg(unix)]
            PluginListener::Unix { path, .. } => Ok(path.display().to_string()),
            PluginListener::Tcp(listener) => Ok(listener.local_addr()?.to_string()),
        }
    }

    pub async fn accept(&self) -> Result<Box<dyn PluginStream>> {
        match self {
            #[cfg(unix)]
            PluginListener::Unix { listener, .. } => {
                let (stream, _) = listener.accept().await?;
                Ok(Box::new(stream))
            }
            PluginListener::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                tracing::debug!("Accepted connection from {}", peer);
                Ok(Box::new(stream))
            }
        }
    }
}

/// Read `PLUGIN_MIN_PORT` / `PLUGIN_MAX_PORT`, falling back to the defaults
pub fn port_range_from_env() -> Result<(u16, u16)> {
    let read = |name: &str, default: u16| match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|_| PluginError::InvalidConfig(format!("{name} must be a port, got '{raw}'"))),
        Err(_) => Ok(default),
    };

    Ok((
        read(ENV_MIN_PORT, DEFAULT_MIN_PORT)?,
        read(ENV_MAX_PORT, DEFAULT_MAX_PORT)?,
    ))
}
