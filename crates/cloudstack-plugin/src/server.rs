//! Serving loop
//!
//! `serve` is the whole lifecycle: handshake checks, listener, announcement,
//! then accept host connections until the host asks us to shut down.

use crate::error::Result;
use crate::handshake::{self, Handshake};
use crate::listener::{PluginListener, PluginStream};
use crate::provider::Provider;
use crate::rpc;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Notify;

/// Options for [`serve`]
#[derive(Debug, Clone, Default)]
pub struct ServeOpts {
    /// Skip the magic cookie and print reattach instructions instead of the
    /// handshake line, so the provider can run under a debugger
    pub debug: bool,

    /// Registry address used in the reattach instructions
    pub provider_address: String,
}

/// Run the provider until the host shuts it down.
pub async fn serve<P: Provider + 'static>(provider: Arc<P>, opts: ServeOpts) -> Result<()> {
    if !opts.debug {
        handshake::check_magic_cookie(std::env::var(handshake::MAGIC_COOKIE_KEY).ok().as_deref())?;
    }

    let app_version = handshake::negotiate_version(
        std::env::var(handshake::ENV_PROTOCOL_VERSIONS).ok().as_deref(),
        provider.protocol_versions(),
    )?;

    let listener = PluginListener::bind().await?;
    let handshake = Handshake::new(app_version, listener.network(), listener.address()?);

    tracing::info!(
        "Serving provider {} on {} {} (protocol {})",
        provider.name(),
        handshake.network,
        handshake.address,
        app_version
    );

    {
        let mut stdout = std::io::stdout().lock();
        if opts.debug {
            handshake.announce_debug(&mut stdout, &opts.provider_address)?;
        } else {
            handshake.announce(&mut stdout)?;
        }
    }

    PluginServer::new(provider).run(listener).await
}

/// Accept loop over an already bound listener
pub struct PluginServer<P> {
    provider: Arc<P>,
    shutdown: Arc<Notify>,
}

impl<P: Provider + 'static> PluginServer<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Handle that ends `run` when notified
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    pub async fn run(self, listener: PluginListener) -> Result<()> {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let stream = accepted?;
                    let provider = self.provider.clone();
                    let shutdown = self.shutdown.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(provider.as_ref(), stream, &shutdown).await {
                            tracing::warn!("Connection closed with error: {}", e);
                        }
                    });
                }
                _ = self.shutdown.notified() => {
                    tracing::info!("Shutdown requested by host");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn handle_connection<P: Provider + ?Sized>(
    provider: &P,
    stream: Box<dyn PluginStream>,
    shutdown: &Notify,
) -> Result<()> {
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let dispatch = rpc::dispatch_line(provider, &line).await;
        let mut encoded = serde_json::to_vec(&dispatch.response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;

        if dispatch.shutdown {
            shutdown.notify_one();
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PluginError;
    use crate::provider::{Attribute, AttributeType, Diagnostic, ProviderSchema};
    use crate::rpc::Response;
    use async_trait::async_trait;
    use serde_json::{Map, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpStream;

    #[derive(Default)]
    struct CountingProvider {
        configured: AtomicUsize,
        stopped: AtomicUsize,
    }

    #[async_trait]
    impl Provider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn schema(&self) -> ProviderSchema {
            ProviderSchema {
                version: 0,
                attributes: vec![Attribute::required("endpoint", AttributeType::String, "URL")],
            }
        }

        async fn configure(&self, config: Map<String, Value>) -> Vec<Diagnostic> {
            self.configured.fetch_add(1, Ordering::SeqCst);
            if config.contains_key("endpoint") {
                Vec::new()
            } else {
                vec![Diagnostic::error("endpoint is required").with_attribute("endpoint")]
            }
        }

        async fn stop(&self) -> crate::error::Result<()> {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            Err(PluginError::Provider("nothing to stop".to_string()))
        }
    }

    struct Client {
        reader: tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
        writer: tokio::net::tcp::OwnedWriteHalf,
    }

    impl Client {
        async fn connect(address: &str) -> Self {
            let (reader, writer) = TcpStream::connect(address).await.unwrap().into_split();
            Self {
                reader: BufReader::new(reader).lines(),
                writer,
            }
        }

        async fn call(&mut self, line: &str) -> Response {
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\n").await.unwrap();
            let reply = self.reader.next_line().await.unwrap().unwrap();
            serde_json::from_str(&reply).unwrap()
        }
    }

    async fn start() -> (
        Arc<CountingProvider>,
        String,
        tokio::task::JoinHandle<Result<()>>,
    ) {
        let provider = Arc::new(CountingProvider::default());
        let listener = PluginListener::bind_tcp(20000, 25000).await.unwrap();
        let address = listener.address().unwrap();
        let server = PluginServer::new(provider.clone());
        let handle = tokio::spawn(server.run(listener));
        (provider, address, handle)
    }

    #[tokio::test]
    async fn test_schema_and_configure() {
        let (provider, address, handle) = start().await;
        let mut client = Client::connect(&address).await;

        let schema = client.call(r#"{"id":1,"method":"GetProviderSchema"}"#).await;
        assert_eq!(schema.id, Some(1));
        let result = schema.result.unwrap();
        assert_eq!(result["provider"]["attributes"][0]["name"], "endpoint");

        let configured = client
            .call(r#"{"id":2,"method":"ConfigureProvider","params":{"config":{}}}"#)
            .await;
        let result = configured.result.unwrap();
        let diagnostics = &result["diagnostics"];
        assert_eq!(diagnostics[0]["severity"], "error");
        assert_eq!(diagnostics[0]["attribute"], "endpoint");
        assert_eq!(provider.configured.load(Ordering::SeqCst), 1);

        let shutdown = client.call(r#"{"id":3,"method":"Shutdown"}"#).await;
        assert!(shutdown.error.is_none());

        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_errors_keep_connection_open() {
        let (provider, address, handle) = start().await;
        let mut client = Client::connect(&address).await;

        let garbage = client.call("not json").await;
        assert!(garbage.error.unwrap().message.starts_with("invalid request"));

        let unknown = client.call(r#"{"id":7,"method":"ApplyResourceChange"}"#).await;
        assert_eq!(unknown.id, Some(7));
        assert!(unknown.error.unwrap().message.contains("ApplyResourceChange"));

        let bad_config = client
            .call(r#"{"id":8,"method":"ConfigureProvider","params":{"config":[1]}}"#)
            .await;
        assert!(bad_config.error.is_some());
        assert_eq!(provider.configured.load(Ordering::SeqCst), 0);

        let stop = client.call(r#"{"id":9,"method":"StopProvider"}"#).await;
        assert_eq!(stop.error.unwrap().message, "Provider error: nothing to stop");
        assert_eq!(provider.stopped.load(Ordering::SeqCst), 1);

        client.call(r#"{"id":10,"method":"Shutdown"}"#).await;
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_handle_stops_server() {
        let provider = Arc::new(CountingProvider::default());
        let listener = PluginListener::bind_tcp(20000, 25000).await.unwrap();
        let server = PluginServer::new(provider);
        let shutdown = server.shutdown_handle();

        let handle = tokio::spawn(server.run(listener));
        shutdown.notify_one();

        handle.await.unwrap().unwrap();
    }
}
