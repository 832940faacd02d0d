use std::sync::{Arc, LazyLock};

use futures_util::future::join_all;
use tokio::{net::TcpListener, sync::broadcast};

use crate::{
    config::Config, internal, notify::Notify, smtp::session::Session, staging::Staging,
};

#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
}

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

/// The accept loop: one spawned session per connection, drained on
/// shutdown.
pub struct Server {
    config: Config,
    notifier: Arc<dyn Notify>,
    staging: Arc<Staging>,
}

impl Server {
    pub fn new(config: Config, notifier: Arc<dyn Notify>) -> Self {
        let staging = Arc::new(Staging::new(config.staging_dir.clone()));
        Self {
            config,
            notifier,
            staging,
        }
    }

    /// Run the listener until ctrl-c.
    pub async fn run(self) -> anyhow::Result<()> {
        internal!("Server running");

        tokio::select! {
            result = self.serve() => result,
            result = shutdown() => result,
        }
    }

    async fn serve(&self) -> anyhow::Result<()> {
        let mut sessions = Vec::default();

        let listener = TcpListener::bind(self.config.socket).await?;
        internal!(level = INFO, "Listening on {}", self.config.socket);

        let mut receiver = SHUTDOWN_BROADCAST.subscribe();

        loop {
            tokio::select! {
                sig = receiver.recv() => {
                    if matches!(sig, Ok(Signal::Shutdown)) {
                        internal!(level = INFO, "Listener {} received shutdown signal, finishing sessions ...", self.config.socket);
                        join_all(sessions).await;
                        break;
                    }
                }

                connection = listener.accept() => {
                    let (stream, address) = connection?;
                    tracing::debug!("Connection received from {address}");

                    let session = Session::create(
                        stream,
                        address,
                        self.config.banner.clone(),
                        self.config.channel.clone(),
                        Arc::clone(&self.notifier),
                        Arc::clone(&self.staging),
                    );

                    sessions.push(tokio::spawn(async move {
                        if let Err(err) = session.run().await {
                            internal!(level = ERROR, "Session error: {err}");
                        }
                    }));
                }
            }
        }

        Ok(())
    }
}

async fn shutdown() -> anyhow::Result<()> {
    let _ = tokio::signal::ctrl_c().await;
    internal!("CTRL+C entered -- Enter it again to force shutdown");

    let mut receiver = SHUTDOWN_BROADCAST.subscribe();

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    loop {
        tokio::select! {
            sig = receiver.recv() => {
                match sig {
                    Ok(s) => tracing::debug!("Received {s:?}"),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(e) => tracing::debug!("Received: {e:?}"),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    Ok(())
}
