use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

use crate::client::handle_client;
use crate::server::SessionContext;

pub struct Server {
    listener: TcpListener,
    ctx: Arc<SessionContext>,
}

impl Server {
    /// Binds the control listener and prepares the server root.
    pub async fn bind(ctx: SessionContext) -> io::Result<Self> {
        let socket = ctx.config.control_socket();
        let listener = TcpListener::bind(socket.as_str()).await.map_err(|e| {
            error!("Failed to bind to {}: {}", socket, e);
            e
        })?;
        info!("Server bound to {}", listener.local_addr()?);

        let root = ctx.config.server_root_path();
        if let Err(e) = std::fs::create_dir_all(&root) {
            warn!("Failed to create server root directory: {}", e);
        } else {
            info!("Server root directory: {}", root.display());
        }

        Ok(Self {
            listener,
            ctx: Arc::new(ctx),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until Ctrl-C. Each session runs on a blocking
    /// worker because command handling and transfers are synchronous.
    pub async fn start(&self) {
        info!(
            "Starting Tandem FTP server on {} (passive {}, ports {}..{})",
            self.ctx.config.control_socket(),
            self.ctx.passive_ip,
            self.ctx.config.data_port_min,
            self.ctx.config.data_port_max
        );

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.spawn_session(stream, addr),
                    Err(e) => error!("Error accepting connection: {}", e),
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }
    }

    fn spawn_session(&self, stream: TcpStream, addr: SocketAddr) {
        let stream = match stream.into_std().and_then(|s| {
            s.set_nonblocking(false)?;
            Ok(s)
        }) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to hand off client {}: {}", addr, e);
                return;
            }
        };

        let ctx = Arc::clone(&self.ctx);
        tokio::task::spawn_blocking(move || handle_client(stream, addr, ctx));
    }
}
