//! A real server on a random port.
//!
//! [`LiveServer`] binds an [`Application`] behind the axum adapter to
//! `127.0.0.1:0` and serves it from a background task, so tests can talk to
//! it over an actual socket.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bobo_rs_app::Application;
//! use bobo_rs_http::routing::{get, handler, HandlerDescriptor};
//! use bobo_rs_test::live_server::LiveServer;
//!
//! async fn example() -> std::io::Result<()> {
//!     let app = Application::builder()
//!         .route(get("/", HandlerDescriptor::new("index"), handler(|_| Ok("Hello"))))
//!         .build()
//!         .unwrap();
//!     let server = LiveServer::start(app).await?;
//!     println!("Server running at {}", server.url());
//!     server.stop().await;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use bobo_rs_app::server::shared_router;
use bobo_rs_app::{Application, SharedApplication};

/// A running server bound to a random local port.
///
/// Dropping the server signals shutdown without waiting for it.
pub struct LiveServer {
    addr: SocketAddr,
    shared: Arc<SharedApplication>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<JoinHandle<()>>,
}

impl LiveServer {
    /// Starts serving `app`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(app: Application) -> std::io::Result<Self> {
        Self::start_shared(Arc::new(SharedApplication::new(app))).await
    }

    /// Starts serving a replaceable application.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start_shared(shared: Arc<SharedApplication>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = shared_router(Arc::clone(&shared));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "live server stopped with an error");
            }
        });

        tracing::debug!(address = %addr, "live server started");
        Ok(Self {
            addr,
            shared,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    /// Returns the base URL, e.g. `http://127.0.0.1:43210`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Returns the bound address.
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the bound port.
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Returns the application handle, for swapping in a rebuilt application.
    pub const fn shared(&self) -> &Arc<SharedApplication> {
        &self.shared
    }

    /// Shuts the server down and waits for the task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for LiveServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl std::fmt::Debug for LiveServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveServer")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bobo_rs_http::routing::{get, handler, HandlerDescriptor};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn greeting(text: &'static str) -> Application {
        Application::builder()
            .route(get("/hello", HandlerDescriptor::new("hello"), handler(move |_| Ok(text))))
            .build()
            .unwrap()
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_start_and_url() {
        let server = LiveServer::start(greeting("live")).await.unwrap();
        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert!(server.port() > 0);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_serves_over_socket() {
        let server = LiveServer::start(greeting("Hello from live server"))
            .await
            .unwrap();

        let response = raw_get(server.addr(), "/hello").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("Hello from live server"));

        let response = raw_get(server.addr(), "/missing").await;
        assert!(response.starts_with("HTTP/1.1 404"));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_swap_is_visible() {
        let server = LiveServer::start(greeting("before")).await.unwrap();
        server.shared().replace(greeting("after"));

        let response = raw_get(server.addr(), "/hello").await;
        assert!(response.ends_with("after"));

        server.stop().await;
    }

    #[tokio::test]
    async fn test_multiple_servers() {
        let first = LiveServer::start(greeting("one")).await.unwrap();
        let second = LiveServer::start(greeting("two")).await.unwrap();
        assert_ne!(first.port(), second.port());
        first.stop().await;
        second.stop().await;
    }
}
