//! Hot reload.
//!
//! A [`SharedApplication`] hands every request the application that was
//! current when the request arrived. [`ReloadWatcher`] rebuilds the
//! application when its settings file changes and swaps the new one in; live
//! route tables are never mutated.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use bobo_rs_core::settings_loader::from_file_with_env;
use bobo_rs_core::{BoboResult, Settings};
use bobo_rs_http::{HttpRequest, HttpResponse};

use crate::application::Application;

/// Builds an application from settings.
pub type AppFactory = Arc<dyn Fn(&Settings) -> BoboResult<Application> + Send + Sync>;

/// An application that can be replaced while requests are in flight.
pub struct SharedApplication {
    current: ArcSwap<Application>,
}

impl SharedApplication {
    /// Wraps `app`.
    pub fn new(app: Application) -> Self {
        Self {
            current: ArcSwap::from_pointee(app),
        }
    }

    /// The application new requests are served by.
    pub fn current(&self) -> Arc<Application> {
        self.current.load_full()
    }

    /// Swaps in `app`. Requests already running finish on the old one.
    pub fn replace(&self, app: Application) {
        self.current.store(Arc::new(app));
    }

    /// Handles `request` with the current application.
    ///
    /// # Errors
    ///
    /// See [`Application::handle`].
    pub async fn handle(&self, request: HttpRequest) -> BoboResult<HttpResponse> {
        let app = self.current();
        app.handle(request).await
    }

    /// Like [`handle`](Self::handle), answering escaped errors with a bare 500.
    pub async fn respond(&self, request: HttpRequest) -> HttpResponse {
        let app = self.current();
        app.respond(request).await
    }
}

impl From<Application> for SharedApplication {
    fn from(app: Application) -> Self {
        Self::new(app)
    }
}

impl std::fmt::Debug for SharedApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedApplication")
            .field("current", &self.current())
            .finish()
    }
}

/// Rebuilds a [`SharedApplication`] whenever its settings file changes.
pub struct ReloadWatcher {
    path: PathBuf,
    shared: Arc<SharedApplication>,
    factory: AppFactory,
}

impl ReloadWatcher {
    /// Creates a watcher for the settings file at `path`.
    pub fn new(path: &Path, shared: Arc<SharedApplication>, factory: AppFactory) -> Self {
        Self {
            path: path.to_path_buf(),
            shared,
            factory,
        }
    }

    /// The watched settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reloads settings, rebuilds the application, and swaps it in.
    ///
    /// # Errors
    ///
    /// Returns the settings or factory error; the current application is
    /// left in place.
    pub fn reload(&self) -> BoboResult<()> {
        rebuild(&self.path, &self.shared, &self.factory)
    }

    /// Starts watching in the background.
    ///
    /// Watching stops when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let shared = Arc::clone(&self.shared);
        let factory = Arc::clone(&self.factory);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = %path.display(), "settings change detected, reloading");
                        if let Err(e) = rebuild(&path, &shared, &factory) {
                            tracing::error!(error = %e, "reload failed, keeping the current application");
                        }
                    }
                }
                Err(e) => tracing::error!("watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "settings watcher started");
        Ok(watcher)
    }
}

fn rebuild(path: &Path, shared: &SharedApplication, factory: &AppFactory) -> BoboResult<()> {
    let settings = from_file_with_env(path)?;
    let app = factory(&settings)?;
    let routes = app.routes().len();
    shared.replace(app);
    tracing::info!(path = %path.display(), routes, "application reloaded");
    Ok(())
}

impl std::fmt::Debug for ReloadWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadWatcher")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bobo_rs_http::routing::{get, handler, HandlerDescriptor};
    use http::StatusCode;

    fn greeting_app(settings: &Settings) -> BoboResult<Application> {
        let greeting = settings
            .extra("greeting")
            .and_then(|v| v.as_str())
            .unwrap_or("hello")
            .to_string();
        Application::builder()
            .settings(settings.clone())
            .route(get(
                "/",
                HandlerDescriptor::new("index"),
                handler(move |_| Ok(greeting.clone())),
            ))
            .build()
    }

    fn root() -> HttpRequest {
        HttpRequest::builder().path("/").build()
    }

    #[tokio::test]
    async fn test_replace_swaps_application() {
        let shared = SharedApplication::new(greeting_app(&Settings::default()).unwrap());
        assert_eq!(shared.respond(root()).await.text(), "hello");

        let old = shared.current();
        let mut settings = Settings::default();
        settings
            .extra
            .insert("greeting".to_string(), serde_json::json!("bonjour"));
        shared.replace(greeting_app(&settings).unwrap());

        assert_eq!(shared.respond(root()).await.text(), "bonjour");
        assert_eq!(old.respond(root()).await.text(), "hello");
    }

    #[tokio::test]
    async fn test_reload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bobo.toml");
        std::fs::write(&path, "[extra]\ngreeting = \"hola\"\n").unwrap();

        let shared = Arc::new(SharedApplication::new(
            greeting_app(&Settings::default()).unwrap(),
        ));
        let watcher = ReloadWatcher::new(&path, Arc::clone(&shared), Arc::new(greeting_app));
        watcher.reload().unwrap();

        let response = shared.respond(root()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text(), "hola");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_current() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bobo.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let shared = Arc::new(SharedApplication::new(
            greeting_app(&Settings::default()).unwrap(),
        ));
        let watcher = ReloadWatcher::new(&path, Arc::clone(&shared), Arc::new(greeting_app));
        assert!(watcher.reload().is_err());
        assert_eq!(shared.respond(root()).await.text(), "hello");
    }
}
