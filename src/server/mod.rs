//! Development server with live reload
//!
//! Provides a local development server with:
//! - Static file serving from the output directory
//! - WebSocket-based live reload
//! - File watching and per-category rebuilds

mod reload;
mod watch;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::lookup_host;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::cli::ServeOptions;
use crate::config::Config;
use crate::utils::{clean_path, content_type};

pub use reload::{ReloadChannel, ReloadMessage};
pub use watch::{spawn_watcher, WatchRules};

/// WebSocket endpoint the injected client connects to
pub const RELOAD_PATH: &str = "/__sitepipe_reload";

/// Shared server state
pub struct ServerState {
    /// Directory files are served from
    root: PathBuf,

    /// Live reload broadcast channel
    reload: ReloadChannel,

    /// Whether to inject the live reload client
    reload_enabled: bool,
}

impl ServerState {
    /// Create server state serving `root`
    pub fn new(root: impl Into<PathBuf>, reload: ReloadChannel, reload_enabled: bool) -> Self {
        Self {
            root: root.into(),
            reload,
            reload_enabled,
        }
    }
}

/// Build the router for the given state
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route(RELOAD_PATH, get(reload::reload_websocket))
        .route("/*path", get(serve_file))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Development server
pub struct DevServer {
    /// Project configuration
    config: Arc<Config>,

    /// Server options
    options: ServeOptions,

    /// Live reload channel shared with the watcher
    reload: ReloadChannel,
}

impl DevServer {
    /// Create a new development server
    pub fn new(config: Arc<Config>, options: ServeOptions, reload: ReloadChannel) -> Self {
        Self {
            config,
            options,
            reload,
        }
    }

    /// Serve until the process is stopped
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = lookup_host((self.options.host.as_str(), self.options.port))
            .await
            .with_context(|| format!("Failed to resolve {}", self.options.host))?
            .next()
            .with_context(|| format!("No address found for {}", self.options.host))?;

        let state = Arc::new(ServerState::new(
            self.config.output_dir(),
            self.reload.clone(),
            self.options.reload,
        ));
        let app = router(state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        let url = format!("http://{}:{}", self.options.host, self.options.port);
        info!("Server listening on {}", url);

        if self.options.open {
            if let Err(e) = webbrowser_open(&url) {
                debug!("Failed to open browser: {}", e);
            }
        }

        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Serve `index.html` from the output root
async fn serve_index(State(state): State<Arc<ServerState>>) -> Response {
    serve_path(&state, "").await
}

/// Serve static files
async fn serve_file(
    State(state): State<Arc<ServerState>>,
    axum::extract::Path(path): axum::extract::Path<String>,
) -> Response {
    serve_path(&state, &path).await
}

async fn serve_path(state: &ServerState, request_path: &str) -> Response {
    // `clean_path` drops `..` segments, so the result stays under root
    let relative = clean_path(request_path);
    let mut file_path = state.root.join(relative.trim_start_matches('/'));

    if file_path.is_dir() {
        file_path = file_path.join("index.html");
    }

    if !file_path.is_file() {
        return (StatusCode::NOT_FOUND, format!("File not found: {}", request_path)).into_response();
    }

    let mime = content_type(&file_path);

    let body = match tokio::fs::read(&file_path).await {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read file {}: {}", file_path.display(), e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response();
        }
    };

    let body = if state.reload_enabled && is_html(&file_path) {
        inject_reload_client(&String::from_utf8_lossy(&body)).into_bytes()
    } else {
        body
    };

    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(mime));
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html") | Some("htm")
    )
}

/// Inject live reload client script into HTML
pub fn inject_reload_client(html: &str) -> String {
    let script = format!(
        r#"
<script>
// sitepipe live reload
(function() {{
  var ws = new WebSocket((location.protocol === 'https:' ? 'wss://' : 'ws://') + location.host + '{path}');
  var overlay = null;

  function showError(message) {{
    if (!overlay) {{
      overlay = document.createElement('pre');
      overlay.style.cssText = 'position:fixed;inset:0;margin:0;padding:2em;z-index:2147483647;' +
        'background:rgba(24,0,0,.92);color:#ff8080;font:14px/1.5 monospace;white-space:pre-wrap;overflow:auto';
      document.body.appendChild(overlay);
    }}
    overlay.textContent = message;
  }}

  ws.onmessage = function(event) {{
    var message = JSON.parse(event.data);

    switch (message.type) {{
      case 'full-reload':
        location.reload();
        break;

      case 'css-update':
        if (overlay) {{ overlay.remove(); overlay = null; }}
        document.querySelectorAll('link[rel="stylesheet"]').forEach(function(link) {{
          var url = new URL(link.href);
          url.searchParams.set('t', Date.now());
          link.href = url.toString();
        }});
        break;

      case 'error':
        showError((message.file ? message.file + '\n\n' : '') + message.message);
        break;

      case 'connected':
        console.log('[sitepipe] live reload connected');
        break;
    }}
  }};

  ws.onclose = function() {{
    console.log('[sitepipe] live reload disconnected, retrying...');
    setTimeout(function() {{ location.reload(); }}, 1000);
  }};
}})();
</script>
"#,
        path = RELOAD_PATH
    );

    // Insert before </body> or at the end
    if let Some(pos) = html.rfind("</body>") {
        let mut result = html.to_string();
        result.insert_str(pos, &script);
        result
    } else {
        format!("{}{}", html, script)
    }
}

/// Open URL in browser (simple implementation)
fn webbrowser_open(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()?;
    }

    Ok(())
}
