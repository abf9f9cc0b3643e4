use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

fn resolve_filter() -> tracing_subscriber::EnvFilter {
    if let Ok(spec) = std::env::var("AGENT_LOG")
        && let Ok(filter) = tracing_subscriber::EnvFilter::try_new(spec)
    {
        return filter;
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Initialize tracing output once per process.
///
/// Environment variables:
/// - `AGENT_LOG`: level/filter override (`info`, `debug`, per-target
///   directives); falls back to `RUST_LOG`, then `info`.
/// - `AGENT_LOG_JSON_PATH`: when set, logs go to that file as JSONL
///   instead of the human-readable console format on stderr.
///
/// Embedding applications that install their own subscriber can simply
/// skip this call.
pub fn init_observability() {
    INIT.get_or_init(|| {
        let filter = resolve_filter();
        if let Ok(raw_path) = std::env::var("AGENT_LOG_JSON_PATH") {
            let path = std::path::PathBuf::from(raw_path);
            let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
                Some(parent) => {
                    let _ = std::fs::create_dir_all(parent);
                    parent.to_path_buf()
                }
                None => std::path::PathBuf::from("."),
            };
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("agent-client.logs.jsonl");
            let writer = tracing_appender::rolling::never(dir, file_name.to_string());
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(false)
                .with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init();
        }
    });
}
