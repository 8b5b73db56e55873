use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("nutri_track=debug,info")
        } else {
            EnvFilter::new("nutri_track=info,warn")
        }
    })
}

/// CLI 使用精簡格式，輸出到 stderr 以免干擾 stdout 的 JSON 結果
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// 服務部署使用 JSON 格式，方便集中式日誌收集
pub fn init_json_logger(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(format!("nutri_track={},warn", level)),
        None => default_filter(false),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
