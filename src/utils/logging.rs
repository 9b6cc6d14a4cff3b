use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use std::env;

/// Initialize logging for the engine
pub fn init_logging() {
    // Check for environment variables to configure logging
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let enable_backtrace = env::var("RUST_BACKTRACE").unwrap_or_else(|_| "0".to_string()) == "1";

    // Create environment filter
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let mut filter = EnvFilter::new(&log_level);

            // Add filters for our application
            filter = filter.add_directive("parlor=debug".parse().unwrap());

            filter
        });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(true)
        );

    subscriber.init();

    // Set up panic hook with better logging
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!("Panic occurred: {}", panic_info);

        if let Some(location) = panic_info.location() {
            tracing::error!(
                "Panic location: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }

        if enable_backtrace {
            tracing::error!("Backtrace:\n{:?}", std::backtrace::Backtrace::capture());
        }
    }));

    tracing::info!("Logging initialized with level: {}", log_level);
}

/// Log system information for debugging
pub fn log_system_info() {
    tracing::info!("=== System Information ===");
    tracing::info!("OS: {}", std::env::consts::OS);
    tracing::info!("Architecture: {}", std::env::consts::ARCH);
    tracing::info!("Engine Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("========================");
}
