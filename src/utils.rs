use once_cell::sync::Lazy;

/// Runtime the reply timers run on; GTK keeps the main thread.
pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});
