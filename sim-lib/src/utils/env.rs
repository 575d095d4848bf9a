/// Default amount of requests a client keeps in flight.
///
/// Uses `MAX_CONCURRENT_REQUESTS` when defined and valid,
/// otherwise a multiple of the available parallelism.
pub fn compute_concurrent_request_count() -> usize {
    std::env::var("MAX_CONCURRENT_REQUESTS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            cpus * 64
        })
}
