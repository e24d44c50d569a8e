pub struct Timer;

impl Timer {
    /// Resolve after `ms` milliseconds. Dropping the future cancels the timer.
    #[cfg(target_arch = "wasm32")]
    pub async fn sleep(ms: u32) {
        gloo_timers::future::TimeoutFuture::new(ms).await;
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub async fn sleep(ms: u32) {
        tokio::time::sleep(std::time::Duration::from_millis(u64::from(ms))).await;
    }
}
