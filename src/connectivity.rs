/// Network-reachability seam; implemented by whatever platform layer embeds
/// the controller.
pub trait NetworkMonitor: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Default used by the headless binary: connectivity failures are detected
/// by the HTTP client instead of up front.
pub struct AssumeOnline;

impl NetworkMonitor for AssumeOnline {
    fn is_online(&self) -> bool {
        true
    }
}
