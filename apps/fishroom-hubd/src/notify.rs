use async_trait::async_trait;

/// The runner's admin-notification channel, sent once when a worker exits.
/// The original sends this over a dedicated Telegram admin chat; since
/// concrete protocol adapters are outside this implementation's scope, the
/// default notifier just logs at `error` level. A deployment that wires up
/// a real adapter can supply its own `AdminNotifier`.
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    async fn notify(&self, message: &str);
}

pub struct LoggingAdminNotifier;

#[async_trait]
impl AdminNotifier for LoggingAdminNotifier {
    async fn notify(&self, message: &str) {
        tracing::error!(target: "fishroom_hubd::admin_notify", "{message}");
    }
}
