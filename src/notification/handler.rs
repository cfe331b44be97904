use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use super::Notification;

/// A consumer of decoded notifications.
///
/// Each invocation runs on its own task; implementations may be slow or fail
/// without affecting other handlers or the listener.
#[async_trait]
pub trait NotificationHandler: Send + Sync + 'static {
    /// Perform the side effect for one notification.
    async fn handle(&self, notification: Arc<Notification>) -> anyhow::Result<()>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "handler"
    }
}

/// Adapter turning an async closure into a [`NotificationHandler`].
pub struct FnHandler<F, Fut> {
    name: String,
    func: F,
    _fut: PhantomData<fn() -> Fut>,
}

/// Wrap an async closure as a named handler.
///
/// ```rust,ignore
/// listener.register(handler_fn("audit", |n| async move {
///     tracing::info!(?n, "inventory changed");
///     Ok(())
/// }));
/// ```
pub fn handler_fn<F, Fut>(name: impl Into<String>, func: F) -> Arc<FnHandler<F, Fut>>
where
    F: Fn(Arc<Notification>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        func,
        _fut: PhantomData,
    })
}

#[async_trait]
impl<F, Fut> NotificationHandler for FnHandler<F, Fut>
where
    F: Fn(Arc<Notification>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, notification: Arc<Notification>) -> anyhow::Result<()> {
        (self.func)(notification).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_fn_handler_invokes_closure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = handler_fn("collect", move |n: Arc<Notification>| {
            let tx = tx.clone();
            async move {
                tx.send(n)?;
                Ok(())
            }
        });

        let mut notification = Notification::new();
        notification.insert("sku".into(), json!("A-1"));
        handler.handle(Arc::new(notification)).await.unwrap();

        assert_eq!(handler.name(), "collect");
        assert_eq!(rx.recv().await.unwrap()["sku"], "A-1");
    }

    #[tokio::test]
    async fn test_fn_handler_propagates_error() {
        let handler = handler_fn("failing", |_n| async { anyhow::bail!("downstream unavailable") });
        let err = handler.handle(Arc::new(Notification::new())).await.unwrap_err();
        assert!(err.to_string().contains("downstream unavailable"));
    }
}
