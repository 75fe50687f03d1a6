//! Admin notification hook for connect/disconnect events.
//!
//! Boxgrid doesn't know where operators want these events delivered —
//! a chat webhook, a ticketing system, nowhere. The server just calls
//! the [`AdminNotifier`] trait; the deployment supplies the impl.
//!
//! Delivery is strictly best-effort: the methods are infallible by
//! signature, so an implementation logs its own failures and never
//! surfaces them — a broken webhook must not slow down or break a
//! client connection.

use std::future::Future;

/// Receives connect/disconnect events, best-effort.
///
/// `count` is the live player count after the event was applied. When
/// the counter backend is unavailable the event is skipped entirely —
/// there is no meaningful count to report.
pub trait AdminNotifier: Send + Sync + 'static {
    /// A client connected; the live count is now `count`.
    fn player_joined(&self, count: i64) -> impl Future<Output = ()> + Send;

    /// A client disconnected; the live count is now `count`.
    fn player_left(&self, count: i64) -> impl Future<Output = ()> + Send;
}

/// An [`AdminNotifier`] that does nothing.
///
/// The default for deployments with no admin channel configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl AdminNotifier for NoopNotifier {
    async fn player_joined(&self, _count: i64) {}

    async fn player_left(&self, _count: i64) {}
}

impl<T: AdminNotifier> AdminNotifier for std::sync::Arc<T> {
    fn player_joined(&self, count: i64) -> impl Future<Output = ()> + Send {
        T::player_joined(self, count)
    }

    fn player_left(&self, count: i64) -> impl Future<Output = ()> + Send {
        T::player_left(self, count)
    }
}
