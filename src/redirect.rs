//! Redirect targets and the single channel used to signal them.
//!
//! Navigation verdicts, refresh failures, 403 responses and the sign-in flows
//! all speak the same [`Redirect`] type; the UI owns the receiving end.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::config::GuardConfig;

/// Where the user should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// Signed-in users never see sign-in/sign-up pages.
    Dashboard,
    /// Sign in, then come back to `callback` when set.
    Login { callback: Option<String> },
    /// Authenticated, but lacking the role for the target.
    Unauthorized,
}

impl Redirect {
    /// Render the redirect as a location under `config`.
    pub fn location(&self, config: &GuardConfig) -> String {
        match self {
            Redirect::Dashboard => config.dashboard_path.clone(),
            Redirect::Unauthorized => config.unauthorized_path.clone(),
            Redirect::Login { callback: None } => config.login_path.clone(),
            Redirect::Login {
                callback: Some(callback),
            } => format!(
                "{}?{}={}",
                config.login_path,
                config.callback_param,
                urlencoding::encode(callback)
            ),
        }
    }
}

/// Sending half of the redirect channel. Cheap to clone; emitting on a
/// channel whose receiver is gone is a no-op.
#[derive(Clone, Debug, Default)]
pub struct RedirectSignal {
    tx: Option<UnboundedSender<Redirect>>,
}

impl RedirectSignal {
    pub fn channel() -> (Self, UnboundedReceiver<Redirect>) {
        let (tx, rx) = unbounded_channel();
        (RedirectSignal { tx: Some(tx) }, rx)
    }

    /// A signal nobody listens to.
    pub fn disabled() -> Self {
        RedirectSignal { tx: None }
    }

    pub fn emit(&self, redirect: Redirect) {
        debug!("Signalling redirect: {:?}", redirect);
        if let Some(tx) = &self.tx {
            let _ = tx.send(redirect);
        }
    }
}
