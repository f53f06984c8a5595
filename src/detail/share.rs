use super::notify::{Notifier, Toast};
use crate::config::AppConfig;
use crate::error::AppError;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What gets handed to the native share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    /// The fallback only replaces the sheet title; the text keeps the raw title.
    pub fn for_podcast(config: &AppConfig, title: &str, author: &str, url: String) -> Self {
        Self {
            title: if title.trim().is_empty() {
                config.share_title_fallback.clone()
            } else {
                title.to_string()
            },
            text: config.share_text(title, author),
            url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The native share sheet completed.
    Shared,
    /// Native share failed or the user dismissed it. Nothing is shown.
    NativeFailed(String),
    /// The link is on the clipboard and "Copied!" is showing.
    Copied,
    CopyFailed(String),
}

/// Host capabilities the share button needs.
pub trait SharePlatform: Send + Sync + 'static {
    /// Probed on every share, the capability can come and go.
    fn native_share_available(&self) -> bool;

    fn native_share(&self, payload: &SharePayload) -> impl Future<Output = Result<(), AppError>> + Send;

    fn write_clipboard(&self, text: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    fn current_url(&self) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct ShareSettings {
    pub copied_window: Duration,
    pub toast_duration: Duration,
}

impl From<&AppConfig> for ShareSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            copied_window: config.copied_reset(),
            toast_duration: config.copy_toast_duration(),
        }
    }
}

/// Share button logic: native share when the host has it, clipboard otherwise.
///
/// The "Copied!" window is a single timer. Copying again while it is
/// showing cancels the old timer and starts a fresh full window.
pub struct ShareController<P> {
    platform: Arc<P>,
    notifier: Arc<dyn Notifier>,
    settings: ShareSettings,
    copied: Arc<watch::Sender<bool>>,
    reset: Mutex<Option<JoinHandle<()>>>,
}

impl<P: SharePlatform> ShareController<P> {
    pub fn new(platform: Arc<P>, notifier: Arc<dyn Notifier>, settings: ShareSettings) -> Self {
        let (copied, _) = watch::channel(false);
        Self {
            platform,
            notifier,
            settings,
            copied: Arc::new(copied),
            reset: Mutex::new(None),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn is_copied(&self) -> bool {
        *self.copied.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.copied.subscribe()
    }

    pub async fn share(&self, payload: &SharePayload) -> ShareOutcome {
        if self.platform.native_share_available() {
            return match self.platform.native_share(payload).await {
                Ok(()) => {
                    log::info!("Shared {} via native share", payload.url);
                    ShareOutcome::Shared
                }
                Err(e) => {
                    log::warn!("Native share of {} failed or was dismissed: {}", payload.url, e);
                    ShareOutcome::NativeFailed(e.to_string())
                }
            };
        }

        if let Err(e) = self.platform.write_clipboard(&payload.url).await {
            log::error!("Clipboard write for {} failed: {}", payload.url, e);
            self.notifier.notify(
                Toast::destructive("Could not copy link").description(e.to_string()),
            );
            return ShareOutcome::CopyFailed(e.to_string());
        }

        self.copied.send_replace(true);
        self.schedule_reset();
        log::info!("Copied {} to clipboard", payload.url);
        self.notifier.notify(
            Toast::new("Link Copied!")
                .description("Podcast link copied to clipboard")
                .duration(self.settings.toast_duration),
        );
        ShareOutcome::Copied
    }

    /// Drop any pending reset, leaving the flag as it is.
    pub fn cancel_reset(&self) {
        if let Some(handle) = self.reset.lock().unwrap().take() {
            handle.abort();
        }
    }

    fn schedule_reset(&self) {
        let copied = self.copied.clone();
        let deadline = tokio::time::Instant::now() + self.settings.copied_window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            copied.send_replace(false);
        });
        if let Some(previous) = self.reset.lock().unwrap().replace(handle) {
            previous.abort();
        }
    }
}

impl<P> Drop for ShareController<P> {
    fn drop(&mut self) {
        if let Ok(mut reset) = self.reset.lock() {
            if let Some(handle) = reset.take() {
                handle.abort();
            }
        }
    }
}
