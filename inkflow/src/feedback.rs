/// Platform side effects the session triggers but never waits on.
pub trait UserFeedback: Send + Sync {
    fn set_clipboard_text(&self, text: &str);

    /// Short transient message, e.g. a toast.
    fn notify_user(&self, message: &str);
}
