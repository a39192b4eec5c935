// Confirmation Prompt Port

use async_trait::async_trait;

/// Asks the user to confirm a destructive action
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// `true` to proceed, `false` if the user declined
    async fn confirm(&self, message: &str) -> bool;
}

/// Prompt that always answers the same way (`--yes` flag, tests)
pub struct FixedAnswer(pub bool);

#[async_trait]
impl ConfirmationPrompt for FixedAnswer {
    async fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}
