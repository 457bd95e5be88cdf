use super::types::FormSubmission;

/// Commands sent from the UI to the network task.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Submit the send form without blocking the event loop.
    SubmitForm(FormSubmission),
}
