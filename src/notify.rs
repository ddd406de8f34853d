use serde_json::Value;
use strum_macros::Display;

/// Closed set of message templates. The sink receives
/// (recipient, template, context) triples; rendering and transport live
/// outside this service.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Template {
    LeaveSubmitted,
    LeaveApproved,
    LeaveRejected,
    DeputyAssigned,
    PunchRecorded,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: String,
    pub template: Template,
    pub context: Value,
}

impl Notification {
    pub fn new(recipient: impl Into<String>, template: Template, context: Value) -> Self {
        Self {
            recipient: recipient.into(),
            template,
            context,
        }
    }
}

/// Fire-and-forget dispatch. Delivery failures are logged and never
/// surfaced to the caller; a failed notification must not fail or roll
/// back the action that produced it.
pub fn dispatch(notifications: Vec<Notification>) {
    if notifications.is_empty() {
        return;
    }
    actix_web::rt::spawn(async move {
        for n in notifications {
            if let Err(e) = deliver(&n).await {
                tracing::warn!(
                    recipient = %n.recipient,
                    template = %n.template,
                    error = %e,
                    "Notification delivery failed"
                );
            }
        }
    });
}

// Default sink: record the triple. A real transport replaces this body.
async fn deliver(n: &Notification) -> anyhow::Result<()> {
    tracing::info!(
        recipient = %n.recipient,
        template = %n.template,
        context = %n.context,
        "Notification queued"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_ids_are_kebab_case() {
        assert_eq!(Template::LeaveSubmitted.to_string(), "leave-submitted");
        assert_eq!(Template::DeputyAssigned.to_string(), "deputy-assigned");
        assert_eq!(Template::PunchRecorded.to_string(), "punch-recorded");
    }
}
