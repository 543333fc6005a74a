use std::time::{Duration, Instant};

use crate::config::ContactSettings;

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactSubmission {
    /// Builds a submission from form values in field order:
    /// name, email, phone, message.
    pub fn from_values(values: &[String]) -> Self {
        let field = |index: usize| values.get(index).cloned().unwrap_or_default();
        Self {
            name: field(0),
            email: field(1),
            phone: field(2),
            message: field(3),
        }
    }

    pub fn message_text(&self) -> String {
        let phone = if self.phone.trim().is_empty() {
            "Not provided"
        } else {
            self.phone.trim()
        };
        format!(
            "*New contact from the catalog!*\n\n*Name:* {}\n*E-mail:* {}\n*Phone:* {}\n\n*Message:*\n{}",
            self.name.trim(),
            self.email.trim(),
            phone,
            self.message.trim()
        )
    }

    /// Messaging deep-link carrying the formatted text.
    pub fn whatsapp_url(&self, contact: &ContactSettings) -> String {
        format!(
            "{}?text={}",
            contact.whatsapp_base_url(),
            urlencoding::encode(&self.message_text())
        )
    }
}

/// A transient toast that disappears on its own.
#[derive(Clone, Debug)]
pub struct Notification {
    pub message: String,
    expires_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            expires_at: now + NOTIFICATION_TTL,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> ContactSubmission {
        ContactSubmission::from_values(&[
            "Ana".into(),
            "ana@example.com".into(),
            String::new(),
            "Quero a bolsa azul & a rosa?".into(),
        ])
    }

    #[test]
    fn missing_phone_is_reported() {
        let text = submission().message_text();
        assert!(text.starts_with("*New contact from the catalog!*"));
        assert!(text.contains("*Name:* Ana\n"));
        assert!(text.contains("*Phone:* Not provided\n"));
        assert!(text.ends_with("*Message:*\nQuero a bolsa azul & a rosa?"));
    }

    #[test]
    fn link_encodes_text() {
        let contact = ContactSettings {
            whatsapp_number: "5511999999999".into(),
            ..ContactSettings::default()
        };
        let url = submission().whatsapp_url(&contact);
        assert!(url.starts_with("https://wa.me/5511999999999?text="));
        let encoded = url.split("?text=").nth(1).unwrap();
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains('&'));
        assert!(!encoded.contains('\n'));
        assert_eq!(
            urlencoding::decode(encoded).unwrap(),
            submission().message_text()
        );
    }

    #[test]
    fn notification_expires_after_ttl() {
        let now = Instant::now();
        let toast = Notification::new("sent", now);
        assert!(!toast.is_expired(now));
        assert!(!toast.is_expired(now + Duration::from_secs(4)));
        assert!(toast.is_expired(now + NOTIFICATION_TTL));
    }
}
