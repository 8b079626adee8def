// webmail-client/src/compose.rs
use anyhow::{anyhow, Result};
use jmap_client::{EmailAddress, EmailCreate, Identity, MailboxIds};
use serde::{Deserialize, Serialize};

/// A message to send right away
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeMessage {
    pub identity_id: String,
    pub to: Vec<EmailAddress>,
    #[serde(default)]
    pub cc: Vec<EmailAddress>,
    #[serde(default)]
    pub bcc: Vec<EmailAddress>,
    pub subject: String,
    #[serde(default)]
    pub text_body: Option<String>,
    #[serde(default)]
    pub html_body: Option<String>,
    /// Message-ID being replied to
    #[serde(default)]
    pub in_reply_to: Option<String>,
    #[serde(default)]
    pub references: Vec<String>,
}

/// A draft to store in the drafts mailbox
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftMessage {
    #[serde(default)]
    pub to: Vec<EmailAddress>,
    #[serde(default)]
    pub cc: Vec<EmailAddress>,
    #[serde(default)]
    pub bcc: Vec<EmailAddress>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub text_body: Option<String>,
    #[serde(default)]
    pub html_body: Option<String>,
    /// Existing draft this one replaces
    #[serde(default)]
    pub draft_id: Option<String>,
}

fn non_empty(addresses: &[EmailAddress]) -> Option<Vec<EmailAddress>> {
    if addresses.is_empty() {
        None
    } else {
        Some(addresses.to_vec())
    }
}

fn with_bodies(mut email: EmailCreate, text: Option<&str>, html: Option<&str>) -> EmailCreate {
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        email = email.with_text_body(text);
    }
    if let Some(html) = html.filter(|h| !h.is_empty()) {
        email = email.with_html_body(html);
    }
    email
}

impl ComposeMessage {
    pub fn validate(&self) -> Result<()> {
        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(anyhow!("At least one recipient is required"));
        }
        Ok(())
    }

    /// Email record filed under `mailbox_id`, sent from `identity`
    pub fn to_email(&self, identity: &Identity, mailbox_id: &str) -> EmailCreate {
        let mut mailbox_ids = MailboxIds::new();
        mailbox_ids.insert(mailbox_id.to_string(), true);

        let email = EmailCreate {
            mailbox_ids,
            from: vec![identity.address()],
            to: self.to.clone(),
            cc: non_empty(&self.cc),
            bcc: non_empty(&self.bcc),
            subject: self.subject.clone(),
            in_reply_to: self.in_reply_to.clone().map(|id| vec![id]),
            references: Some(self.references.clone()).filter(|r| !r.is_empty()),
            ..Default::default()
        };
        with_bodies(email, self.text_body.as_deref(), self.html_body.as_deref())
    }
}

impl DraftMessage {
    pub fn to_email(&self, identity: &Identity, drafts_id: &str) -> EmailCreate {
        let mut mailbox_ids = MailboxIds::new();
        mailbox_ids.insert(drafts_id.to_string(), true);

        let email = EmailCreate {
            mailbox_ids,
            from: vec![identity.address()],
            to: self.to.clone(),
            cc: non_empty(&self.cc),
            bcc: non_empty(&self.bcc),
            subject: self.subject.clone().unwrap_or_default(),
            ..Default::default()
        };
        with_bodies(email, self.text_body.as_deref(), self.html_body.as_deref())
    }
}

/// Parse `user@host` or `Display Name <user@host>`
pub fn parse_address(input: &str) -> Result<EmailAddress> {
    let input = input.trim();
    let (name, email) = match (input.rfind('<'), input.ends_with('>')) {
        (Some(start), true) => {
            let name = input[..start].trim().trim_matches('"').trim();
            (Some(name), input[start + 1..input.len() - 1].trim())
        }
        _ => (None, input),
    };

    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid || email.contains(char::is_whitespace) {
        return Err(anyhow!("Invalid email address: {}", input));
    }

    let address = EmailAddress::new(email);
    Ok(match name.filter(|n| !n.is_empty()) {
        Some(name) => address.with_name(name),
        None => address,
    })
}

pub fn parse_addresses<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<EmailAddress>> {
    inputs.iter().map(|s| parse_address(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> Identity {
        serde_json::from_value(json!({"id": "I1", "name": "Me", "email": "me@example.com"}))
            .unwrap()
    }

    #[test]
    fn test_parse_address_forms() {
        assert_eq!(
            parse_address("you@example.com").unwrap(),
            EmailAddress::new("you@example.com")
        );
        assert_eq!(
            parse_address("\"You Person\" <you@example.com>").unwrap(),
            EmailAddress::new("you@example.com").with_name("You Person")
        );
        assert_eq!(
            parse_address("<you@example.com>").unwrap(),
            EmailAddress::new("you@example.com")
        );
        assert!(parse_address("not an address").is_err());
        assert!(parse_address("@example.com").is_err());
    }

    #[test]
    fn test_compose_to_email() {
        let message = ComposeMessage {
            identity_id: "I1".to_string(),
            to: vec![EmailAddress::new("you@example.com")],
            subject: "Re: Lunch".to_string(),
            text_body: Some("Sure".to_string()),
            html_body: Some(String::new()),
            in_reply_to: Some("<m1@example.com>".to_string()),
            ..Default::default()
        };
        let email = serde_json::to_value(message.to_email(&identity(), "drafts")).unwrap();

        assert_eq!(email["mailboxIds"], json!({"drafts": true}));
        assert_eq!(email["from"], json!([{"name": "Me", "email": "me@example.com"}]));
        assert_eq!(email["inReplyTo"], json!(["<m1@example.com>"]));
        assert_eq!(email["textBody"], json!([{"partId": "text", "type": "text/plain"}]));
        assert!(email.get("htmlBody").is_none());
        assert!(email.get("cc").is_none());
        assert!(email.get("references").is_none());
    }

    #[test]
    fn test_compose_requires_recipient() {
        let message = ComposeMessage {
            identity_id: "I1".to_string(),
            subject: "Nobody".to_string(),
            ..Default::default()
        };
        assert!(message.validate().is_err());
    }

    #[test]
    fn test_draft_defaults_subject() {
        let draft = DraftMessage::default().to_email(&identity(), "drafts");
        assert_eq!(draft.subject, "");
        assert!(draft.body_values.is_empty());
    }
}
