// jmap-client/src/methods/submission.rs
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::single;
use crate::capability;
use crate::client::JmapClient;
use crate::error::{JmapError, Result};
use crate::http::HttpClient;
use crate::id::CallId;
use crate::request::{Argument, Arguments, PatchObject, RequestBuilder};
use crate::response::ResponseParser;
use crate::types::{keyword, EmailCreate, SetResponse};

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentEmail {
    pub email_id: String,
    pub submission_id: String,
    /// Whether the post-send update (into sent, `$draft` cleared) was applied
    pub moved_to_sent: bool,
}

impl<C: HttpClient> JmapClient<C> {
    /// Create an email and submit it in one batch.
    ///
    /// The submission refers to the new email by creation ID, and its
    /// `onSuccessUpdateEmail` moves the email from its first mailbox (the
    /// drafts folder, when composing) into `sent_mailbox_id`. A rejection of
    /// either record fails the whole send.
    pub async fn email_submission_create_and_send(
        &self,
        identity_id: &str,
        sent_mailbox_id: &str,
        email: EmailCreate,
    ) -> Result<SentEmail> {
        let mut builder = RequestBuilder::new();
        builder.add_capabilities([capability::MAIL, capability::SUBMISSION]);

        let email_cid = builder.create_id("email");
        let email_call = builder.call(
            "Email/set",
            Arguments::account(self.account_id())
                .arg("create", single(email_cid.as_str(), serde_json::to_value(&email)?)),
        );

        let mut on_success = PatchObject::new().mailbox(sent_mailbox_id, true);
        if let Some(origin) = email.mailbox_ids.keys().find(|id| *id != sent_mailbox_id) {
            on_success = on_success.mailbox(origin, false);
        }
        let on_success = on_success
            .keyword(keyword::DRAFT, false)
            .keyword(keyword::SEEN, true);

        let submission_call = submission_call(
            &mut builder,
            self.account_id(),
            identity_id,
            EmailRef::Created(email_cid.as_str()),
            on_success,
        )?;

        debug!(identity_id, calls = builder.len(), "sending email");
        let parser = self.execute(builder).await?;

        let mut email_set: SetResponse = parser.get_method(&email_call, "Email/set")?;
        let created = email_set.take_created(email_cid.as_str())?;

        let (submission_id, moved_to_sent) = read_submission(&parser, &submission_call)?;
        Ok(SentEmail {
            email_id: created.id,
            submission_id,
            moved_to_sent,
        })
    }

    /// Submit an existing draft and file it into `sent_mailbox_id`
    pub async fn email_submission_send_draft(
        &self,
        email_id: &str,
        identity_id: &str,
        sent_mailbox_id: &str,
    ) -> Result<SentEmail> {
        let mut builder = RequestBuilder::new();
        builder.add_capabilities([capability::MAIL, capability::SUBMISSION]);

        let on_success = PatchObject::new()
            .keyword(keyword::DRAFT, false)
            .keyword(keyword::SEEN, true)
            .set("mailboxIds", single(sent_mailbox_id, Value::Bool(true)));
        let submission_call = submission_call(
            &mut builder,
            self.account_id(),
            identity_id,
            EmailRef::Id(email_id),
            on_success,
        )?;

        debug!(email_id, identity_id, "sending draft");
        let parser = self.execute(builder).await?;
        let (submission_id, moved_to_sent) = read_submission(&parser, &submission_call)?;
        Ok(SentEmail {
            email_id: email_id.to_string(),
            submission_id,
            moved_to_sent,
        })
    }
}

/// Email a submission sends: a stored one, or one created earlier in the
/// same batch
#[derive(Debug, Clone, Copy)]
enum EmailRef<'a> {
    Id(&'a str),
    Created(&'a str),
}

impl EmailRef<'_> {
    fn resolve(self, builder: &RequestBuilder) -> Result<Argument<String>> {
        match self {
            Self::Id(id) => Ok(Argument::Value(id.to_string())),
            Self::Created(name) => builder.creation_reference(name).map(Argument::Creation),
        }
    }
}

const SUBMISSION_CREATION_ID: &str = "submission";

fn submission_call(
    builder: &mut RequestBuilder,
    account_id: &str,
    identity_id: &str,
    email: EmailRef<'_>,
    on_success: PatchObject,
) -> Result<CallId> {
    let email = email.resolve(builder)?;
    let submission_cid = builder.create_id(SUBMISSION_CREATION_ID);
    let submission = Arguments::new()
        .arg("identityId", identity_id)
        .argument("emailId", email)
        .into_value();
    let args = Arguments::account(account_id)
        .arg("create", single(submission_cid.as_str(), submission))
        .arg(
            "onSuccessUpdateEmail",
            single(&submission_cid.reference(), on_success.into_value()),
        );
    Ok(builder.call("EmailSubmission/set", args))
}

/// Created submission ID, and whether the implicit `Email/set` that the
/// server answers `onSuccessUpdateEmail` with was applied cleanly
fn read_submission(parser: &ResponseParser, call_id: &CallId) -> Result<(String, bool)> {
    let mut submission_set: SetResponse = parser.get_method(call_id, "EmailSubmission/set")?;
    let created = submission_set.take_created(SUBMISSION_CREATION_ID)?;

    let moved_to_sent = match parser.get_method::<SetResponse>(call_id, "Email/set") {
        Ok(update) => match update.check() {
            Ok(()) => true,
            Err(e) => {
                warn!(submission = %created.id, error = %e, "email sent but not moved to sent");
                false
            }
        },
        Err(JmapError::UnexpectedResponse { .. }) => {
            warn!(submission = %created.id, "server did not report the post-send update");
            false
        }
        Err(e) => return Err(e),
    };

    debug!(submission = %created.id, moved_to_sent, "email submitted");
    Ok((created.id, moved_to_sent))
}
