use crate::config::ContactConfig;
use crate::dom::Document;
use crate::site::{Task, Timers};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

const FORM_ID: &str = "contactForm";
const FIELDS: [&str; 4] = ["name", "email", "subject", "message"];
const SENDING_LABEL: &str = r#"<i class="fas fa-spinner fa-spin"></i> Sending..."#;
pub const SUCCESS_MESSAGE: &str = "Your email client is opening. Thanks for your message!";

// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Please fill in all required fields.")]
    MissingField(&'static str),
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Your message could not be prepared for your email client.")]
    Mailto(#[from] url::ParseError),
}

impl ContactError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing-field",
            Self::InvalidEmail => "invalid-email",
            Self::Mailto(_) => "mailto",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl Submission {
    pub fn validate(
        name: &str,
        email: &str,
        subject: &str,
        message: &str,
        default_subject: &str,
    ) -> Result<Self, ContactError> {
        let name = name.trim();
        let email = email.trim();
        let message = message.trim();

        for (field, value) in [("name", name), ("email", email), ("message", message)] {
            if value.is_empty() {
                return Err(ContactError::MissingField(field));
            }
        }
        if !EMAIL_PATTERN.is_match(email) {
            return Err(ContactError::InvalidEmail);
        }

        let subject = match subject.trim() {
            "" => default_subject,
            given => given,
        };

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        })
    }

    pub fn body(&self) -> String {
        format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}",
            self.name, self.email, self.message
        )
    }

    pub fn mailto(&self, recipient: &str) -> Result<Url, ContactError> {
        let link = format!(
            "mailto:{recipient}?subject={}&body={}",
            utf8_percent_encode(&self.subject, URI_COMPONENT),
            utf8_percent_encode(&self.body(), URI_COMPONENT),
        );
        Ok(Url::parse(&link)?)
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Ignored,
    Busy,
    Rejected(ContactError),
    Sending,
}

enum SubmissionState<N> {
    Idle,
    Sending {
        button: Option<N>,
        original_label: String,
        link: Url,
    },
}

pub struct ContactForm<N> {
    form: Option<N>,
    state: SubmissionState<N>,
    config: ContactConfig,
}

impl<N: Clone + PartialEq> ContactForm<N> {
    pub fn attach<D: Document<Node = N>>(doc: &D, config: &ContactConfig) -> Self {
        Self {
            form: doc.by_id(FORM_ID),
            state: SubmissionState::Idle,
            config: config.clone(),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.form.is_some()
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, SubmissionState::Sending { .. })
    }

    pub fn submit<D: Document<Node = N>>(
        &mut self,
        doc: &mut D,
        timers: &mut Timers<N>,
        form: &N,
    ) -> SubmitOutcome {
        if self.form.as_ref() != Some(form) {
            return SubmitOutcome::Ignored;
        }
        if self.is_sending() {
            return SubmitOutcome::Busy;
        }

        let reader: &D = doc;
        let [name, email, subject, message] = FIELDS.map(|field| {
            field_node(reader, form, field)
                .map(|node| reader.field_value(&node))
                .unwrap_or_default()
        });
        let link = match Submission::validate(
            &name,
            &email,
            &subject,
            &message,
            &self.config.default_subject,
        )
        .and_then(|submission| submission.mailto(&self.config.recipient))
        {
            Ok(link) => link,
            Err(error) => return SubmitOutcome::Rejected(error),
        };

        let button = doc.query_within(form, r#"button[type="submit"]"#);
        let original_label = match &button {
            Some(button) => {
                let label = doc.inner_html(button);
                doc.set_inner_html(button, SENDING_LABEL);
                doc.set_disabled(button, true);
                label
            }
            None => String::new(),
        };

        timers.schedule(
            f64::from(self.config.submit_delay_ms),
            Task::CompleteSubmission(form.clone()),
        );
        self.state = SubmissionState::Sending {
            button,
            original_label,
            link,
        };
        SubmitOutcome::Sending
    }

    /// Hands the message to the mail client and resets the form. Returns the
    /// link that was opened.
    pub fn complete<D: Document<Node = N>>(&mut self, doc: &mut D, form: &N) -> Option<Url> {
        let SubmissionState::Sending {
            button,
            original_label,
            link,
        } = std::mem::replace(&mut self.state, SubmissionState::Idle)
        else {
            return None;
        };

        doc.navigate(link.as_str());

        for field in FIELDS {
            if let Some(node) = field_node(doc, form, field) {
                doc.set_field_value(&node, "");
            }
        }
        if let Some(button) = button {
            doc.set_inner_html(&button, &original_label);
            doc.set_disabled(&button, false);
        }
        Some(link)
    }
}

fn field_node<D: Document>(doc: &D, form: &D::Node, field: &str) -> Option<D::Node> {
    doc.query_within(form, &format!("#{field}"))
        .or_else(|| doc.query_within(form, &format!(r#"[name="{field}"]"#)))
}
