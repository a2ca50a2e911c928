use crate::types::{DigestError, DigestMessage, Result};
use serde::{Deserialize, Serialize};

pub const DINGTALK_API: &str = "https://oapi.dingtalk.com/robot/send";
const DINGTALK_SCHEME: &str = "dingtalk://";

/// Normalizes a DingTalk robot destination to its HTTPS send URL.
///
/// Accepts the `dingtalk://<token>` shorthand and the raw
/// `https://oapi.dingtalk.com/robot/send?access_token=...` form (any signing
/// parameters on the latter are kept).
pub fn robot_url(raw: &str) -> Option<String> {
    if let Some(rest) = raw.strip_prefix(DINGTALK_SCHEME) {
        let token = rest.split(['/', '?']).next().unwrap_or_default();
        if token.is_empty() {
            return None;
        }
        return Some(format!("{}?access_token={}", DINGTALK_API, token));
    }

    if raw.contains("oapi.dingtalk.com") {
        let token = raw
            .split("access_token=")
            .nth(1)
            .and_then(|t| t.split('&').next())
            .unwrap_or_default();
        if !token.is_empty() {
            return Some(raw.to_string());
        }
    }

    None
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MarkdownBody {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActionCardBody {
    pub title: String,
    pub text: String,
    #[serde(rename = "btnOrientation")]
    pub btn_orientation: String,
    #[serde(rename = "singleTitle")]
    pub single_title: String,
    #[serde(rename = "singleURL")]
    pub single_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "msgtype")]
pub enum DingTalkPayload {
    #[serde(rename = "markdown")]
    Markdown { markdown: MarkdownBody },
    #[serde(rename = "actionCard")]
    ActionCard {
        #[serde(rename = "actionCard")]
        action_card: ActionCardBody,
    },
}

impl DingTalkPayload {
    /// Action card when the message carries a link, Markdown otherwise.
    pub fn for_message(message: &DigestMessage, button_title: &str) -> Self {
        let mut body = String::new();
        if let Some(image) = &message.image_url {
            body.push_str(&format!("![cover]({})\n\n", image));
        }
        body.push_str(&message.text);

        match &message.action_url {
            Some(action_url) => DingTalkPayload::ActionCard {
                action_card: ActionCardBody {
                    title: message.title.clone(),
                    text: body,
                    btn_orientation: "0".to_string(),
                    single_title: button_title.to_string(),
                    single_url: action_url.clone(),
                },
            },
            None => DingTalkPayload::Markdown {
                markdown: MarkdownBody {
                    title: message.title.clone(),
                    // Keyword-guarded robots only see `text`, so repeat the title there.
                    text: format!("# {}\n\n{}", message.title, body),
                },
            },
        }
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            DingTalkPayload::Markdown { .. } => "markdown",
            DingTalkPayload::ActionCard { .. } => "actionCard",
        }
    }
}

#[derive(Debug, Deserialize)]
struct DingTalkReply {
    errcode: Option<i64>,
    errmsg: Option<String>,
}

/// DingTalk answers 200 even for rejected messages; the verdict is `errcode`.
pub fn check_reply(status: u16, body: &str) -> Result<()> {
    if !(200..300).contains(&status) {
        return Err(DigestError::Webhook(format!("HTTP {}: {}", status, body)));
    }

    let reply: DingTalkReply = serde_json::from_str(body)
        .map_err(|e| DigestError::Webhook(format!("unreadable reply {:?}: {}", body, e)))?;

    match reply.errcode {
        Some(0) => Ok(()),
        code => Err(DigestError::Webhook(format!(
            "errcode {:?}: {}",
            code,
            reply.errmsg.unwrap_or_default()
        ))),
    }
}
