use domain::{ActorId, AttachmentRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAlert {
    pub actor: ActorId,
    pub reason: String,
    pub attachment: Option<AttachmentRef>,
}

/// 解析 `!alert <user-id> <reason...> [attachment-url]`
// None = 根本不是这条指令；Some(Err) = 是这条指令但输入不合法，
// 错误文案直接回给操作者
pub fn parse_alert_command(prefix: &str, body: &str) -> Option<Result<ParsedAlert, String>> {
    let rest = body.trim().strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        // 比如 "!alerting"，是别的指令
        return None;
    }

    let mut tokens: Vec<&str> = rest.split_whitespace().collect();
    let id_token = match tokens.first() {
        Some(t) => *t,
        None => return Some(Err(usage(prefix))),
    };
    let actor = match ActorId::new(id_token) {
        Ok(actor) => actor,
        Err(msg) => return Some(Err(msg)),
    };
    tokens.remove(0);

    let attachment = match tokens.last() {
        Some(t) if is_attachment_ref(t) => {
            let attachment = AttachmentRef::new(*t);
            tokens.pop();
            Some(attachment)
        }
        _ => None,
    };

    let reason = tokens.join(" ");
    if reason.is_empty() {
        return Some(Err(
            "A reason for the alert is required. Tell the other moderators why this \
             user is being flagged."
                .to_string(),
        ));
    }

    Some(Ok(ParsedAlert {
        actor,
        reason,
        attachment,
    }))
}

fn is_attachment_ref(token: &str) -> bool {
    token.starts_with("https://") || token.starts_with("http://") || token.starts_with("mxc://")
}

fn usage(prefix: &str) -> String {
    format!("Usage: {} <user-id> <reason...> [attachment-url]", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "!alert";

    #[test]
    fn parses_id_and_reason() {
        let parsed = parse_alert_command(PREFIX, "!alert 145582654857805825 ban evasion across servers")
            .unwrap()
            .unwrap();
        assert_eq!(parsed.actor.as_str(), "145582654857805825");
        assert_eq!(parsed.reason, "ban evasion across servers");
        assert_eq!(parsed.attachment, None);
    }

    #[test]
    fn trailing_url_becomes_the_attachment() {
        let parsed = parse_alert_command(
            PREFIX,
            "!alert 42 spamming invites mxc://fed.example/screenshot",
        )
        .unwrap()
        .unwrap();
        assert_eq!(parsed.reason, "spamming invites");
        assert_eq!(
            parsed.attachment,
            Some(AttachmentRef::new("mxc://fed.example/screenshot"))
        );
    }

    #[test]
    fn non_numeric_id_gets_the_corrective_message() {
        let err = parse_alert_command(PREFIX, "!alert luxpiggy being a menace")
            .unwrap()
            .unwrap_err();
        assert!(err.contains("user *ID*"));
    }

    #[test]
    fn missing_reason_is_rejected() {
        let err = parse_alert_command(PREFIX, "!alert 42").unwrap().unwrap_err();
        assert!(err.contains("reason"));
    }

    #[test]
    fn unrelated_messages_are_not_commands() {
        assert!(parse_alert_command(PREFIX, "morning all").is_none());
        assert!(parse_alert_command(PREFIX, "!alerting 42 hmm").is_none());
    }

    #[test]
    fn bare_prefix_explains_usage() {
        let err = parse_alert_command(PREFIX, "!alert").unwrap().unwrap_err();
        assert!(err.starts_with("Usage:"));
    }

    #[test]
    fn url_only_still_needs_a_reason() {
        let err = parse_alert_command(PREFIX, "!alert 42 https://fed.example/proof.png")
            .unwrap()
            .unwrap_err();
        assert!(err.contains("reason"));
    }
}
