use hubcast_store::TargetKind;

/// Identity of the session a command was invoked from, resolved by the host.
///
/// Exactly which of the ids are present depends on where the command ran:
/// a group chat carries a guild id, a direct message a user id, a broadcast
/// channel a channel id. Target resolution prefers them in that order.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub platform: String,
    pub guild_id: Option<String>,
    pub user_id: Option<String>,
    pub channel_id: Option<String>,
    pub admin: bool,
}

impl SessionContext {
    /// Resolves the subscription target and its kind for this session.
    pub fn resolve_target(&self) -> Option<(&str, TargetKind)> {
        if let Some(guild) = non_empty(self.guild_id.as_deref()) {
            return Some((guild, TargetKind::Group));
        }
        if let Some(user) = non_empty(self.user_id.as_deref()) {
            return Some((user, TargetKind::User));
        }
        if let Some(channel) = non_empty(self.channel_id.as_deref()) {
            return Some((channel, TargetKind::Channel));
        }
        None
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::SessionContext;
    use hubcast_store::TargetKind;

    #[test]
    fn guild_takes_precedence_over_user_and_channel() {
        let session = SessionContext {
            platform: "chat".to_string(),
            guild_id: Some("g1".to_string()),
            user_id: Some("u1".to_string()),
            channel_id: Some("c1".to_string()),
            admin: false,
        };
        assert_eq!(session.resolve_target(), Some(("g1", TargetKind::Group)));
    }

    #[test]
    fn falls_back_to_user_then_channel() {
        let mut session = SessionContext {
            platform: "chat".to_string(),
            user_id: Some("u1".to_string()),
            channel_id: Some("c1".to_string()),
            ..SessionContext::default()
        };
        assert_eq!(session.resolve_target(), Some(("u1", TargetKind::User)));

        session.user_id = None;
        assert_eq!(session.resolve_target(), Some(("c1", TargetKind::Channel)));

        session.channel_id = Some("  ".to_string());
        assert_eq!(session.resolve_target(), None);
    }
}
