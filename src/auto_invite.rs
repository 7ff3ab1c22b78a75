use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::InviteConfig;
use crate::gewe::GroupInviter;
use crate::matcher::KeywordMatcher;
use crate::platform::{Context, ContextType, EventAction, EventContext, Reply};
use crate::plugin::{Plugin, PluginMeta};

pub const INVITED_REPLY: &str = "已邀请您加入群聊，请查看群邀请通知";
const INVITE_FAILED_PREFIX: &str = "邀请进群失败";

const META: PluginMeta = PluginMeta {
    name: "AutoInviteGroup",
    priority: 200,
    hidden: false,
    enabled: true,
    desc: "自动邀请用户进群插件",
    version: "0.1.0",
    author: "Danny",
};

/// Invites the sender into a group chat when their message hits a
/// configured keyword. The first matching mapping with a group wins.
pub struct AutoInviteGroup {
    meta: PluginMeta,
    config: InviteConfig,
    matcher: KeywordMatcher,
    inviter: Arc<dyn GroupInviter>,
}

impl AutoInviteGroup {
    pub fn new(config: InviteConfig, inviter: Arc<dyn GroupInviter>) -> Self {
        info!(
            "AutoInviteGroup ready: auto_invite={}, fuzzy_match={}, {} keyword mapping(s)",
            config.auto_invite,
            config.fuzzy_match,
            config.keyword_mappings.len()
        );
        Self {
            meta: META,
            matcher: KeywordMatcher::new(config.fuzzy_match),
            config,
            inviter,
        }
    }

    /// Decide what to reply to `context`. `None` leaves the event to the
    /// rest of the chain.
    pub async fn handle(&self, context: &Context) -> Option<Reply> {
        if !self.config.auto_invite {
            info!("Auto invite is disabled");
            return None;
        }

        if context.kind != ContextType::Text {
            info!("Skipping non-text message ({:?})", context.kind);
            return None;
        }

        if context.msg.is_none() {
            info!("No message object attached, skipping");
            return None;
        }

        let Some(sender_id) = context.sender_id() else {
            error!("Could not resolve sender id, skipping");
            return None;
        };

        for mapping in &self.config.keyword_mappings {
            if mapping.keyword.is_empty() {
                continue;
            }
            if !self.matcher.matches(&mapping.keyword, &context.content) {
                continue;
            }
            if mapping.group_id.is_empty() {
                info!(
                    "Keyword '{}' matched but has no group id, skipping",
                    mapping.keyword
                );
                continue;
            }

            info!(
                "Keyword '{}' matched, inviting {} into {}",
                mapping.keyword, sender_id, mapping.group_id
            );

            return match self
                .inviter
                .invite(sender_id, &mapping.group_id, &mapping.reason)
                .await
            {
                Ok(_) => Some(Reply::text(INVITED_REPLY)),
                Err(e) => {
                    error!(
                        "Failed to invite {} into {}: {}",
                        sender_id, mapping.group_id, e
                    );
                    Some(Reply::error(format!("{}: {}", INVITE_FAILED_PREFIX, e)))
                }
            };
        }

        None
    }
}

#[async_trait]
impl Plugin for AutoInviteGroup {
    fn meta(&self) -> &PluginMeta {
        &self.meta
    }

    fn help_text(&self, verbose: bool) -> String {
        let mut help = String::from("自动邀请用户进群插件\n");
        if verbose {
            help.push_str("功能：当用户发送包含特定关键词的消息时，自动邀请其进入指定群聊\n");
            help.push_str("配置：\n");
            help.push_str("- auto_invite: 是否开启自动邀请功能\n");
            help.push_str("- keyword_mappings: 关键词与群ID的映射关系\n");
            help.push_str("- invite_after_accept: 是否在添加好友成功后自动邀请进群\n");
            help.push_str("- fuzzy_match: 是否启用模糊匹配\n");
            help.push_str("- match_threshold: 匹配阈值");
        }
        help
    }

    async fn on_handle_context(&self, event: &mut EventContext) {
        if let Some(reply) = self.handle(&event.context).await {
            event.reply = Some(reply);
            event.action = EventAction::BreakPass;
        }
    }
}
