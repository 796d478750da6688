//! `PRIVMSG` and `NOTICE`, per `SPEC_FULL.md` §4.5. Both resolve a target (channel or
//! nickname) and deliver one line; `NOTICE` never produces an error reply, per RFC 2812.

use crate::handlers::{broadcast, Context};
use crate::lines;
use crate::replies::IrcReply;

pub async fn handle_privmsg(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    let Some(target) = args.first() else {
        ctx.reply(IrcReply::ErrNoRecipient {
            nick,
            command: "PRIVMSG".to_string(),
        })
        .await;
        return;
    };
    let text = args[1..].join(" ");
    deliver(ctx, &nick, target, &text, true).await;
}

pub async fn handle_notice(ctx: &Context<'_>, args: &[String]) {
    let Some(target) = args.first() else {
        return;
    };
    let nick = ctx.current_nick().await;
    let text = args[1..].join(" ");
    deliver(ctx, &nick, target, &text, false).await;
}

/// `report_errors` distinguishes PRIVMSG (numeric error replies) from NOTICE (silent
/// failure on an unreachable target).
async fn deliver(ctx: &Context<'_>, nick: &str, target: &str, text: &str, report_errors: bool) {
    let username = ctx.session.username().await.unwrap_or_default();

    if target.starts_with('#') || target.starts_with('&') {
        let member_channel = match ctx.registry.get_channel(target) {
            Some(channel) if channel.is_member(ctx.session.id).await => Some(channel),
            _ => None,
        };
        let Some(channel) = member_channel else {
            if report_errors {
                ctx.reply(IrcReply::ErrCannotSendToChan {
                    nick: nick.to_string(),
                    channel: target.to_string(),
                })
                .await;
            }
            return;
        };
        let line = if report_errors {
            lines::privmsg_line(nick, &username, target, text)
        } else {
            lines::notice_line(nick, &username, target, text)
        };
        broadcast(ctx, &channel, &line, Some(ctx.session.id)).await;
        return;
    }

    let Some(recipient) = ctx.registry.lookup_by_nickname(target) else {
        if report_errors {
            ctx.reply(IrcReply::ErrNoSuchNick {
                nick: nick.to_string(),
                target: target.to_string(),
            })
            .await;
        }
        return;
    };
    let line = if report_errors {
        lines::privmsg_line(nick, &username, target, text)
    } else {
        lines::notice_line(nick, &username, target, text)
    };
    recipient.send_line(line);
}
