//! `JOIN`, `PART`, `KICK`, `MODE` (channel target), `TOPIC` and `INVITE`, per
//! `SPEC_FULL.md` §4.5.

use crate::channel::Channel;
use crate::handlers::{broadcast, misc, Context};
use crate::lines;
use crate::modes::{format_applied, parse_mode_string, ModeToken};
use crate::replies::{err_need_more_params_mode, IrcReply};
use crate::validation::is_valid_channel_name;

pub async fn handle_join(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    let Some(channels_arg) = args.first() else {
        ctx.reply(IrcReply::ErrNeedMoreParams {
            nick,
            command: "JOIN".to_string(),
        })
        .await;
        return;
    };

    let names: Vec<&str> = channels_arg.split(',').collect();
    let keys: Vec<&str> = args
        .get(1)
        .map(|k| k.split(',').collect())
        .unwrap_or_default();

    for (i, name) in names.into_iter().enumerate() {
        let key = keys.get(i).copied().unwrap_or("");
        join_one(ctx, &nick, name, key).await;
    }
}

async fn join_one(ctx: &Context<'_>, nick: &str, name: &str, key: &str) {
    if !is_valid_channel_name(name) {
        ctx.reply(IrcReply::ErrNoSuchChannel {
            nick: nick.to_string(),
            channel: name.to_string(),
        })
        .await;
        return;
    }

    // `max_channels_per_session` (SPEC_FULL.md §10.3) has no numeric reply of its own in
    // the closed table this server speaks, so a session at the cap is simply not moved
    // into the channel — the same silent-failure shape NOTICE already uses for an
    // unreachable target, rather than inventing an out-of-table reply code.
    let limit = ctx.registry.config.limits.max_channels_per_session;
    if limit > 0 && ctx.session.channels().await.len() >= limit {
        return;
    }

    let channel = ctx.registry.get_or_create_channel(name);

    if !join_checks_pass(ctx, nick, name, key, &channel).await {
        // The channel may have just been auto-created for this attempt and now sits
        // empty; don't let a rejected join leak it into the registry forever.
        if channel.member_count().await == 0 {
            ctx.registry.remove_channel(name);
        }
        return;
    }

    channel.add_member(ctx.session.id).await;
    ctx.session.record_join(name.to_string()).await;

    broadcast(ctx, &channel, &lines::join_line(nick, name), None).await;

    if let Some(topic) = channel.topic().await {
        ctx.reply(IrcReply::Topic {
            nick: nick.to_string(),
            channel: name.to_string(),
            topic,
        })
        .await;
    }

    let (modes, arg) = current_mode_summary(&channel).await;
    ctx.reply(IrcReply::ChannelModeIs {
        nick: nick.to_string(),
        channel: name.to_string(),
        modes,
        arg,
    })
    .await;

    let mut names = Vec::new();
    for member_id in channel.members().await {
        let Some(member) = ctx.registry.get_session(member_id) else {
            continue;
        };
        let Some(member_nick) = member.nickname().await else {
            continue;
        };
        let prefix = if channel.is_operator(member_id).await {
            "@"
        } else {
            ""
        };
        names.push(format!("{prefix}{member_nick}"));
    }
    ctx.reply(IrcReply::NamReply {
        nick: nick.to_string(),
        channel: name.to_string(),
        names,
    })
    .await;
    ctx.reply(IrcReply::EndOfNames {
        nick: nick.to_string(),
        channel: name.to_string(),
    })
    .await;
}

/// Runs the invite-only/key/limit gates a JOIN must clear, replying with the matching
/// numeric on the first failure. Returns `true` only if every gate passed.
async fn join_checks_pass(ctx: &Context<'_>, nick: &str, name: &str, key: &str, channel: &Channel) -> bool {
    if channel.invite_only().await && !channel.is_invited(ctx.session.id).await {
        ctx.reply(IrcReply::ErrInviteOnlyChan {
            nick: nick.to_string(),
            channel: name.to_string(),
        })
        .await;
        return false;
    }
    if let Some(password) = channel.password().await {
        if password != key {
            ctx.reply(IrcReply::ErrBadChannelKey {
                nick: nick.to_string(),
                channel: name.to_string(),
            })
            .await;
            return false;
        }
    }
    if let Some(limit) = channel.user_limit().await {
        if channel.member_count().await >= limit {
            ctx.reply(IrcReply::ErrChannelIsFull {
                nick: nick.to_string(),
                channel: name.to_string(),
            })
            .await;
            return false;
        }
    }
    true
}

pub async fn handle_part(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    let Some(channels_arg) = args.first() else {
        ctx.reply(IrcReply::ErrNeedMoreParams {
            nick,
            command: "PART".to_string(),
        })
        .await;
        return;
    };

    for name in channels_arg.split(',') {
        part_one(ctx, &nick, name).await;
    }
}

async fn part_one(ctx: &Context<'_>, nick: &str, name: &str) {
    let Some(channel) = ctx.registry.get_channel(name) else {
        ctx.reply(IrcReply::ErrNoSuchChannel {
            nick: nick.to_string(),
            channel: name.to_string(),
        })
        .await;
        return;
    };
    if !channel.is_member(ctx.session.id).await {
        ctx.reply(IrcReply::ErrNotOnChannel {
            nick: nick.to_string(),
            channel: name.to_string(),
        })
        .await;
        return;
    }

    broadcast(ctx, &channel, &lines::part_line(nick, name), None).await;
    if channel.remove_member(ctx.session.id).await {
        ctx.registry.remove_channel(name);
    }
    ctx.session.record_part(name).await;
}

pub async fn handle_kick(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    if args.len() < 2 {
        ctx.reply(IrcReply::ErrNeedMoreParams {
            nick,
            command: "KICK".to_string(),
        })
        .await;
        return;
    }
    let channel_name = &args[0];
    let target_nick = &args[1];
    let reason = args.get(2).cloned().unwrap_or_else(|| nick.clone());

    let Some(channel) = ctx.registry.get_channel(channel_name) else {
        ctx.reply(IrcReply::ErrNoSuchChannel {
            nick,
            channel: channel_name.clone(),
        })
        .await;
        return;
    };
    if !channel.is_operator(ctx.session.id).await {
        ctx.reply(IrcReply::ErrChanOPrivsNeeded {
            nick,
            channel: channel_name.clone(),
        })
        .await;
        return;
    }
    let Some(target) = ctx.registry.lookup_by_nickname(target_nick) else {
        ctx.reply(IrcReply::ErrNoSuchNick {
            nick,
            target: target_nick.clone(),
        })
        .await;
        return;
    };
    if !channel.is_member(target.id).await {
        ctx.reply(IrcReply::ErrUserNotInChannel {
            nick,
            target: target_nick.clone(),
            channel: channel_name.clone(),
        })
        .await;
        return;
    }

    broadcast(
        ctx,
        &channel,
        &lines::kick_line(&nick, channel_name, target_nick, &reason),
        None,
    )
    .await;
    if channel.remove_member(target.id).await {
        ctx.registry.remove_channel(channel_name);
    }
    target.record_part(channel_name).await;
}

pub async fn handle_topic(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    let Some(channel_name) = args.first() else {
        ctx.reply(IrcReply::ErrNeedMoreParams {
            nick,
            command: "TOPIC".to_string(),
        })
        .await;
        return;
    };

    let Some(channel) = ctx.registry.get_channel(channel_name) else {
        ctx.reply(IrcReply::ErrNoSuchChannel {
            nick,
            channel: channel_name.clone(),
        })
        .await;
        return;
    };
    if !channel.is_member(ctx.session.id).await {
        ctx.reply(IrcReply::ErrNotOnChannel {
            nick,
            channel: channel_name.clone(),
        })
        .await;
        return;
    }

    match args.get(1) {
        None => match channel.topic().await {
            Some(topic) => {
                ctx.reply(IrcReply::Topic {
                    nick,
                    channel: channel_name.clone(),
                    topic,
                })
                .await
            }
            None => {
                ctx.reply(IrcReply::NoTopic {
                    nick,
                    channel: channel_name.clone(),
                })
                .await
            }
        },
        Some(new_topic) => {
            if channel.topic_restricted().await && !channel.is_operator(ctx.session.id).await {
                ctx.reply(IrcReply::ErrChanOPrivsNeeded {
                    nick,
                    channel: channel_name.clone(),
                })
                .await;
                return;
            }
            // `max_topic_length` (SPEC_FULL.md §10.3) has no numeric reply of its own in
            // the closed table this server speaks, so an over-length topic is silently
            // truncated rather than rejected, the same silent-clamping shape already used
            // for `max_channels_per_session`.
            let limit = ctx.registry.config.limits.max_topic_length;
            let topic = if limit > 0 && new_topic.chars().count() > limit {
                new_topic.chars().take(limit).collect()
            } else {
                new_topic.clone()
            };
            channel.set_topic(Some(topic.clone())).await;
            broadcast(
                ctx,
                &channel,
                &lines::topic_line(&nick, channel_name, &topic),
                None,
            )
            .await;
        }
    }
}

pub async fn handle_invite(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    if args.len() < 2 {
        ctx.reply(IrcReply::ErrNeedMoreParams {
            nick,
            command: "INVITE".to_string(),
        })
        .await;
        return;
    }
    let target_nick = &args[0];
    let channel_name = &args[1];

    let Some(channel) = ctx.registry.get_channel(channel_name) else {
        ctx.reply(IrcReply::ErrNoSuchChannel {
            nick,
            channel: channel_name.clone(),
        })
        .await;
        return;
    };
    if !channel.is_member(ctx.session.id).await {
        ctx.reply(IrcReply::ErrNotOnChannel {
            nick,
            channel: channel_name.clone(),
        })
        .await;
        return;
    }
    let Some(target) = ctx.registry.lookup_by_nickname(target_nick) else {
        ctx.reply(IrcReply::ErrNoSuchNick {
            nick,
            target: target_nick.clone(),
        })
        .await;
        return;
    };
    if channel.is_member(target.id).await {
        ctx.reply(IrcReply::ErrUserOnChannel {
            nick,
            target: target_nick.clone(),
            channel: channel_name.clone(),
        })
        .await;
        return;
    }

    channel.add_invitee(target.id).await;
    let target_nick = target.nickname().await.unwrap_or_else(|| target_nick.clone());
    target.send_line(lines::invite_line(&nick, &target_nick, channel_name));
    ctx.reply(IrcReply::Inviting {
        nick,
        invited: target_nick,
        channel: channel_name.clone(),
    })
    .await;
}

/// `MODE <target> [<modes> [<args...>]]`: channel targets go through
/// [`handle_channel_mode`], anything else is a user mode change on the caller's own
/// nickname (SPEC_FULL.md §4.5).
pub async fn handle_mode(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    let Some(target) = args.first() else {
        ctx.reply(IrcReply::ErrNeedMoreParams {
            nick,
            command: "MODE".to_string(),
        })
        .await;
        return;
    };

    if is_valid_channel_name(target) {
        handle_channel_mode(ctx, target, &args[1..]).await;
    } else {
        misc::handle_user_mode(ctx, target, &args[1..]).await;
    }
}

/// Current `+`-prefixed mode string and trailing arg (password and/or limit) for a
/// channel, used both by the bare `MODE #chan` query and the burst JOIN sends on success.
async fn current_mode_summary(channel: &Channel) -> (String, Option<String>) {
    let mut modes = String::from("+");
    let mut trailing = Vec::new();
    if channel.invite_only().await {
        modes.push('i');
    }
    if channel.topic_restricted().await {
        modes.push('t');
    }
    if let Some(password) = channel.password().await {
        modes.push('k');
        trailing.push(password);
    }
    if let Some(limit) = channel.user_limit().await {
        modes.push('l');
        trailing.push(limit.to_string());
    }
    let arg = (!trailing.is_empty()).then(|| trailing.join(" "));
    (modes, arg)
}

async fn handle_channel_mode(ctx: &Context<'_>, channel_name: &str, rest: &[String]) {
    let nick = ctx.current_nick().await;
    let Some(channel) = ctx.registry.get_channel(channel_name) else {
        ctx.reply(IrcReply::ErrNoSuchChannel {
            nick,
            channel: channel_name.to_string(),
        })
        .await;
        return;
    };
    if !channel.is_operator(ctx.session.id).await {
        ctx.reply(IrcReply::ErrChanOPrivsNeeded {
            nick,
            channel: channel_name.to_string(),
        })
        .await;
        return;
    }

    let Some(mode_string) = rest.first() else {
        let (modes, arg) = current_mode_summary(&channel).await;
        ctx.reply(IrcReply::ChannelModeIs {
            nick,
            channel: channel_name.to_string(),
            modes,
            arg,
        })
        .await;
        return;
    };

    let tokens = parse_mode_string(mode_string);
    let mut extra_args = rest[1..].iter();
    let mut applied: Vec<ModeToken> = Vec::new();
    let mut applied_args: Vec<String> = Vec::new();

    for tok in tokens {
        match tok.letter {
            'i' => {
                channel.set_invite_only(tok.sign == '+').await;
                applied.push(tok);
            }
            't' => {
                channel.set_topic_restricted(tok.sign == '+').await;
                applied.push(tok);
            }
            'k' => {
                if tok.sign == '+' {
                    let Some(password) = extra_args.next() else {
                        ctx.session.send_line(err_need_more_params_mode(
                            &ctx.registry.server_name,
                            &nick,
                            'k',
                        ));
                        continue;
                    };
                    channel.set_password(Some(password.clone())).await;
                } else {
                    channel.set_password(None).await;
                }
                applied.push(tok);
            }
            'l' => {
                if tok.sign == '+' {
                    let parsed_limit = extra_args.next().and_then(|raw| raw.parse::<usize>().ok());
                    let Some(limit) = parsed_limit.filter(|l| *l > 0) else {
                        ctx.session.send_line(err_need_more_params_mode(
                            &ctx.registry.server_name,
                            &nick,
                            'l',
                        ));
                        continue;
                    };
                    channel.set_user_limit(Some(limit)).await;
                    applied_args.push(limit.to_string());
                } else {
                    channel.set_user_limit(None).await;
                }
                applied.push(tok);
            }
            'o' => {
                let Some(target_nick) = extra_args.next() else {
                    ctx.session.send_line(err_need_more_params_mode(
                        &ctx.registry.server_name,
                        &nick,
                        'o',
                    ));
                    continue;
                };
                let Some(target) = ctx.registry.lookup_by_nickname(target_nick) else {
                    ctx.reply(IrcReply::ErrNoSuchNick {
                        nick: nick.clone(),
                        target: target_nick.clone(),
                    })
                    .await;
                    continue;
                };
                if !channel.is_member(target.id).await {
                    ctx.reply(IrcReply::ErrUserNotInChannel {
                        nick: nick.clone(),
                        target: target_nick.clone(),
                        channel: channel_name.to_string(),
                    })
                    .await;
                    continue;
                }
                if tok.sign == '+' {
                    channel.grant_operator(target.id).await;
                } else {
                    channel.revoke_operator(target.id).await;
                }
                applied_args.push(target_nick.clone());
                applied.push(tok);
            }
            _ => {}
        }
    }

    if applied.is_empty() {
        return;
    }

    // `k`'s own argument is never pushed into `applied_args` above, so the password
    // never reaches the broadcast; every other changed mode's argument still does.
    let line = lines::channel_mode_line(&nick, channel_name, &format_applied(&applied), &applied_args);
    broadcast(ctx, &channel, &line, None).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::registry::Registry;
    use crate::session::{RegistrationState, Session};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    async fn registered_session(registry: &Registry, nick: &str) -> Arc<Session> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let session = Arc::new(Session::new(crate::types::next_session_id(), addr, tx));
        registry.insert_session(Arc::clone(&session));
        registry.reserve_nickname(session.id, nick).unwrap();
        session.set_nickname(nick.to_string()).await;
        session.set_user(nick.to_string(), "Real Name".to_string()).await;
        session.set_state(RegistrationState::Authed).await;
        session.maybe_complete_registration().await;
        session
    }

    #[tokio::test]
    async fn join_respects_max_channels_per_session() {
        let mut config = Config::default();
        config.limits.max_channels_per_session = 1;
        let registry = Registry::new("irc.test".to_string(), "secret".to_string(), config);
        let session = registered_session(&registry, "alice").await;
        let ctx = Context { registry: &registry, session: &session };

        handle_join(&ctx, &["#one".to_string()]).await;
        assert!(session.channels().await.contains("#one"));

        handle_join(&ctx, &["#two".to_string()]).await;
        assert!(!session.channels().await.contains("#two"));
        assert!(
            registry.get_channel("#two").is_none(),
            "a join rejected for the channel cap should not leave an orphaned channel behind"
        );
    }

    #[tokio::test]
    async fn rejected_join_does_not_leak_an_empty_channel() {
        let registry = Registry::new(
            "irc.test".to_string(),
            "secret".to_string(),
            Config::default(),
        );
        let alice = registered_session(&registry, "alice").await;
        let alice_ctx = Context { registry: &registry, session: &alice };
        handle_join(&alice_ctx, &["#locked".to_string()]).await;
        let locked = registry.get_or_create_channel("#locked");
        locked.set_password(Some("correct".to_string())).await;

        let bob = registered_session(&registry, "bob").await;
        let bob_ctx = Context { registry: &registry, session: &bob };
        handle_join(&bob_ctx, &["#locked".to_string(), "wrong".to_string()]).await;

        assert!(
            registry.get_channel("#locked").is_some(),
            "a channel with existing members must never be removed by someone else's failed join"
        );
        assert!(!bob.channels().await.contains("#locked"));
    }

    #[tokio::test]
    async fn first_ever_join_rejected_for_a_bad_key_does_not_leak_the_channel() {
        let registry = Registry::new(
            "irc.test".to_string(),
            "secret".to_string(),
            Config::default(),
        );
        // A channel nobody has ever joined, but which already carries a password (as
        // if provisioned by external tooling before any client connected). Bob's
        // keyless JOIN is the first touch this channel has ever had from a handler.
        let vip = registry.get_or_create_channel("#vip");
        vip.set_password(Some("shh".to_string())).await;

        let bob = registered_session(&registry, "bob").await;
        let ctx = Context { registry: &registry, session: &bob };
        handle_join(&ctx, &["#vip".to_string()]).await;

        assert!(!bob.channels().await.contains("#vip"));
        assert!(
            registry.get_channel("#vip").is_none(),
            "a channel that nobody has ever successfully joined must not linger in the registry"
        );
    }

    #[tokio::test]
    async fn topic_over_the_configured_limit_is_truncated_not_rejected() {
        let mut config = Config::default();
        config.limits.max_topic_length = 5;
        let registry = Registry::new("irc.test".to_string(), "secret".to_string(), config);
        let alice = registered_session(&registry, "alice").await;
        let ctx = Context { registry: &registry, session: &alice };
        handle_join(&ctx, &["#room".to_string()]).await;

        handle_topic(&ctx, &["#room".to_string(), "way too long".to_string()]).await;

        let channel = registry.get_channel("#room").unwrap();
        assert_eq!(channel.topic().await.as_deref(), Some("way t"));
    }
}
