//! Command dispatch: registration-state gating (`SPEC_FULL.md` §4.3) followed by routing
//! to the per-command handler (§4.5), grouped into submodules by concern
//! (registration, channels, messaging, misc).

pub mod channels;
pub mod messaging;
pub mod misc;
pub mod registration;

use std::sync::Arc;

use crate::channel::Channel;
use crate::message::ParsedCommand;
use crate::registry::Registry;
use crate::replies::IrcReply;
use crate::session::{RegistrationState, Session};
use crate::types::SessionId;

/// Everything a handler needs: the shared registry and the session that sent the
/// command currently being processed.
pub struct Context<'a> {
    pub registry: &'a Registry,
    pub session: &'a Arc<Session>,
}

impl Context<'_> {
    /// The identifier a numeric reply's `<target>` slot should use: the session's own
    /// nickname once it has one, `*` before that (RFC 2812's placeholder for an
    /// unregistered client).
    pub async fn current_nick(&self) -> String {
        self.session
            .nickname()
            .await
            .unwrap_or_else(|| "*".to_string())
    }

    pub async fn reply(&self, reply: IrcReply) {
        self.session
            .send_line(reply.format(&self.registry.server_name));
    }
}

/// Delivers `line` to every current member of `channel`, optionally skipping `exclude`.
/// Membership is read as a handle snapshot and each handle re-resolved against the
/// registry at send time (`SPEC_FULL.md` §5): a member that disconnects mid-broadcast is
/// simply absent from the registry by the time its turn comes, not a dangling access.
pub async fn broadcast(ctx: &Context<'_>, channel: &Channel, line: &str, exclude: Option<SessionId>) {
    for member_id in channel.members().await {
        if Some(member_id) == exclude {
            continue;
        }
        if let Some(member) = ctx.registry.get_session(member_id) {
            member.send_line(line.to_string());
        }
    }
}

/// Applies the registration-state gating of §4.3, then routes to the matching handler.
/// Returns `true` if the connection should be closed afterward (QUIT).
pub async fn dispatch(ctx: &Context<'_>, parsed: ParsedCommand) -> bool {
    let state = ctx.session.state().await;
    let command = parsed.command.as_str();

    match state {
        RegistrationState::New if command != "PASS" => {
            let nick = ctx.current_nick().await;
            ctx.reply(IrcReply::ErrPasswdRequired { nick }).await;
            return false;
        }
        RegistrationState::Authed if !matches!(command, "PASS" | "NICK" | "USER") => {
            let nick = ctx.current_nick().await;
            ctx.reply(IrcReply::ErrNotRegistered { nick }).await;
            return false;
        }
        _ => {}
    }

    match command {
        "PASS" => {
            registration::handle_pass(ctx, &parsed.args).await;
            false
        }
        "NICK" => {
            registration::handle_nick(ctx, &parsed.args).await;
            false
        }
        "USER" => {
            registration::handle_user(ctx, &parsed.args).await;
            false
        }
        "JOIN" => {
            channels::handle_join(ctx, &parsed.args).await;
            false
        }
        "PART" => {
            channels::handle_part(ctx, &parsed.args).await;
            false
        }
        "KICK" => {
            channels::handle_kick(ctx, &parsed.args).await;
            false
        }
        "MODE" => {
            channels::handle_mode(ctx, &parsed.args).await;
            false
        }
        "TOPIC" => {
            channels::handle_topic(ctx, &parsed.args).await;
            false
        }
        "INVITE" => {
            channels::handle_invite(ctx, &parsed.args).await;
            false
        }
        "PRIVMSG" => {
            messaging::handle_privmsg(ctx, &parsed.args).await;
            false
        }
        "NOTICE" => {
            messaging::handle_notice(ctx, &parsed.args).await;
            false
        }
        "QUIT" => {
            misc::handle_quit(ctx, &parsed.args).await;
            true
        }
        other => {
            if state == RegistrationState::Registered {
                let nick = ctx.current_nick().await;
                ctx.reply(IrcReply::ErrUnknownCommand {
                    nick,
                    command: other.to_string(),
                })
                .await;
            }
            false
        }
    }
}
