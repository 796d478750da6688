//! `QUIT` and the user-targeted form of `MODE`, per `SPEC_FULL.md` §4.5.

use crate::handlers::{broadcast, Context};
use crate::lines;
use crate::modes::{format_applied, parse_mode_string, ModeToken};
use crate::replies::IrcReply;

const USER_MODE_LETTERS: [char; 5] = ['i', 'o', 'w', 'r', 's'];

/// Broadcasts a QUIT line to every channel the session belongs to (excluding itself),
/// then drops its membership everywhere. Does not itself close the connection — the
/// reactor does that once `dispatch` reports the command as QUIT.
pub async fn handle_quit(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    let reason = args.first().cloned().unwrap_or_else(|| "Client Quit".to_string());
    let line = lines::quit_line(&nick, &reason);

    for name in ctx.session.channels().await {
        if let Some(channel) = ctx.registry.get_channel(&name) {
            broadcast(ctx, &channel, &line, Some(ctx.session.id)).await;
            if channel.remove_member(ctx.session.id).await {
                ctx.registry.remove_channel(&name);
            }
        }
        ctx.session.record_part(&name).await;
    }
}

/// `MODE <nick> [<modes>]`: only a session's own nickname is a legal target (`502`
/// otherwise); `+/-iowrs` toggle the session's own user-mode letters.
pub async fn handle_user_mode(ctx: &Context<'_>, target_nick: &str, rest: &[String]) {
    let nick = ctx.current_nick().await;
    if target_nick != nick {
        ctx.reply(IrcReply::ErrUsersDontMatch { nick }).await;
        return;
    }

    let Some(mode_string) = rest.first() else {
        let mut letters: Vec<char> = ctx.session.user_modes().await.into_iter().collect();
        letters.sort_unstable();
        let modes = if letters.is_empty() {
            String::new()
        } else {
            format!("+{}", letters.into_iter().collect::<String>())
        };
        ctx.reply(IrcReply::UModeIs { nick, modes }).await;
        return;
    };

    let mut applied: Vec<ModeToken> = Vec::new();
    for tok in parse_mode_string(mode_string) {
        if !USER_MODE_LETTERS.contains(&tok.letter) {
            continue;
        }
        ctx.session.apply_user_mode(tok.sign, tok.letter).await;
        applied.push(tok);
    }

    if !applied.is_empty() {
        ctx.session
            .send_line(lines::user_mode_line(&nick, &format_applied(&applied)));
    }
}
