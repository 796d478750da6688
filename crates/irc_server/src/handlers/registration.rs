//! `PASS`/`NICK`/`USER` and the shared registration-completion trigger, per
//! `SPEC_FULL.md` §4.3.

use crate::handlers::Context;
use crate::replies::IrcReply;
use crate::session::RegistrationState;
use crate::validation::is_valid_nickname;

/// If the session now has both a nickname and a username and was only `Authed`,
/// transitions it to `Registered` and sends the welcome reply.
async fn maybe_welcome(ctx: &Context<'_>) {
    if ctx.session.maybe_complete_registration().await {
        let nick = ctx.session.nickname().await.unwrap_or_default();
        let motd = ctx.registry.config.server.motd.clone();
        ctx.reply(IrcReply::Welcome { nick, motd }).await;
    }
}

pub async fn handle_pass(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    if ctx.session.state().await != RegistrationState::New {
        ctx.reply(IrcReply::ErrAlreadyRegistred { nick }).await;
        return;
    }
    let given = args.first().map(String::as_str).unwrap_or("");
    if ctx.registry.check_password(given) {
        ctx.session.set_state(RegistrationState::Authed).await;
    } else {
        ctx.reply(IrcReply::ErrPasswdMismatch { nick }).await;
    }
}

pub async fn handle_nick(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    let Some(candidate) = args.first() else {
        ctx.reply(IrcReply::ErrNoNicknameGiven { nick }).await;
        return;
    };

    if !is_valid_nickname(candidate) {
        ctx.reply(IrcReply::ErrErroneusNickname {
            nick,
            attempted: candidate.clone(),
        })
        .await;
        return;
    }

    if ctx
        .registry
        .reserve_nickname(ctx.session.id, candidate)
        .is_err()
    {
        ctx.reply(IrcReply::ErrNicknameInUse {
            nick,
            attempted: candidate.clone(),
        })
        .await;
        return;
    }

    ctx.session.set_nickname(candidate.clone()).await;
    maybe_welcome(ctx).await;
}

pub async fn handle_user(ctx: &Context<'_>, args: &[String]) {
    let nick = ctx.current_nick().await;
    if args.len() < 4 {
        ctx.reply(IrcReply::ErrNeedMoreParams {
            nick,
            command: "USER".to_string(),
        })
        .await;
        return;
    }
    if ctx.session.state().await == RegistrationState::Registered {
        ctx.reply(IrcReply::ErrAlreadyRegistred { nick }).await;
        return;
    }

    ctx.session.set_user(args[0].clone(), args[3].clone()).await;
    maybe_welcome(ctx).await;
}
