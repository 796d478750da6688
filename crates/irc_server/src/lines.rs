//! Non-numeric message lines: the `:prefix COMMAND args` lines a handler broadcasts to a
//! channel or delivers directly to a peer, as opposed to the numeric replies in
//! `replies.rs` which always target the session that issued the command.

pub fn join_line(nick: &str, channel: &str) -> String {
    format!(":{nick} JOIN :{channel}")
}

pub fn part_line(nick: &str, channel: &str) -> String {
    format!(":{nick} PART :{channel}")
}

pub fn privmsg_line(nick: &str, user: &str, target: &str, text: &str) -> String {
    format!(":{nick}!~{user}@localhost PRIVMSG {target} :{text}")
}

pub fn notice_line(nick: &str, user: &str, target: &str, text: &str) -> String {
    format!(":{nick}!~{user}@localhost NOTICE {target} :{text}")
}

pub fn quit_line(nick: &str, reason: &str) -> String {
    format!(":{nick} QUIT :{reason}")
}

pub fn kick_line(kicker: &str, channel: &str, target: &str, reason: &str) -> String {
    format!(":{kicker} KICK {channel} {target} :{reason}")
}

pub fn topic_line(nick: &str, channel: &str, topic: &str) -> String {
    format!(":{nick} TOPIC {channel} :{topic}")
}

pub fn invite_line(inviter: &str, invited_nick: &str, channel: &str) -> String {
    format!(":{inviter} INVITE {invited_nick} :{channel}")
}

/// `:<nick> MODE <chan> <modes> [<args...>]`. `args` is already filtered by the caller —
/// any `k` change must have had its argument stripped before reaching here, since a
/// password must never leak onto the wire (SPEC_FULL.md §4.5).
pub fn channel_mode_line(nick: &str, channel: &str, modes: &str, args: &[String]) -> String {
    if args.is_empty() {
        format!(":{nick} MODE {channel} {modes}")
    } else {
        format!(":{nick} MODE {channel} {modes} {}", args.join(" "))
    }
}

pub fn user_mode_line(nick: &str, modes: &str) -> String {
    format!(":{nick} MODE {nick} {modes}")
}
