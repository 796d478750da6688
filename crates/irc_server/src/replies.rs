//! Numeric reply formatting. Every variant corresponds to one row of the table in
//! `SPEC_FULL.md` §6. Formatting never errors — callers pick the right variant for the
//! situation and this module only knows how to lay bytes on the wire.

use crate::constants::*;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IrcReply {
    Welcome { nick: String, motd: String },
    UModeIs { nick: String, modes: String },
    ChannelModeIs { nick: String, channel: String, modes: String, arg: Option<String> },
    NoTopic { nick: String, channel: String },
    Topic { nick: String, channel: String, topic: String },
    Inviting { nick: String, invited: String, channel: String },
    NamReply { nick: String, channel: String, names: Vec<String> },
    EndOfNames { nick: String, channel: String },

    ErrNoSuchNick { nick: String, target: String },
    ErrNoSuchChannel { nick: String, channel: String },
    ErrCannotSendToChan { nick: String, channel: String },
    ErrNoRecipient { nick: String, command: String },
    ErrUnknownCommand { nick: String, command: String },
    ErrNoNicknameGiven { nick: String },
    ErrErroneusNickname { nick: String, attempted: String },
    ErrNicknameInUse { nick: String, attempted: String },
    ErrUserNotInChannel { nick: String, target: String, channel: String },
    ErrNotOnChannel { nick: String, channel: String },
    ErrUserOnChannel { nick: String, target: String, channel: String },
    ErrNotRegistered { nick: String },
    ErrNeedMoreParams { nick: String, command: String },
    ErrAlreadyRegistred { nick: String },
    ErrPasswdRequired { nick: String },
    ErrPasswdMismatch { nick: String },
    ErrChannelIsFull { nick: String, channel: String },
    ErrInviteOnlyChan { nick: String, channel: String },
    ErrBadChannelKey { nick: String, channel: String },
    ErrChanOPrivsNeeded { nick: String, channel: String },
    ErrUsersDontMatch { nick: String },
}

impl IrcReply {
    /// Formats the reply as a full wire line, `:server NNN target args :text`, without a
    /// trailing `\r\n` (the writer task appends line terminators).
    pub fn format(&self, server_name: &str) -> String {
        match self {
            IrcReply::Welcome { nick, motd } => {
                format!(":{server_name} {RPL_WELCOME:03} {nick} :{motd} {nick}")
            }
            IrcReply::UModeIs { nick, modes } => {
                format!(":{server_name} {RPL_UMODEIS:03} {nick} :{modes}")
            }
            IrcReply::ChannelModeIs { nick, channel, modes, arg } => match arg {
                Some(arg) => format!(
                    ":{server_name} {RPL_CHANNELMODEIS:03} {nick} {channel} {modes} {arg}"
                ),
                None => {
                    format!(":{server_name} {RPL_CHANNELMODEIS:03} {nick} {channel} {modes}")
                }
            },
            IrcReply::NoTopic { nick, channel } => {
                format!(":{server_name} {RPL_NOTOPIC:03} {nick} {channel} :No topic is set")
            }
            IrcReply::Topic { nick, channel, topic } => {
                format!(":{server_name} {RPL_TOPIC:03} {nick} {channel} :{topic}")
            }
            IrcReply::Inviting { nick, invited, channel } => {
                format!(":{server_name} {RPL_INVITING:03} {nick} {invited} {channel}")
            }
            IrcReply::NamReply { nick, channel, names } => {
                let names = names.join(" ");
                format!(":{server_name} {RPL_NAMREPLY:03} {nick} = {channel} :{names}")
            }
            IrcReply::EndOfNames { nick, channel } => format!(
                ":{server_name} {RPL_ENDOFNAMES:03} {nick} {channel} :End of /NAMES list"
            ),
            IrcReply::ErrNoSuchNick { nick, target } => format!(
                ":{server_name} {ERR_NOSUCHNICK:03} {nick} {target} :No such nick/channel"
            ),
            IrcReply::ErrNoSuchChannel { nick, channel } => format!(
                ":{server_name} {ERR_NOSUCHCHANNEL:03} {nick} {channel} :No such channel"
            ),
            IrcReply::ErrCannotSendToChan { nick, channel } => format!(
                ":{server_name} {ERR_CANNOTSENDTOCHAN:03} {nick} {channel} :Cannot send to channel"
            ),
            IrcReply::ErrNoRecipient { nick, command } => format!(
                ":{server_name} {ERR_NORECIPIENT:03} {nick} :No recipient given ({command})"
            ),
            IrcReply::ErrUnknownCommand { nick, command } => format!(
                ":{server_name} {ERR_UNKNOWNCOMMAND:03} {nick} {command} :Unknown command"
            ),
            IrcReply::ErrNoNicknameGiven { nick } => {
                format!(":{server_name} {ERR_NONICKNAMEGIVEN:03} {nick} :No nickname given")
            }
            IrcReply::ErrErroneusNickname { nick, attempted } => format!(
                ":{server_name} {ERR_ERRONEUSNICKNAME:03} {nick} {attempted} :Erroneous nickname"
            ),
            IrcReply::ErrNicknameInUse { nick, attempted } => format!(
                ":{server_name} {ERR_NICKNAMEINUSE:03} {nick} {attempted} :Nickname is already in use"
            ),
            IrcReply::ErrUserNotInChannel { nick, target, channel } => format!(
                ":{server_name} {ERR_USERNOTINCHANNEL:03} {nick} {target} {channel} :They aren't on that channel"
            ),
            IrcReply::ErrNotOnChannel { nick, channel } => format!(
                ":{server_name} {ERR_NOTONCHANNEL:03} {nick} {channel} :You're not on that channel"
            ),
            IrcReply::ErrUserOnChannel { nick, target, channel } => format!(
                ":{server_name} {ERR_USERONCHANNEL:03} {nick} {target} {channel} :is already on channel"
            ),
            IrcReply::ErrNotRegistered { nick } => format!(
                ":{server_name} {ERR_NOTREGISTERED:03} {nick} :You have not registered"
            ),
            IrcReply::ErrNeedMoreParams { nick, command } => format!(
                ":{server_name} {ERR_NEEDMOREPARAMS:03} {nick} {command} :Not enough parameters"
            ),
            IrcReply::ErrAlreadyRegistred { nick } => format!(
                ":{server_name} {ERR_ALREADYREGISTRED:03} {nick} :You may not reregister"
            ),
            IrcReply::ErrPasswdRequired { nick } => format!(
                ":{server_name} {ERR_PASSWDMISMATCH:03} {nick} :Password required"
            ),
            IrcReply::ErrPasswdMismatch { nick } => format!(
                ":{server_name} {ERR_PASSWDMISMATCH:03} {nick} :Password incorrect"
            ),
            IrcReply::ErrChannelIsFull { nick, channel } => format!(
                ":{server_name} {ERR_CHANNELISFULL:03} {nick} {channel} :Cannot join channel (+l)"
            ),
            IrcReply::ErrInviteOnlyChan { nick, channel } => format!(
                ":{server_name} {ERR_INVITEONLYCHAN:03} {nick} {channel} :Cannot join channel (+i)"
            ),
            IrcReply::ErrBadChannelKey { nick, channel } => format!(
                ":{server_name} {ERR_BADCHANNELKEY:03} {nick} {channel} :Cannot join channel (+k)"
            ),
            IrcReply::ErrChanOPrivsNeeded { nick, channel } => format!(
                ":{server_name} {ERR_CHANOPRIVSNEEDED:03} {nick} {channel} :You're not channel operator"
            ),
            IrcReply::ErrUsersDontMatch { nick } => format!(
                ":{server_name} {ERR_USERSDONTMATCH:03} {nick} :Cannot change mode for other users"
            ),
        }
    }
}

/// `461 MODE <letter>`, the one reply in the table whose `<args>` slot carries the
/// offending mode letter rather than a channel/nick — kept separate from `IrcReply` since
/// its shape doesn't fit the rest of `ErrNeedMoreParams`'s single-command-name arg.
pub fn err_need_more_params_mode(server_name: &str, nick: &str, letter: char) -> String {
    format!(":{server_name} {ERR_NEEDMOREPARAMS:03} {nick} MODE {letter} :Not enough parameters")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_matches_s1_scenario() {
        let reply = IrcReply::Welcome {
            nick: "alice".to_string(),
            motd: "Welcome to the IRC Network".to_string(),
        };
        assert_eq!(
            reply.format("server"),
            ":server 001 alice :Welcome to the IRC Network alice"
        );
    }

    #[test]
    fn passwd_required_and_mismatch_share_the_code_but_not_the_text() {
        let required = IrcReply::ErrPasswdRequired { nick: "*".to_string() };
        let mismatch = IrcReply::ErrPasswdMismatch { nick: "*".to_string() };
        assert_eq!(required.format("server"), ":server 464 * :Password required");
        assert_eq!(mismatch.format("server"), ":server 464 * :Password incorrect");
    }

    #[test]
    fn mode_is_omits_arg_when_none() {
        let reply = IrcReply::ChannelModeIs {
            nick: "alice".to_string(),
            channel: "#room".to_string(),
            modes: "+i".to_string(),
            arg: None,
        };
        assert_eq!(reply.format("server"), ":server 324 alice #room +i");
    }
}
