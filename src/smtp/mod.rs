pub mod command;
pub mod context;
pub mod envelope;
pub mod session;
pub mod status;

use core::fmt::{self, Display, Formatter};

use self::command::{Command, HeloVariant};

#[derive(PartialEq, PartialOrd, Eq, Hash, Debug, Clone, Copy, Default)]
pub enum State {
    #[default]
    Connect,
    Ehlo,
    Helo,
    MailFrom,
    RcptTo,
    Data,
    Reading,
    PostDot,
    Quit,
    InvalidCommandSequence,
    Invalid,
}

impl Display for State {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        fmt.write_str(match self {
            Self::Reading | Self::PostDot => "",
            Self::Connect => "Connect",
            Self::Ehlo => "EHLO",
            Self::Helo => "HELO",
            Self::MailFrom => "MAIL",
            Self::RcptTo => "RCPT",
            Self::Data => "DATA",
            Self::Quit => "QUIT",
            Self::Invalid => "INVALID",
            Self::InvalidCommandSequence => "Invalid Command Sequence",
        })
    }
}

impl State {
    /// Advance the conversation by one command, recording envelope state
    /// into the transaction as a side effect.
    pub fn transition(self, input: Command, transaction: &mut context::Context) -> Self {
        match (self, input) {
            (Self::Connect, Command::Helo(HeloVariant::Ehlo(id))) => {
                transaction.id = id;
                Self::Ehlo
            }
            (Self::Connect, Command::Helo(HeloVariant::Helo(id))) => {
                transaction.id = id;
                Self::Helo
            }
            (Self::Ehlo | Self::Helo | Self::PostDot, Command::MailFrom(from)) => {
                transaction.reset();
                *transaction.envelope.sender_mut() = from;
                Self::MailFrom
            }
            (Self::MailFrom | Self::RcptTo, Command::RcptTo(to)) => {
                if let Some(rcpts) = transaction.envelope.recipients_mut() {
                    rcpts.extend_from_slice(&to[..]);
                } else {
                    *transaction.envelope.recipients_mut() = Some(to);
                }
                Self::RcptTo
            }
            (Self::RcptTo, Command::Data) => Self::Data,
            (_, Command::Quit) => Self::Quit,
            (_, Command::Invalid(_)) => Self::Invalid,
            _ => Self::InvalidCommandSequence,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{command::Command, context::Context, State};

    fn mail_from(addr: &str) -> Command {
        Command::try_from(format!("MAIL FROM: {addr}").as_str()).unwrap()
    }

    fn rcpt_to(addr: &str) -> Command {
        Command::try_from(format!("RCPT TO: {addr}").as_str()).unwrap()
    }

    #[test]
    fn full_transaction() {
        let mut transaction = Context::default();
        let mut state = State::Connect;

        state = state.transition(
            Command::try_from("EHLO client.example.org").unwrap(),
            &mut transaction,
        );
        assert_eq!(state, State::Ehlo);
        assert_eq!(transaction.id, "client.example.org");

        state = state.transition(mail_from("a@x.com"), &mut transaction);
        assert_eq!(state, State::MailFrom);
        assert_eq!(transaction.sender(), "a@x.com");

        state = state.transition(rcpt_to("b@y.com"), &mut transaction);
        state = state.transition(rcpt_to("c@z.com"), &mut transaction);
        assert_eq!(state, State::RcptTo);
        assert_eq!(transaction.recipients(), vec!["b@y.com", "c@z.com"]);

        state = state.transition(Command::Data, &mut transaction);
        assert_eq!(state, State::Data);

        state = state.transition(Command::Quit, &mut transaction);
        assert_eq!(state, State::Quit);
    }

    #[test]
    fn new_transaction_after_post_dot_resets_envelope() {
        let mut transaction = Context::default();
        let mut state = State::Connect;

        state = state.transition(
            Command::try_from("HELO client.example.org").unwrap(),
            &mut transaction,
        );
        state = state.transition(mail_from("a@x.com"), &mut transaction);
        state = state.transition(rcpt_to("b@y.com"), &mut transaction);
        assert_eq!(state, State::RcptTo);

        // A second MAIL FROM after end-of-data starts a fresh envelope.
        let state = State::PostDot.transition(mail_from("d@w.com"), &mut transaction);
        assert_eq!(state, State::MailFrom);
        assert_eq!(transaction.sender(), "d@w.com");
        assert!(transaction.recipients().is_empty());
    }

    #[test]
    fn out_of_sequence_command() {
        let mut transaction = Context::default();
        let state = State::Connect.transition(Command::Data, &mut transaction);
        assert_eq!(state, State::InvalidCommandSequence);
    }
}
