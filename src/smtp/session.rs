use std::{net::SocketAddr, sync::Arc};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    incoming, internal, outgoing,
    notify::Notify,
    pipeline::{self, RawMessage},
    staging::Staging,
};

use super::{command::Command, context, status::Status, State};

#[derive(PartialEq, Eq)]
pub enum Event {
    ConnectionClose,
    ConnectionKeepAlive,
}

/// Per-connection protocol buffer: the current state, the bytes of the
/// last command (or the message being read), and whether the reply for the
/// current state has already been sent.
#[derive(Debug, Clone)]
pub struct Context {
    pub state: State,
    pub message: Vec<u8>,
    pub sent: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            state: State::Connect,
            message: Vec::default(),
            sent: false,
        }
    }
}

pub type Response = (Option<Vec<String>>, Event);

pub struct Session<Stream: AsyncRead + AsyncWrite + Unpin + Send + Sync> {
    peer: SocketAddr,
    stream: Stream,
    context: Context,
    banner: String,
    channel: String,
    notifier: Arc<dyn Notify>,
    staging: Arc<Staging>,
}

impl<Stream: AsyncRead + AsyncWrite + Unpin + Send + Sync> Session<Stream> {
    pub fn create(
        stream: Stream,
        peer: SocketAddr,
        banner: String,
        channel: String,
        notifier: Arc<dyn Notify>,
        staging: Arc<Staging>,
    ) -> Self {
        Self {
            peer,
            stream,
            context: Context::default(),
            banner: if banner.is_empty() {
                "localhost".to_string()
            } else {
                banner
            },
            channel,
            notifier,
            staging,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut transaction = context::Context::default();

        internal!("Connected to {}", self.peer);
        let result = self.run_inner(&mut transaction).await;
        internal!("Connection closed");

        result
    }

    async fn run_inner(&mut self, transaction: &mut context::Context) -> anyhow::Result<()> {
        loop {
            let (response, ev) = self.response(transaction);
            self.context.sent = true;

            for response in response.unwrap_or_default() {
                outgoing!("{response}");

                self.stream
                    .write_all(format!("{response}\r\n").as_bytes())
                    .await
                    .map_err(|err| {
                        internal!(level = ERROR, "{err}");
                        std::io::Error::new(std::io::ErrorKind::ConnectionAborted, err.to_string())
                    })?;
            }

            if Event::ConnectionClose == ev {
                return Ok(());
            } else if self.receive(transaction).await.unwrap_or(true) {
                return Ok(());
            }
        }
    }

    /// Generate the response(s) that should be sent back to the client
    /// depending on the server's state
    fn response(&mut self, transaction: &mut context::Context) -> Response {
        if self.context.sent {
            return (None, Event::ConnectionKeepAlive);
        }

        match self.context.state {
            State::Connect => (
                Some(vec![format!("{} {}", Status::ServiceReady, self.banner)]),
                Event::ConnectionKeepAlive,
            ),
            State::Ehlo | State::Helo => (
                Some(vec![format!(
                    "{} Hello {}",
                    Status::Ok,
                    String::from_utf8_lossy(&self.context.message)
                )]),
                Event::ConnectionKeepAlive,
            ),
            State::MailFrom | State::RcptTo => (
                Some(vec![format!("{} Ok", Status::Ok)]),
                Event::ConnectionKeepAlive,
            ),
            State::Data => {
                self.context.state = State::Reading;
                (
                    Some(vec![format!(
                        "{} End data with <CR><LF>.<CR><LF>",
                        Status::StartMailInput
                    )]),
                    Event::ConnectionKeepAlive,
                )
            }
            State::PostDot => {
                // Acceptance is acknowledged unconditionally; processing is
                // fire-and-forget so a hostile message cannot hold up or
                // tear down the conversation.
                self.dispatch(transaction);
                (
                    Some(vec![format!("{} Ok: message accepted", Status::Ok)]),
                    Event::ConnectionKeepAlive,
                )
            }
            State::Quit => (
                Some(vec![format!("{} Bye", Status::GoodBye)]),
                Event::ConnectionClose,
            ),
            State::Reading => (None, Event::ConnectionKeepAlive),
            State::InvalidCommandSequence => (
                Some(vec![format!(
                    "{} {}",
                    Status::InvalidCommandSequence,
                    self.context.state
                )]),
                Event::ConnectionClose,
            ),
            State::Invalid => (
                Some(vec![format!(
                    "{} Invalid command '{}'",
                    Status::InvalidCommandSequence,
                    String::from_utf8_lossy(&self.context.message)
                )]),
                Event::ConnectionClose,
            ),
        }
    }

    /// Hand the completed message to the processing pipeline on its own
    /// task. The session never learns whether processing succeeded.
    fn dispatch(&self, transaction: &mut context::Context) {
        let raw = RawMessage {
            peer: self.peer,
            sender: transaction.sender(),
            recipients: transaction.recipients(),
            data: transaction.data.take().unwrap_or_default(),
        };

        let notifier = Arc::clone(&self.notifier);
        let staging = Arc::clone(&self.staging);
        let channel = self.channel.clone();

        tokio::spawn(async move {
            pipeline::handle(raw, notifier.as_ref(), &staging, &channel).await;
        });
    }

    /// Returns `true` once the client is done with the connection.
    async fn receive(&mut self, transaction: &mut context::Context) -> anyhow::Result<bool> {
        let mut received_data = [0; 4096];

        match self.stream.read(&mut received_data).await {
            // Consider any errors received here to be fatal
            Err(err) => {
                internal!(level = ERROR, "{err}");
                Err(err.into())
            }
            Ok(0) => {
                // Reading 0 bytes means the other side has closed the
                // connection or is done writing, then so are we.
                Ok(true)
            }
            Ok(bytes_read) => {
                let received = &received_data[..bytes_read];

                if self.context.state == State::Reading {
                    self.context.message.extend(received);

                    if self.context.message.ends_with(b"\r\n.\r\n")
                        || self.context.message == b".\r\n"
                    {
                        let mut data = std::mem::take(&mut self.context.message);
                        // Drop the terminating ".\r\n", keeping the final
                        // line ending of the message itself.
                        data.truncate(data.len() - 3);
                        transaction.data = Some(data);

                        self.context = Context {
                            state: State::PostDot,
                            message: Vec::default(),
                            sent: false,
                        };
                    }
                } else {
                    let command = Command::try_from(received).map_or_else(|e| e, |c| c);
                    let message = command.inner().into_bytes();

                    incoming!("{command}");

                    self.context = Context {
                        state: self.context.state.transition(command, transaction),
                        message,
                        sent: false,
                    };

                    tracing::debug!("Transitioned to {:?}", self.context.state);
                }

                Ok(false)
            }
        }
    }
}
