use mailparse::MailAddr;

use super::envelope::Envelope;

/// Accumulated state for one SMTP transaction: the identity announced in
/// EHLO/HELO, the envelope, and the collected message data.
#[derive(Default, Debug)]
pub struct Context {
    pub id: String,
    pub envelope: Envelope,
    pub data: Option<Vec<u8>>,
}

impl Context {
    /// Returns the declared sender address, or the empty string for the
    /// null sender.
    #[inline]
    pub fn sender(&self) -> String {
        self.envelope
            .sender()
            .map(|sender| match sender {
                MailAddr::Single(addr) => addr.addr.clone(),
                MailAddr::Group(_) => String::default(),
            })
            .unwrap_or_default()
    }

    /// Returns the declared recipient addresses.
    pub fn recipients(&self) -> Vec<String> {
        self.envelope
            .recipients()
            .map(|addrs| {
                addrs
                    .iter()
                    .map(|addr| match addr {
                        MailAddr::Group(group) => group.group_name.clone(),
                        MailAddr::Single(single) => single.addr.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Clear the envelope and data for the next transaction on this
    /// connection, keeping the announced identity.
    pub fn reset(&mut self) {
        self.envelope = Envelope::default();
        self.data = None;
    }
}
