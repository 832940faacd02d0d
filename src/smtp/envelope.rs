use mailparse::{MailAddr, MailAddrList};

/// The declared sender and recipients accumulated over one transaction.
#[derive(Default, Debug)]
pub struct Envelope {
    sender: Option<MailAddr>,
    recipients: Option<MailAddrList>,
}

impl Envelope {
    /// Returns a reference to the sender for this message
    #[inline]
    pub fn sender(&self) -> Option<&MailAddr> {
        self.sender.as_ref()
    }

    /// Returns a mutable reference to the sender for this message
    #[inline]
    pub fn sender_mut(&mut self) -> &mut Option<MailAddr> {
        &mut self.sender
    }

    /// Returns a reference to the recipients for this message
    #[inline]
    pub fn recipients(&self) -> Option<&MailAddrList> {
        self.recipients.as_ref()
    }

    /// Returns a mutable reference to the recipients for this message
    #[inline]
    pub fn recipients_mut(&mut self) -> &mut Option<MailAddrList> {
        &mut self.recipients
    }
}
