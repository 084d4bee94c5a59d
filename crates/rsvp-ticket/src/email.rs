//! The ticket email: a summary of the reservation with the QR code inlined as
//! a `data:` URL.

use rsvp_core::provider::OutgoingEmail;

/// Everything printed in the email, already formatted.
#[derive(Debug, Clone)]
pub struct TicketEmail<'a> {
  pub to:             &'a str,
  pub user_name:      &'a str,
  pub event_title:    &'a str,
  pub event_date:     &'a str,
  pub event_location: &'a str,
  pub ticket_id:      &'a str,
  /// `data:image/png;base64,...`
  pub qr_data_url:    &'a str,
  /// Signature line in the footer.
  pub sender_name:    &'a str,
}

impl TicketEmail<'_> {
  pub fn render(&self) -> OutgoingEmail {
    let user_name = escape(self.user_name);
    let title = escape(self.event_title);
    let date = escape(self.event_date);
    let location = escape(self.event_location);
    let ticket_id = escape(self.ticket_id);
    let sender = escape(self.sender_name);
    let qr = escape(self.qr_data_url);

    let html_body = format!(
      r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Event Ticket - {title}</title>
  </head>
  <body style="font-family: Arial, sans-serif; line-height: 1.6;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <div style="text-align: center; margin-bottom: 30px;">
        <h1>Your Event Ticket</h1>
      </div>
      <div style="border: 2px solid #ddd; padding: 20px; border-radius: 8px;">
        <h2>Hello {user_name}!</h2>
        <p>Thank you for booking your ticket to {title}. We're excited to have you!</p>
        <div style="margin: 20px 0;">
          <h3>Event Details:</h3>
          <p><strong>Event:</strong> {title}</p>
          <p><strong>Date:</strong> {date}</p>
          <p><strong>Location:</strong> {location}</p>
          <p><strong>Ticket ID:</strong> {ticket_id}</p>
        </div>
        <div style="text-align: center; margin: 20px 0;">
          <h3>Your Entry QR Code</h3>
          <img src="{qr}" alt="Ticket QR Code" style="max-width: 200px;">
          <p>Please present this QR code at the event entrance</p>
        </div>
        <p>Important Notes:</p>
        <ul>
          <li>Please arrive at least 15 minutes before the event starts</li>
          <li>Keep this ticket handy on your phone</li>
          <li>This QR code is unique to you and cannot be reused</li>
        </ul>
      </div>
      <div style="text-align: center; margin-top: 30px; font-size: 0.9em; color: #666;">
        <p>If you have any questions, please contact the event organizer.</p>
        <p>{sender}. All rights reserved.</p>
      </div>
    </div>
  </body>
</html>
"#
    );

    OutgoingEmail {
      to: self.to.to_string(),
      subject: format!("Your Ticket for {}", self.event_title),
      html_body,
    }
  }
}

/// Escape text for HTML element content and double-quoted attributes.
fn escape(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  for c in raw.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}
