pub mod geo;
pub mod mailer;
pub mod tour_stats;

pub use mailer::{LogMailer, Mailer, MailerError};
