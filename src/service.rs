pub mod account;
pub mod email_verifier;
pub mod error;
pub mod referral;
