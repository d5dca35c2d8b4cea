//! paygate: card validation and a uniform commit protocol for payment
//! gateways.
//!
//! Payment processors disagree on almost everything: body format, field
//! names, authentication, how a decline looks. This crate keeps what they
//! share in one place so an adapter only describes what is different.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   purchase / authorize / capture / refund /
//! │  Application     │   void / verify / credit
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────────────────────────────────────────┐
//! │  GatewayAdapter (ConfigurableGateway from TOML)      │
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────┐  │
//! │  │ CreditCard │  │ RequestSigner│  │ Scrubber     │  │
//! │  │ validation │  │ AuthScheme   │  │ (transcripts)│  │
//! │  └────────────┘  └──────────────┘  └──────────────┘  │
//! │               commit protocol                        │
//! └────────┬─────────────────────────────────────────────┘
//!          │ HTTPS (JSON or tag-delimited bodies)
//! ┌────────▼─────────┐
//! │  Payment gateway │
//! └──────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Validate a card
//!
//! ```rust
//! use paygate::card::{CardPolicy, CreditCard};
//!
//! let card = CreditCard::new()
//!     .with_number("4242 4242 4242 4242")
//!     .with_expiry("09", "2040")
//!     .with_name("Longbob Longsen")
//!     .with_verification_value("123");
//!
//! assert_eq!(card.brand(), Some("visa"));
//! assert!(card.validate(&CardPolicy::default()).is_empty());
//! ```
//!
//! ## 2. Sign a request
//!
//! ```rust
//! use paygate::signing::RequestSigner;
//!
//! # fn example() -> paygate::Result<()> {
//! let signer = RequestSigner::new().with_secret("mysecret")?;
//! let signature = signer.sign(&["20010403123245", "thestore", "ORD453-11"]);
//! assert_eq!(signature.len(), 40);
//! # Ok(())
//! # }
//! ```
//!
//! ## 3. Talk to a gateway
//!
//! ```rust,no_run
//! use paygate::{
//!     card::CreditCard,
//!     gateway::{Amount, ConfigurableGateway, TransactionOptions},
//! };
//!
//! # async fn example() -> paygate::Result<()> {
//! let gateway = ConfigurableGateway::from_toml(
//!     r#"
//!     name = "Acme Payments"
//!     live_url = "https://api.acme.example/v1/charges"
//!
//!     [auth]
//!     type = "bearer"
//!     token = "sk_live_123"
//!
//!     [field_mappings]
//!     pass_through_unmapped = true
//!     "#,
//! )?;
//!
//! let card = CreditCard::new()
//!     .with_number("4242424242424242")
//!     .with_expiry(9, 2040)
//!     .with_name("Longbob Longsen")
//!     .with_verification_value("123");
//! let response = gateway
//!     .purchase(&Amount::new(1999, "USD")?, &card, &TransactionOptions::new())
//!     .await;
//!
//! println!("{}: {}", response.is_success(), response.message());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`card`]: brand detection, Luhn checks, expiry dates, card validation
//! - [`signing`]: digest request signing and header authentication
//! - [`security`]: transcript scrubbing and audit logging
//! - [`gateway`]: the adapter contract, commit protocol and TOML-driven adapter
//! - [`transport`]: HTTP dispatch abstraction
//! - [`observability`]: logging setup
//! - [`error`]: error types
//!
//! # Error Handling
//!
//! Only configuration and programming mistakes are errors. Card problems come
//! back as [`ValidationErrors`](card::ValidationErrors) and every gateway call
//! returns a [`Response`](gateway::Response), unsuccessful when anything went
//! wrong on the way.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(clippy::multiple_crate_versions, reason = "transitive dependencies from reqwest")]

pub mod card;
pub mod error;
pub mod gateway;
pub mod observability;
pub mod security;
pub mod signing;
pub mod transport;

pub use card::{CardPolicy, CreditCard, ValidationErrors};
pub use error::{GatewayError, Result};
pub use gateway::{ConfigurableGateway, GatewayAdapter, GatewayConfig, Response};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _ = std::marker::PhantomData::<GatewayError>;
        let _ = std::marker::PhantomData::<ConfigurableGateway>;
    }
}
