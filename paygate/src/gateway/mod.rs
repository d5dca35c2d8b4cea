//! Gateway adapter abstraction layer.
//!
//! Every payment processor is reached through the same seven capabilities
//! (see [`Action`]). A [`GatewayAdapter`] supplies the vendor-specific parts
//! of a call and [`commit`] drives it through a [`Transport`](crate::transport::Transport),
//! producing a uniform [`Response`].
//!
//! Most vendors need no code: [`ConfigurableGateway`] builds an adapter from a
//! TOML [`GatewayConfig`] describing endpoints, authentication, field names
//! and reply classification.

pub mod action;
pub mod commit;
pub mod config;
pub mod default;
pub mod endpoint;
pub mod field_map;
pub mod money;
pub mod options;
pub mod response;
pub mod traits;
pub mod wire;

pub use action::Action;
pub use commit::{commit, interpret};
pub use config::{
    AuthConfig, EndpointConfig, FieldMappingConfig, GatewayConfig, ResponseConfig, ScrubConfig,
    ScrubPreset,
};
pub use default::ConfigurableGateway;
pub use endpoint::ConfigurableEndpointResolver;
pub use field_map::ConfigurableFieldMapper;
pub use money::{Amount, AmountFormat, currency_exponent};
pub use options::{Address, PaymentSource, TransactionOptions};
pub use response::{
    CONNECTION_ERROR_CODE, CONTENT_LESS_CODE, INVALID_CARD_CODE, INVALID_REQUEST_CODE,
    PROCESSING_ERROR_CODE, Response,
};
pub use traits::{
    Endpoint, EndpointResolver, FieldMapper, GatewayAdapter, RequestData, ResponseFields,
};
pub use wire::WireFormat;
