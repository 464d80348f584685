pub mod payment;
pub mod profile;

pub use payment::{
    extend_subscription, kobo_to_naira, FeatureFlags, PaymentKind, PaymentMetadata, Settled,
    SmsTopup, SubscriptionPayment, VerifiedTransaction,
};
pub use profile::{NewIdentity, NewProfile, Role};
