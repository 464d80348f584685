pub mod deregistration;
pub mod registration;
pub mod settlement;

pub use deregistration::{deregister, DeregistrationReport, FailedStep, StepOutcome};
pub use registration::{register, Registration};
pub use settlement::{settle, verify_payment, PaymentReceipt};
