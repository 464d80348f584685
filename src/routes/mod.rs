pub mod delete;
pub mod extract;
pub mod health;
pub mod payment;
pub mod register;
pub mod validation;
pub mod webhook;

pub use delete::delete_user;
pub use health::health_check;
pub use payment::verify_payment_handler;
pub use register::create_user;
pub use webhook::paystack_webhook;
