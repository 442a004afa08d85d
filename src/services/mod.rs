pub mod payment;
pub mod sweeper;

pub use payment::{PaymentError, PaymentIntent, PaymentProcessor, StripeProcessor};
pub use sweeper::{Clock, SubscriptionSweeper, SweeperHandle, SystemClock};
