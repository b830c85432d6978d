pub mod fetch;
pub mod flow;
pub mod hold;
pub mod saga;
pub mod steps;

pub use fetch::{FetchKind, FetchTicket, FetchTracker};
pub use flow::{BookingFlow, FlowDeps, FlowSnapshot};
pub use hold::{countdown_label, HoldManager};
pub use saga::{CheckoutSaga, SagaEvent, SagaProgress, SagaStage, SagaState};
pub use steps::{BookingStep, FlowVariant, StepContext, StepMachine};
