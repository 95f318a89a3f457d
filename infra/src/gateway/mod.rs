//! OTP gateway adapters

pub mod mock_gateway;

#[cfg(test)]
mod tests;

pub use mock_gateway::MockOtpGateway;
